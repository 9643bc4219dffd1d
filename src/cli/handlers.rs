use super::commands::CliArgs;
use crate::config::AutodepsConfig;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{load_overrides, Resolver};
use crate::transcript::{FileParseCache, NoopParseCache, ParseCache};
use crate::tree::{to_yaml, write_documents, EmitMode};
use anyhow::{bail, Context, Result};
use std::io::{self, Write};
use tracing::{debug, error, info};

/// Runs one resolution and returns the process exit code
pub fn handle_resolve(args: &CliArgs, config: &AutodepsConfig) -> i32 {
    if let Err(e) = config.validate() {
        error!("{}", e);
        return 1;
    }
    debug!("{}", config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(args, config, &RealFileSystem::new(), &mut out) {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

/// Reads the log, resolves it and emits the documents.
///
/// Without `--target` the nested document for the whole tree is written to
/// `out`; otherwise documents go to the file system.
pub fn run<F: FileSystem + ?Sized>(
    args: &CliArgs,
    config: &AutodepsConfig,
    fs: &F,
    out: &mut dyn Write,
) -> Result<()> {
    let filename = args.name.as_deref().unwrap_or(&config.output_name);
    if filename.is_empty() || filename.contains('/') {
        bail!("Output name must be a plain filename, got '{}'", filename);
    }

    let file_cache;
    let cache: &dyn ParseCache = match (&args.cache_file, args.no_cache) {
        (_, true) => &NoopParseCache,
        (Some(path), false) => {
            file_cache = FileParseCache::new(fs, path.clone());
            &file_cache
        }
        (None, false) if config.cache_enabled => {
            file_cache = FileParseCache::new(fs, config.cache_file.clone());
            &file_cache
        }
        (None, false) => &NoopParseCache,
    };

    let mut resolver = Resolver::new(&config.conventions);
    if let Some(root) = &args.root {
        resolver = resolver.with_root(root.clone());
    }

    let records = resolver.read_records(fs, &args.buildlog, cache)?;

    let overrides = match &args.overrides {
        Some(path) => load_overrides(fs, path, true)?,
        None => load_overrides(fs, &config.overrides_file, false)?,
    };

    let resolution = resolver
        .resolve(records, &overrides)
        .with_context(|| format!("Failed to resolve {}", args.buildlog.display()))?;
    resolution.report.log_summary();

    match &args.target {
        None => {
            let documents = resolution.render(EmitMode::Nested, filename, &config.conventions)?;
            for rendered in &documents {
                out.write_all(to_yaml(&rendered.document)?.as_bytes())
                    .context("Failed to write to stdout")?;
            }
        }
        Some(target) => {
            let mode = if args.allinone {
                EmitMode::Nested
            } else {
                EmitMode::PerDirectory
            };
            let documents = resolution.render(mode, filename, &config.conventions)?;
            write_documents(fs, target, &documents)?;
        }
    }

    info!("Done");
    Ok(())
}
