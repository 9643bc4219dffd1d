use autodeps::cli::{handle_resolve, CliArgs};
use autodeps::util::logging::{init_logging, resolve_level, LoggingConfig};
use autodeps::{AutodepsConfig, VERSION};

use clap::Parser;
use tracing::debug;

fn main() {
    let args = CliArgs::parse();
    let config = AutodepsConfig::default();

    let level = resolve_level(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
        &config.log_level,
    );
    init_logging(LoggingConfig::from_env(level));

    debug!("autodeps v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = handle_resolve(&args, &config);
    std::process::exit(exit_code);
}
