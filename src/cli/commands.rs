use clap::Parser;
use std::path::PathBuf;

/// Reconstructs build dependency documents from a compiler build log
#[derive(Parser, Debug)]
#[command(
    name = "autodeps",
    about = "Reconstructs build dependency documents from a compiler build log",
    version,
    long_about = "autodeps reads the compiler, archiver and linker invocations recorded in a \
                  build log, rebuilds the object to target graph, works out which module owns \
                  each target and writes one dependency document per source directory.\n\n\
                  Examples:\n  \
                  autodeps build.log\n  \
                  autodeps build.log autogen.yaml --target modules\n  \
                  autodeps build.log --target out --name deps.yaml --allinone"
)]
pub struct CliArgs {
    #[arg(value_name = "BUILDLOG", help = "Build log to read")]
    pub buildlog: PathBuf,

    #[arg(
        value_name = "OVERRIDES",
        help = "Override document (defaults to autogen.yaml, if present)"
    )]
    pub overrides: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Write documents below DIR instead of printing the whole tree"
    )]
    pub target: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Filename of each written document (defaults to AutoBuildDeps.yaml)"
    )]
    pub name: Option<String>,

    #[arg(
        long,
        requires = "target",
        help = "Write a single nested document instead of one per directory"
    )]
    pub allinone: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Module root to use instead of inferring it from the sources"
    )]
    pub root: Option<String>,

    #[arg(long, help = "Never read or write the parse cache")]
    pub no_cache: bool,

    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "no_cache",
        help = "Parse cache location; enables caching"
    )]
    pub cache_file: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Show debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["autodeps", "build.log"]);
        assert_eq!(args.buildlog, PathBuf::from("build.log"));
        assert!(args.overrides.is_none());
        assert!(args.target.is_none());
        assert!(args.name.is_none());
        assert!(!args.allinone);
        assert!(!args.no_cache);
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_options() {
        let args = CliArgs::parse_from([
            "autodeps",
            "build.log",
            "extra.yaml",
            "--target",
            "out",
            "--name",
            "deps.yaml",
            "--allinone",
            "--root",
            "/src/modules",
            "--cache-file",
            "cache.json",
            "-v",
        ]);
        assert_eq!(args.overrides, Some(PathBuf::from("extra.yaml")));
        assert_eq!(args.target, Some(PathBuf::from("out")));
        assert_eq!(args.name.as_deref(), Some("deps.yaml"));
        assert!(args.allinone);
        assert_eq!(args.root.as_deref(), Some("/src/modules"));
        assert_eq!(args.cache_file, Some(PathBuf::from("cache.json")));
        assert!(args.verbose);
    }

    #[test]
    fn test_allinone_requires_target() {
        assert!(CliArgs::try_parse_from(["autodeps", "build.log", "--allinone"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["autodeps", "build.log", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_buildlog_required() {
        assert!(CliArgs::try_parse_from(["autodeps"]).is_err());
    }
}
