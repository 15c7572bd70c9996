use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "jenv", version)]
#[command(about = "A Java version manager - register JDKs, switch between them, scan for new ones")]
pub struct CliArgs {
    /// Path to the settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JDK registry file (overrides settings)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Set up JAVA_HOME, PATH and the active-JDK link
    Init,

    /// Register a JDK under a name
    Add {
        name: String,
        path: PathBuf,
    },

    /// Unregister a JDK
    #[command(visible_alias = "rm")]
    Remove { name: String },

    /// List registered JDKs
    #[command(visible_alias = "ls")]
    List,

    /// Switch the active JDK
    Use { name: String },

    /// Show the active JDK
    #[command(visible_aliases = ["cur", "now"])]
    Current,

    /// Scan a directory for JDK installations and register them
    #[command(visible_alias = "sc")]
    Scan {
        dir: PathBuf,

        /// Maximum directory depth below and including DIR
        #[arg(long)]
        max_depth: Option<usize>,

        /// Number of scan worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Register every JDK found under its directory name without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Add a directory (default: the jenv executable's) to PATH
    AddToPath { dir: Option<PathBuf> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_add() {
        let args = CliArgs::parse_from(["jenv", "add", "jdk17", "/usr/lib/jvm/java-17"]);
        assert_eq!(
            args.command,
            Commands::Add {
                name: "jdk17".to_string(),
                path: PathBuf::from("/usr/lib/jvm/java-17"),
            }
        );
        assert_eq!(args.config, None);
        assert_eq!(args.store, None);
    }

    #[test]
    fn test_cli_parse_scan_with_flags() {
        let args = CliArgs::parse_from([
            "jenv",
            "sc",
            "/opt",
            "--max-depth",
            "3",
            "--workers",
            "4",
            "-y",
            "--store",
            "/tmp/config.json",
        ]);
        assert_eq!(
            args.command,
            Commands::Scan {
                dir: PathBuf::from("/opt"),
                max_depth: Some(3),
                workers: Some(4),
                yes: true,
            }
        );
        assert_eq!(args.store, Some(PathBuf::from("/tmp/config.json")));
    }

    #[test]
    fn test_cli_parse_aliases() {
        assert_eq!(CliArgs::parse_from(["jenv", "ls"]).command, Commands::List);
        assert_eq!(CliArgs::parse_from(["jenv", "now"]).command, Commands::Current);
        assert_eq!(
            CliArgs::parse_from(["jenv", "rm", "jdk8"]).command,
            Commands::Remove {
                name: "jdk8".to_string()
            }
        );
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(CliArgs::try_parse_from(["jenv"]).is_err());
    }
}
