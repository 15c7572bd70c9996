use anyhow::Result;
use clap::Parser;
use jenv::cli::{CliArgs, Commands};
use jenv::config::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// CLI args -> settings file -> scan options
#[test]
fn test_config_and_cli_integration() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_dir = temp_dir.path().join(".config").join("jenv");
    fs::create_dir_all(&config_dir)?;
    let config_file = config_dir.join("jenv.toml");

    let test_config = r#"
version = 1

[scan]
max_depth = 3
workers = 6

[filter]
skip_names = ["node_modules", "vendor"]
skip_substrings = ["cache"]
skip_prefixes = []

[paths]
store = "/srv/jdks/config.json"
symlink = "/srv/jdks/current"
"#;
    fs::write(&config_file, test_config)?;

    let settings = Settings::load(Some(config_file.clone()))?;
    assert_eq!(settings.scan.max_depth, 3);
    assert_eq!(settings.scan.workers, Some(6));
    assert_eq!(settings.store_path()?, PathBuf::from("/srv/jdks/config.json"));
    assert_eq!(settings.symlink_path(), PathBuf::from("/srv/jdks/current"));

    let options = settings.scan_options();
    assert_eq!(options.workers, 6);
    assert_eq!(options.filter.skip_names, vec!["node_modules", "vendor"]);
    assert!(options.filter.skip_prefixes.is_empty());
    // Unlisted fields keep their defaults
    assert!(options.filter.system_names.iter().any(|n| n == "system32"));

    let config_arg = config_file.to_string_lossy().to_string();
    let cli_args = CliArgs::parse_from([
        "jenv",
        "--config",
        config_arg.as_str(),
        "--store",
        "/override/config.json",
        "scan",
        "/opt",
    ]);
    assert!(matches!(cli_args.command, Commands::Scan { yes: false, .. }));

    let settings = Settings::from_cli_and_file(&cli_args)?;
    assert_eq!(settings.store_path()?, PathBuf::from("/override/config.json"));
    assert_eq!(settings.scan.max_depth, 3);
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_file = temp_dir.path().join("jenv.toml");
    fs::write(&config_file, "version = \"one\"")?;

    let err = Settings::load(Some(config_file)).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    Ok(())
}
