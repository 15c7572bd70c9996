use anyhow::{Context, Result};
use directories::ProjectDirs;
use jenv_core::filter::FilterRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::link::default_link_path;
use crate::adapters::persistence::default_store_path;
use crate::cli::CliArgs;
use crate::scan::{DEFAULT_MAX_DEPTH, ScanOptions, default_workers};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Settings {
    pub version: u32,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default = "default_filter_rules")]
    pub filter: FilterRules,
    #[serde(default)]
    pub paths: PathSettings,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct ScanSettings {
    pub max_depth: usize,
    /// Defaults to twice the available parallelism
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct PathSettings {
    /// Registry file, `~/.jdks/config.json` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,
    /// Active-JDK link, platform default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            scan: ScanSettings::default(),
            filter: default_filter_rules(),
            paths: PathSettings::default(),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            workers: None,
        }
    }
}

/// Filter defaults with the Windows system drive as the system root.
fn default_filter_rules() -> FilterRules {
    FilterRules {
        system_root: std::env::var_os("SystemDrive").map(PathBuf::from),
        ..FilterRules::default()
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "jenv")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("jenv.toml"))
}

impl Settings {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_settings = Settings::default();
            // Create directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
            default_settings.save(&path)?;
            return Ok(default_settings);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize settings to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<Self> {
        let mut settings = Self::load(cli_args.config.clone())?;

        // CLI args override config file
        if let Some(store) = &cli_args.store {
            settings.paths.store = Some(store.clone());
        }

        Ok(settings)
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.paths.store {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }

    pub fn symlink_path(&self) -> PathBuf {
        self.paths.symlink.clone().unwrap_or_else(default_link_path)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_depth: self.scan.max_depth,
            workers: self.scan.workers.unwrap_or_else(default_workers).max(1),
            filter: self.filter.clone(),
        }
    }
}
