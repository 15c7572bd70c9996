use anyhow::{Context, Result};
use jenv_core::ports::EnvBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BACKUP_FILE: &str = "backup.json";

/// `PATH` as it was before jenv first touched it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathBackup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_path: Option<String>,
}

/// Backup file next to the registry file.
pub fn backup_path_for(store_path: &Path) -> PathBuf {
    store_path
        .parent()
        .map(|dir| dir.join(BACKUP_FILE))
        .unwrap_or_else(|| PathBuf::from(BACKUP_FILE))
}

/// Snapshot `PATH` into `file` unless a backup already exists there.
///
/// Returns whether a new backup was written.
pub fn backup_path_once(env: &dyn EnvBackend, file: &Path) -> Result<bool> {
    if file.exists() {
        return Ok(false);
    }

    let backup = PathBackup {
        user_path: env.query("PATH")?,
        system_path: None,
    };

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create backup directory: {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(&backup).context("Failed to serialize PATH backup")?;
    fs::write(file, contents)
        .with_context(|| format!("Failed to write PATH backup: {}", file.display()))?;

    info!("Backed up PATH to {}", file.display());
    Ok(true)
}
