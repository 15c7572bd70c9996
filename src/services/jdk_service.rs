use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use jenv_core::error::CoreError;
use jenv_core::ports::{EnvBackend, InstallationRegistry, InstallationValidator, Linker};
use jenv_core::{InstallationRecord, ScanResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::backup::{backup_path_for, backup_path_once};
use crate::adapters::persistence::JsonRegistryStore;
use crate::config::Settings;
use crate::scan::{CancelToken, ScanEvent, ScanOptions, Scanner};

#[cfg(windows)]
pub const JAVA_HOME_BIN: &str = r"%JAVA_HOME%\bin";
#[cfg(not(windows))]
pub const JAVA_HOME_BIN: &str = "$JAVA_HOME/bin";

#[cfg(windows)]
const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_SEPARATOR: char = ':';

/// `entry` prepended to `current`, or `None` if `current` already has it.
pub fn prepend_path_entry(current: &str, entry: &str, separator: char) -> Option<String> {
    if current.split(separator).any(|p| p == entry) {
        return None;
    }
    if current.is_empty() {
        Some(entry.to_string())
    } else {
        Some(format!("{}{}{}", entry, separator, current))
    }
}

/// A registered JDK plus whether it is the active one.
#[derive(Debug, Clone, PartialEq)]
pub struct JdkEntry {
    pub record: InstallationRecord,
    pub current: bool,
}

/// Per-scan overrides of the configured scan options.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanOverrides {
    pub max_depth: Option<usize>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterSummary {
    pub added: Vec<InstallationRecord>,
    pub skipped: Vec<InstallationRecord>,
}

/// Coordinates the registry, the environment and the active-JDK link.
pub struct JdkService {
    store: Arc<JsonRegistryStore>,
    env: Box<dyn EnvBackend>,
    linker: Arc<dyn Linker>,
    validator: Arc<dyn InstallationValidator>,
    settings: Settings,
}

impl JdkService {
    pub fn new(
        store: Arc<JsonRegistryStore>,
        env: Box<dyn EnvBackend>,
        linker: Arc<dyn Linker>,
        validator: Arc<dyn InstallationValidator>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            env,
            linker,
            validator,
            settings,
        }
    }

    pub fn store(&self) -> &JsonRegistryStore {
        &self.store
    }

    /// Link path recorded at init, or the configured one.
    pub fn symlink_path(&self) -> PathBuf {
        self.store
            .symlink_path()
            .unwrap_or_else(|| self.settings.symlink_path())
    }

    /// First-time setup: back up PATH, point JAVA_HOME at the link and put
    /// the link's `bin` on PATH.
    pub fn init(&self) -> Result<PathBuf> {
        if self.store.is_initialized() {
            return Err(CoreError::AlreadyInitialized.into());
        }

        let backup = backup_path_for(self.store.path());
        backup_path_once(self.env.as_ref(), &backup)?;

        let link = self.settings.symlink_path();
        self.store.set_symlink_path(&link)?;

        self.env
            .update("JAVA_HOME", &link.to_string_lossy())
            .context("Failed to set JAVA_HOME")?;
        self.ensure_on_path(JAVA_HOME_BIN)?;

        self.store.mark_initialized(&backup)?;
        info!(
            "Initialized jenv ({} environment), JAVA_HOME -> {}",
            self.env.scope(),
            link.display()
        );
        Ok(link)
    }

    pub fn add(&self, name: &str, path: &Path) -> Result<InstallationRecord> {
        let record = self.store.add(name, path)?;
        info!("Added JDK {}", record);
        Ok(record)
    }

    pub fn remove(&self, name: &str) -> Result<InstallationRecord> {
        let record = self.store.remove(name)?;
        info!("Removed JDK {}", record);
        Ok(record)
    }

    pub fn list(&self) -> Vec<JdkEntry> {
        let current = self.store.current().ok().map(|c| c.name);
        self.store
            .list()
            .into_iter()
            .map(|record| JdkEntry {
                current: current.as_deref() == Some(record.name.as_str()),
                record,
            })
            .collect()
    }

    /// Make `name` the active JDK by redirecting the link.
    pub fn use_jdk(&self, name: &str) -> Result<InstallationRecord> {
        let record = self.store.get(name)?;
        let link = self.symlink_path();

        self.linker.switch(&record.path, &link)?;
        self.store.set_current(name)?;

        info!("Now using {} via {}", record, link.display());
        Ok(record)
    }

    pub fn current(&self) -> Result<InstallationRecord> {
        self.store.current()
    }

    /// Scanner configured from settings and `overrides`, excluding what is
    /// already registered.
    pub fn scanner(&self, overrides: ScanOverrides) -> Scanner {
        let mut options: ScanOptions = self.settings.scan_options();
        if let Some(max_depth) = overrides.max_depth {
            options.max_depth = max_depth;
        }
        if let Some(workers) = overrides.workers {
            options.workers = workers.max(1);
        }

        let registry: Arc<dyn InstallationRegistry> = self.store.clone();
        Scanner::new(options, self.validator.clone(), registry)
    }

    pub fn scan(
        &self,
        root: &Path,
        overrides: ScanOverrides,
        cancel: &CancelToken,
        events: Option<&Sender<ScanEvent>>,
    ) -> ScanResult {
        self.scanner(overrides).scan_with(root, cancel, events)
    }

    /// Register scan results under names chosen by `name_for`.
    ///
    /// `name_for` returning `None`, or a name that fails to register, skips
    /// the installation.
    pub fn register_found<F>(&self, found: &[InstallationRecord], mut name_for: F) -> RegisterSummary
    where
        F: FnMut(&InstallationRecord) -> Option<String>,
    {
        let mut summary = RegisterSummary::default();

        for record in found {
            let Some(name) = name_for(record) else {
                summary.skipped.push(record.clone());
                continue;
            };

            match self.store.add(&name, &record.path) {
                Ok(added) => summary.added.push(added),
                Err(e) => {
                    warn!("Not registering {}: {}", record.path.display(), e);
                    summary.skipped.push(record.clone());
                }
            }
        }

        summary
    }

    /// Add `dir` to PATH; returns false when it was already there.
    pub fn add_to_path(&self, dir: &Path) -> Result<bool> {
        self.ensure_on_path(&dir.to_string_lossy())
    }

    fn ensure_on_path(&self, entry: &str) -> Result<bool> {
        let current = self.env.query("PATH")?.unwrap_or_default();
        match prepend_path_entry(&current, entry, PATH_SEPARATOR) {
            Some(updated) => {
                self.env.update("PATH", &updated).context("Failed to update PATH")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
