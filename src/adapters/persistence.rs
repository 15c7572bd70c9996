use anyhow::{Context, Result};
use jenv_core::error::CoreError;
use jenv_core::exclusion::NormalizedPath;
use jenv_core::ports::{InstallationRegistry, InstallationValidator};
use jenv_core::InstallationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

pub const STORE_DIR: &str = ".jdks";
pub const STORE_FILE: &str = "config.json";

/// On-disk registry document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub symlink_path: Option<PathBuf>,
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub env_backup_path: Option<PathBuf>,
    #[serde(default)]
    pub jdks: BTreeMap<String, InstallationRecord>,
}

impl RegistryDocument {
    fn current_name(&self) -> Option<&str> {
        self.current.as_deref().filter(|name| !name.is_empty())
    }
}

/// `~/.jdks/config.json`
pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(STORE_DIR).join(STORE_FILE))
}

/// JSON-backed registry of named JDKs.
///
/// Every mutation is written through to disk while the document lock is
/// held, so concurrent callers in one process never interleave writes.
pub struct JsonRegistryStore {
    path: PathBuf,
    doc: Mutex<RegistryDocument>,
    validator: Arc<dyn InstallationValidator>,
}

impl JsonRegistryStore {
    /// Open the store at `path`, writing an empty document if none exists.
    pub fn open<P: AsRef<Path>>(path: P, validator: Arc<dyn InstallationValidator>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let doc = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read registry file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse registry file: {}", path.display()))?
        } else {
            info!("Creating registry at {}", path.display());
            let doc = RegistryDocument::default();
            write_document(&path, &doc)?;
            doc
        };

        Ok(Self {
            path,
            doc: Mutex::new(doc),
            validator,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, RegistryDocument> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to a copy of the document. The copy replaces the held
    /// document only after it has been written to disk.
    fn commit<T>(&self, change: impl FnOnce(&mut RegistryDocument) -> Result<T>) -> Result<T> {
        let mut doc = self.lock();
        let mut next = doc.clone();
        let value = change(&mut next)?;
        write_document(&self.path, &next)?;
        *doc = next;
        Ok(value)
    }

    pub fn add(&self, name: &str, path: &Path) -> Result<InstallationRecord> {
        if !self.validator.is_valid_installation(path) {
            return Err(CoreError::InvalidPath {
                path: path.display().to_string(),
            }
            .into());
        }
        let normalized = NormalizedPath::new(path)?;

        let record = self.commit(|doc| {
            if doc.jdks.contains_key(name) {
                return Err(CoreError::AlreadyExists {
                    name: name.to_string(),
                }
                .into());
            }

            let duplicate = doc.jdks.values().find(|jdk| {
                NormalizedPath::new(&jdk.path).is_ok_and(|existing| existing == normalized)
            });
            if let Some(existing) = duplicate {
                return Err(CoreError::PathAlreadyRegistered {
                    path: path.display().to_string(),
                    name: existing.name.clone(),
                }
                .into());
            }

            let record = InstallationRecord::new(name, path);
            doc.jdks.insert(name.to_string(), record.clone());
            Ok(record)
        })?;

        debug!("Registered {}", record);
        Ok(record)
    }

    pub fn remove(&self, name: &str) -> Result<InstallationRecord> {
        self.commit(|doc| {
            let record = doc.jdks.remove(name).ok_or_else(|| CoreError::NotFound {
                name: name.to_string(),
            })?;

            if doc.current_name() == Some(name) {
                doc.current = None;
            }
            Ok(record)
        })
    }

    pub fn get(&self, name: &str) -> Result<InstallationRecord> {
        self.lock().jdks.get(name).cloned().ok_or_else(|| {
            CoreError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// All registered JDKs, sorted by name.
    pub fn list(&self) -> Vec<InstallationRecord> {
        self.lock().jdks.values().cloned().collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.lock().jdks.contains_key(name)
    }

    pub fn set_current(&self, name: &str) -> Result<()> {
        self.commit(|doc| {
            if !doc.jdks.contains_key(name) {
                return Err(CoreError::NotFound {
                    name: name.to_string(),
                }
                .into());
            }
            doc.current = Some(name.to_string());
            Ok(())
        })
    }

    pub fn current(&self) -> Result<InstallationRecord> {
        let doc = self.lock();
        let name = doc.current_name().ok_or(CoreError::NoCurrent)?;
        doc.jdks.get(name).cloned().ok_or_else(|| {
            CoreError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn symlink_path(&self) -> Option<PathBuf> {
        self.lock().symlink_path.clone()
    }

    pub fn set_symlink_path(&self, path: &Path) -> Result<()> {
        self.commit(|doc| {
            doc.symlink_path = Some(path.to_path_buf());
            Ok(())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn mark_initialized(&self, env_backup_path: &Path) -> Result<()> {
        self.commit(|doc| {
            doc.initialized = true;
            doc.env_backup_path = Some(env_backup_path.to_path_buf());
            Ok(())
        })
    }
}

impl InstallationRegistry for JsonRegistryStore {
    fn existing_paths(&self) -> Vec<PathBuf> {
        self.lock().jdks.values().map(|jdk| jdk.path.clone()).collect()
    }
}

fn write_document(path: &Path, doc: &RegistryDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create registry directory: {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(doc).context("Failed to serialize registry")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write registry file: {}", path.display()))?;
    Ok(())
}
