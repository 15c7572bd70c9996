//! Exclusion of already registered installations.
//!
//! Paths are compared in normalized form: absolute, with `.` and `..`
//! resolved lexically, without a trailing separator, and lowercased. The
//! comparison is therefore case-insensitive on every platform.

use crate::error::{CoreError, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// A path in the canonical form used for equality and nesting checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

/// `path` made absolute with `.` and `..` resolved lexically, case kept.
///
/// Relative paths are resolved against the current directory. Empty and
/// non UTF-8 paths are rejected.
pub fn clean_absolute(path: &Path) -> Result<String> {
    let invalid = || CoreError::InvalidPath {
        path: path.to_string_lossy().to_string(),
    };

    if path.as_os_str().is_empty() {
        return Err(invalid());
    }

    let absolute = std::path::absolute(path).map_err(|_| invalid())?;
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    cleaned.to_str().map(str::to_string).ok_or_else(invalid)
}

impl NormalizedPath {
    /// Normalize `path` without touching the filesystem.
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self(clean_absolute(path)?.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `other` is this path or lies beneath it.
    ///
    /// Nesting is decided per path component, so `/java/jdk1` does not
    /// contain `/java/jdk11`.
    pub fn contains(&self, other: &NormalizedPath) -> bool {
        Path::new(&other.0).starts_with(Path::new(&self.0))
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time snapshot of registered installation paths.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    roots: HashSet<NormalizedPath>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot, dropping paths that cannot be normalized.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = paths
            .into_iter()
            .filter_map(|p| NormalizedPath::new(p.as_ref()).ok())
            .collect();
        Self { roots }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// True when `path` equals or is nested under a registered path.
    ///
    /// A path that cannot be normalized is reported as excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        match NormalizedPath::new(path) {
            Ok(normalized) => self.contains(&normalized),
            Err(_) => true,
        }
    }

    /// Walks the ancestors of `path`, so the cost is its depth rather than
    /// the size of the set.
    pub fn contains(&self, path: &NormalizedPath) -> bool {
        if self.roots.is_empty() {
            return false;
        }
        Path::new(path.as_str())
            .ancestors()
            .filter_map(Path::to_str)
            .any(|ancestor| self.roots.contains(&NormalizedPath(ancestor.to_string())))
    }
}
