//! Name-based pruning of directories that are unlikely to hold a JDK.
//!
//! The filter only looks at the last path segment (plus the system root for
//! OS folders), so it never touches the filesystem. A wrong `Skip` hides an
//! installation in an odd place; a wrong `Scan` only costs time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Scan,
    Skip,
}

/// Configurable skip rules, loaded from the `[filter]` settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Directory names skipped anywhere (case-insensitive)
    pub skip_names: Vec<String>,
    /// Skipped when the name contains any of these
    pub skip_substrings: Vec<String>,
    /// Skipped when the name starts with any of these
    pub skip_prefixes: Vec<String>,
    /// OS folders, skipped under `system_root` (or anywhere if it is unset)
    pub system_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_root: Option<PathBuf>,
}

const SYSTEM_NAMES: &[&str] = &[
    "windows",
    "system32",
    "syswow64",
    "drivers",
    "winsxs",
];

const SKIP_NAMES: &[&str] = &[
    // Reserved volume folders
    "$recycle.bin",
    "system volume information",
    "recovery",
    ".trash",
    ".trashes",
    ".spotlight-v100",
    ".fseventsd",
    "lost+found",
    "proc",
    "sys",
    // Build output and VCS metadata
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "bin",
    "obj",
    "debug",
    "release",
    "target",
    "build",
    "dist",
    "out",
    "tmp",
    "logs",
    "log",
    "backups",
    // User folders
    "downloads",
    "documents",
    "pictures",
    "music",
    "videos",
    "desktop",
    // IDEs
    "visual studio",
    "microsoft visual studio",
    "jetbrains",
    "intellij",
    "eclipse",
    "netbeans",
    "android studio",
    "xamarin",
    ".vscode",
    ".idea",
    ".vs",
    // Package managers and build tools
    "npm",
    "yarn",
    "gradle",
    "maven",
    ".m2",
    ".gradle",
    "nuget",
    "pip",
    "conda",
    // Sources and docs
    "src",
    "source",
    "sources",
    "test",
    "tests",
    "doc",
    "docs",
    "documentation",
    "examples",
    "samples",
    "demo",
    "demos",
    "tutorial",
    "tutorials",
];

const SKIP_SUBSTRINGS: &[&str] = &["temp", "cache", "backup"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            skip_names: owned(SKIP_NAMES),
            skip_substrings: owned(SKIP_SUBSTRINGS),
            skip_prefixes: vec!["~".to_string()],
            system_names: owned(SYSTEM_NAMES),
            system_root: None,
        }
    }
}

/// Compiled form of [`FilterRules`] with lowercased lookups.
#[derive(Debug, Clone)]
pub struct PathFilter {
    skip_names: HashSet<String>,
    skip_substrings: Vec<String>,
    skip_prefixes: Vec<String>,
    system_names: HashSet<String>,
    system_root: Option<PathBuf>,
}

fn lowercase_all(list: &[String]) -> Vec<String> {
    list.iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn lowercase_path(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().to_lowercase())
}

impl PathFilter {
    pub fn new(rules: &FilterRules) -> Self {
        Self {
            skip_names: lowercase_all(&rules.skip_names).into_iter().collect(),
            skip_substrings: lowercase_all(&rules.skip_substrings),
            skip_prefixes: lowercase_all(&rules.skip_prefixes),
            system_names: lowercase_all(&rules.system_names).into_iter().collect(),
            system_root: rules.system_root.as_deref().map(lowercase_path),
        }
    }

    pub fn classify(&self, path: &Path) -> Classification {
        let Some(name) = path.file_name() else {
            return Classification::Scan;
        };
        let name = name.to_string_lossy().to_lowercase();

        if self.skip_names.contains(&name) {
            return Classification::Skip;
        }

        if self.system_names.contains(&name) && self.under_system_root(path) {
            return Classification::Skip;
        }

        if self.skip_substrings.iter().any(|s| name.contains(s.as_str()))
            || self.skip_prefixes.iter().any(|p| name.starts_with(p.as_str()))
        {
            return Classification::Skip;
        }

        Classification::Scan
    }

    pub fn should_scan(&self, path: &Path) -> bool {
        self.classify(path) == Classification::Scan
    }

    fn under_system_root(&self, path: &Path) -> bool {
        match &self.system_root {
            Some(root) => lowercase_path(path).starts_with(root),
            None => true,
        }
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(&FilterRules::default())
    }
}
