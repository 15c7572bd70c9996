use std::path::PathBuf;

/// Read-only view of registered installations, as needed by the scanner.
pub trait InstallationRegistry: Send + Sync {
    /// Paths of all registered installations. Called once per scan.
    fn existing_paths(&self) -> Vec<PathBuf>;
}

/// A fixed list of paths, for callers without a persistent store.
impl InstallationRegistry for Vec<PathBuf> {
    fn existing_paths(&self) -> Vec<PathBuf> {
        self.clone()
    }
}
