use std::path::Path;

/// Decides whether a directory is a usable JDK installation.
pub trait InstallationValidator: Send + Sync {
    /// Called once per candidate directory during a scan; expected to cost
    /// about one `stat`.
    fn is_valid_installation(&self, path: &Path) -> bool;
}
