use anyhow::Result;
use std::path::{Path, PathBuf};

/// Maintains the filesystem link that points at the active JDK.
pub trait Linker: Send + Sync {
    /// Point `link` at `target`, replacing any previous link.
    fn switch(&self, target: &Path, link: &Path) -> Result<()>;

    /// Current target of `link`, or `None` when no link exists.
    fn target(&self, link: &Path) -> Result<Option<PathBuf>>;
}
