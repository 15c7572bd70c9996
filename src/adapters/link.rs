use anyhow::{Context, Result, bail};
use jenv_core::ports::Linker;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(windows)]
pub const DEFAULT_LINK_PATH: &str = r"C:\Java\JAVA_HOME";
#[cfg(not(windows))]
pub const DEFAULT_LINK_PATH: &str = ".jenv/java_home";

/// Where the active-JDK link lives when the settings don't say otherwise.
///
/// On Unix the path is relative to the home directory.
pub fn default_link_path() -> PathBuf {
    let path = PathBuf::from(DEFAULT_LINK_PATH);
    if path.is_absolute() {
        return path;
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(path)
}

const SYSTEM_PREFIXES: &[&str] = &["/opt/", "/usr/", "/etc/", "/var/", "/bin/", "/sbin/", "/lib/", "/lib64/"];

/// Locations where creating a link normally needs elevated privileges.
pub fn is_system_location(path: &Path) -> bool {
    let path = path.to_string_lossy();
    SYSTEM_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Directory symlink implementation of the `Linker` port.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkLinker;

impl SymlinkLinker {
    fn remove_existing(link: &Path) -> Result<()> {
        let Ok(metadata) = fs::symlink_metadata(link) else {
            return Ok(());
        };

        if metadata.file_type().is_symlink() {
            // Windows directory links are removed like directories
            fs::remove_file(link)
                .or_else(|_| fs::remove_dir(link))
                .with_context(|| format!("Failed to remove old link: {}", link.display()))
        } else if metadata.is_dir() {
            bail!(
                "{} is a real directory, refusing to replace it with a link",
                link.display()
            )
        } else {
            fs::remove_file(link)
                .with_context(|| format!("Failed to remove file at {}", link.display()))
        }
    }

    #[cfg(unix)]
    fn create(target: &Path, link: &Path) -> std::io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    fn create(target: &Path, link: &Path) -> std::io::Result<()> {
        std::os::windows::fs::symlink_dir(target, link)
    }
}

impl Linker for SymlinkLinker {
    fn switch(&self, target: &Path, link: &Path) -> Result<()> {
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create link directory: {}", parent.display()))?;
        }

        Self::remove_existing(link)?;

        Self::create(target, link).with_context(|| {
            let mut msg = format!(
                "Failed to link {} -> {}",
                link.display(),
                target.display()
            );
            if is_system_location(link) {
                msg.push_str(" (linking under a system directory usually requires root)");
            }
            msg
        })?;

        debug!("Linked {} -> {}", link.display(), target.display());
        Ok(())
    }

    fn target(&self, link: &Path) -> Result<Option<PathBuf>> {
        match fs::read_link(link) {
            Ok(target) => Ok(Some(target)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read link: {}", link.display())),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_switch_creates_and_replaces_link() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let jdk17 = temp_dir.path().join("jdk-17");
        let jdk21 = temp_dir.path().join("jdk-21");
        fs::create_dir_all(&jdk17)?;
        fs::create_dir_all(&jdk21)?;
        let link = temp_dir.path().join(".jenv").join("java_home");

        let linker = SymlinkLinker;
        assert_eq!(linker.target(&link)?, None);

        linker.switch(&jdk17, &link)?;
        assert_eq!(linker.target(&link)?, Some(jdk17));

        linker.switch(&jdk21, &link)?;
        assert_eq!(linker.target(&link)?, Some(jdk21));
        Ok(())
    }

    #[test]
    fn test_switch_refuses_to_replace_real_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let jdk = temp_dir.path().join("jdk-17");
        let occupied = temp_dir.path().join("java_home");
        fs::create_dir_all(&jdk)?;
        fs::create_dir_all(occupied.join("keep"))?;

        assert!(SymlinkLinker.switch(&jdk, &occupied).is_err());
        assert!(occupied.join("keep").exists());
        Ok(())
    }

    #[test]
    fn test_is_system_location() {
        assert!(is_system_location(Path::new("/opt/jenv/java_home")));
        assert!(!is_system_location(Path::new("/home/dev/.jenv/java_home")));
    }
}
