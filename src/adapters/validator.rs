use jenv_core::ports::InstallationValidator;
use std::path::Path;

#[cfg(windows)]
pub const JAVA_EXECUTABLE: &str = "java.exe";
#[cfg(not(windows))]
pub const JAVA_EXECUTABLE: &str = "java";

/// A JDK is any directory with a `bin/java` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaValidator;

impl InstallationValidator for JavaValidator {
    fn is_valid_installation(&self, path: &Path) -> bool {
        path.join("bin").join(JAVA_EXECUTABLE).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_directory_with_java_binary_is_valid() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let jdk = temp_dir.path().join("jdk-21");
        fs::create_dir_all(jdk.join("bin"))?;
        fs::write(jdk.join("bin").join(JAVA_EXECUTABLE), "")?;

        assert!(JavaValidator.is_valid_installation(&jdk));
        Ok(())
    }

    #[test]
    fn test_missing_or_directory_binary_is_invalid() -> Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(!JavaValidator.is_valid_installation(temp_dir.path()));

        // bin/java as a directory does not count
        fs::create_dir_all(temp_dir.path().join("bin").join(JAVA_EXECUTABLE))?;
        assert!(!JavaValidator.is_valid_installation(temp_dir.path()));
        Ok(())
    }
}
