//! Environment variable backends.
//!
//! `default_backend` picks the persistent backend for the running platform
//! once at startup; everything else talks to the `EnvBackend` port.

use anyhow::{Context, Result, bail};
use jenv_core::ports::{EnvBackend, EnvScope};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Trailing marker on profile lines owned by jenv.
pub const PROFILE_MARKER: &str = "# jenv";

/// Process-local variables layered over the inherited environment.
///
/// Updates are visible to later queries through this backend but are not
/// exported to the real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnv {
    overrides: Mutex<HashMap<String, String>>,
}

impl ProcessEnv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvBackend for ProcessEnv {
    fn scope(&self) -> EnvScope {
        EnvScope::Process
    }

    fn query(&self, key: &str) -> Result<Option<String>> {
        let overrides = self.overrides.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(overrides
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok()))
    }

    fn update(&self, key: &str, value: &str) -> Result<()> {
        self.overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Shells whose startup files jenv knows how to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
    Profile,
}

impl ShellKind {
    /// Detection order, and the order updates are applied in.
    pub const ALL: [ShellKind; 4] = [ShellKind::Bash, ShellKind::Zsh, ShellKind::Fish, ShellKind::Profile];

    /// Startup file relative to the home directory.
    pub fn config_file(self) -> &'static str {
        match self {
            ShellKind::Bash => ".bashrc",
            ShellKind::Zsh => ".zshrc",
            ShellKind::Fish => ".config/fish/config.fish",
            ShellKind::Profile => ".profile",
        }
    }

    fn export_line(self, key: &str, value: &str) -> String {
        match self {
            ShellKind::Fish => format!("set -gx {} \"{}\" {}", key, value, PROFILE_MARKER),
            _ => format!("export {}=\"{}\" {}", key, value, PROFILE_MARKER),
        }
    }

    /// Value of a jenv-owned assignment of `key`, if `line` is one.
    fn parse_line(self, line: &str, key: &str) -> Option<String> {
        let body = line.trim().strip_suffix(PROFILE_MARKER)?.trim_end();
        let value = match self {
            ShellKind::Fish => body.strip_prefix("set -gx ")?.strip_prefix(key)?.strip_prefix(' ')?,
            _ => body.strip_prefix("export ")?.strip_prefix(key)?.strip_prefix('=')?,
        };
        Some(value.trim().trim_matches('"').to_string())
    }
}

/// One shell startup file and the syntax it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub kind: ShellKind,
    pub path: PathBuf,
}

impl ShellConfig {
    pub fn new<P: AsRef<Path>>(kind: ShellKind, path: P) -> Self {
        Self {
            kind,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn in_home(kind: ShellKind, home: &Path) -> Self {
        Self::new(kind, home.join(kind.config_file()))
    }

    fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn query(&self, key: &str) -> Result<Option<String>> {
        let contents = self.read()?;
        Ok(contents.lines().find_map(|line| self.kind.parse_line(line, key)))
    }

    /// Replace jenv's line for `key`, or append one. Other lines are kept.
    fn update(&self, key: &str, value: &str) -> Result<()> {
        let contents = self.read()?;
        let replacement = self.kind.export_line(key, value);

        let mut replaced = false;
        let mut lines: Vec<String> = contents
            .lines()
            .map(|line| {
                if self.kind.parse_line(line, key).is_some() {
                    replaced = true;
                    replacement.clone()
                } else {
                    line.to_string()
                }
            })
            .collect();
        if !replaced {
            lines.push(replacement);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut updated = lines.join("\n");
        updated.push('\n');
        fs::write(&self.path, updated)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!("Set {} in {}", key, self.path.display());
        Ok(())
    }
}

/// Startup files the user already has under `home`.
///
/// Fish counts once its config directory exists. With nothing found the
/// result is `~/.profile` alone.
pub fn detect_shell_configs(home: &Path) -> Vec<ShellConfig> {
    let configs: Vec<ShellConfig> = ShellKind::ALL
        .into_iter()
        .map(|kind| ShellConfig::in_home(kind, home))
        .filter(|config| match config.kind {
            ShellKind::Fish => config.path.parent().is_some_and(Path::is_dir),
            _ => config.path.is_file(),
        })
        .collect();

    if configs.is_empty() {
        vec![ShellConfig::in_home(ShellKind::Profile, home)]
    } else {
        configs
    }
}

/// User environment kept as jenv-marked lines in shell startup files.
#[derive(Debug)]
pub struct ProfileEnv {
    configs: Vec<ShellConfig>,
    process: ProcessEnv,
}

impl ProfileEnv {
    pub fn new(configs: Vec<ShellConfig>) -> Self {
        Self {
            configs,
            process: ProcessEnv::new(),
        }
    }

    /// Every startup file detected in the home directory.
    pub fn for_home() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        let configs = detect_shell_configs(&home);
        debug!(
            "Shell configs: {}",
            configs
                .iter()
                .map(|c| c.path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self::new(configs))
    }
}

impl EnvBackend for ProfileEnv {
    fn scope(&self) -> EnvScope {
        EnvScope::User
    }

    fn query(&self, key: &str) -> Result<Option<String>> {
        for config in &self.configs {
            if let Some(value) = config.query(key)? {
                return Ok(Some(value));
            }
        }
        self.process.query(key)
    }

    /// Writes every startup file, then reports the ones that failed.
    fn update(&self, key: &str, value: &str) -> Result<()> {
        let failures: Vec<String> = self
            .configs
            .iter()
            .filter_map(|config| {
                config
                    .update(key, value)
                    .err()
                    .map(|e| format!("{}: {:#}", config.path.display(), e))
            })
            .collect();

        if !failures.is_empty() {
            bail!("Failed to set {} in {}", key, failures.join("; "));
        }
        self.process.update(key, value)
    }
}

/// User environment in the Windows registry (`HKCU\Environment`).
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WindowsEnv {
    process: ProcessEnv,
}

#[cfg(windows)]
impl EnvBackend for WindowsEnv {
    fn scope(&self) -> EnvScope {
        EnvScope::User
    }

    fn query(&self, key: &str) -> Result<Option<String>> {
        let output = std::process::Command::new("reg")
            .args(["query", r"HKCU\Environment", "/v", key])
            .output()
            .context("Failed to run reg query")?;
        if !output.status.success() {
            return self.process.query(key);
        }
        Ok(parse_reg_query(&String::from_utf8_lossy(&output.stdout), key))
    }

    fn update(&self, key: &str, value: &str) -> Result<()> {
        let status = std::process::Command::new("setx")
            .args([key, value])
            .status()
            .context("Failed to run setx")?;
        if !status.success() {
            bail!("setx {} exited with {}", key, status);
        }
        self.process.update(key, value)
    }
}

/// Extract `key`'s value from `reg query` output such as
/// `    JAVA_HOME    REG_SZ    C:\Java\JAVA_HOME`.
pub fn parse_reg_query(output: &str, key: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (name, rest) = line.trim().split_once(char::is_whitespace)?;
        if !name.eq_ignore_ascii_case(key) {
            return None;
        }
        let (kind, value) = rest.trim_start().split_once(char::is_whitespace)?;
        kind.starts_with("REG_").then(|| value.trim().to_string())
    })
}

/// Persistent backend for this platform.
pub fn default_backend() -> Result<Box<dyn EnvBackend>> {
    #[cfg(windows)]
    {
        Ok(Box::new(WindowsEnv::default()))
    }
    #[cfg(not(windows))]
    {
        Ok(Box::new(ProfileEnv::for_home()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_process_env_overrides() -> Result<()> {
        let env = ProcessEnv::new();
        assert_eq!(env.scope(), EnvScope::Process);
        assert_eq!(env.query("JENV_TEST_UNSET_VARIABLE")?, None);

        env.update("JENV_TEST_UNSET_VARIABLE", "value")?;
        assert_eq!(
            env.query("JENV_TEST_UNSET_VARIABLE")?,
            Some("value".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_profile_update_appends_then_replaces() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let profile = temp_dir.path().join(".profile");
        fs::write(&profile, "export EDITOR=vim\nexport JAVA_HOME=/usr/lib/jvm/default\n")?;

        let env = ProfileEnv::new(vec![ShellConfig::new(ShellKind::Profile, &profile)]);
        env.update("JAVA_HOME", "/home/dev/.jenv/java_home")?;
        env.update("JAVA_HOME", "/opt/jenv/java_home")?;

        let contents = fs::read_to_string(&profile)?;
        assert!(contents.contains("export EDITOR=vim"));
        // The user's own line is left alone
        assert!(contents.contains("export JAVA_HOME=/usr/lib/jvm/default"));
        assert_eq!(contents.matches(PROFILE_MARKER).count(), 1);
        assert!(contents.contains("export JAVA_HOME=\"/opt/jenv/java_home\" # jenv"));

        assert_eq!(
            env.query("JAVA_HOME")?,
            Some("/opt/jenv/java_home".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_profile_created_when_missing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let profile = temp_dir.path().join("home").join(".profile");

        let env = ProfileEnv::new(vec![ShellConfig::new(ShellKind::Profile, &profile)]);
        env.update("JENV_TEST_KEY", "1")?;

        assert!(profile.exists());
        assert_eq!(env.query("JENV_TEST_KEY")?, Some("1".to_string()));
        Ok(())
    }

    #[test]
    fn test_line_format_per_shell() {
        for kind in [ShellKind::Bash, ShellKind::Zsh, ShellKind::Profile] {
            assert_eq!(
                kind.export_line("JAVA_HOME", "/x"),
                "export JAVA_HOME=\"/x\" # jenv"
            );
        }
        assert_eq!(
            ShellKind::Fish.export_line("JAVA_HOME", "/x"),
            "set -gx JAVA_HOME \"/x\" # jenv"
        );
    }

    #[test]
    fn test_parse_line_requires_marker_and_key() {
        let posix = ShellKind::Zsh;
        assert_eq!(
            posix.parse_line("export JAVA_HOME=\"/x\" # jenv", "JAVA_HOME"),
            Some("/x".to_string())
        );
        assert_eq!(posix.parse_line("export JAVA_HOME=\"/x\"", "JAVA_HOME"), None);
        assert_eq!(posix.parse_line("export JAVA_HOMES=\"/x\" # jenv", "JAVA_HOME"), None);
        assert_eq!(posix.parse_line("set -gx JAVA_HOME \"/x\" # jenv", "JAVA_HOME"), None);

        let fish = ShellKind::Fish;
        assert_eq!(
            fish.parse_line("set -gx JAVA_HOME \"/x\" # jenv", "JAVA_HOME"),
            Some("/x".to_string())
        );
        assert_eq!(fish.parse_line("set -gx JAVA_HOMES \"/x\" # jenv", "JAVA_HOME"), None);
        assert_eq!(fish.parse_line("export JAVA_HOME=\"/x\" # jenv", "JAVA_HOME"), None);
    }

    #[test]
    fn test_detect_existing_shell_configs() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let home = temp_dir.path();
        fs::write(home.join(".zshrc"), "")?;
        fs::write(home.join(".bashrc"), "")?;
        fs::create_dir_all(home.join(".config").join("fish"))?;

        let kinds: Vec<ShellKind> = detect_shell_configs(home).iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ShellKind::Bash, ShellKind::Zsh, ShellKind::Fish]);
        Ok(())
    }

    #[test]
    fn test_detect_falls_back_to_profile() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let configs = detect_shell_configs(temp_dir.path());
        assert_eq!(
            configs,
            vec![ShellConfig::in_home(ShellKind::Profile, temp_dir.path())]
        );
        Ok(())
    }

    #[test]
    fn test_update_writes_every_shell_in_its_syntax() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let home = temp_dir.path();
        let env = ProfileEnv::new(vec![
            ShellConfig::in_home(ShellKind::Zsh, home),
            ShellConfig::in_home(ShellKind::Fish, home),
        ]);

        env.update("JAVA_HOME", "/home/dev/.jenv/java_home")?;

        let zshrc = fs::read_to_string(home.join(".zshrc"))?;
        let fish = fs::read_to_string(home.join(".config/fish/config.fish"))?;
        assert_eq!(zshrc, "export JAVA_HOME=\"/home/dev/.jenv/java_home\" # jenv\n");
        assert_eq!(fish, "set -gx JAVA_HOME \"/home/dev/.jenv/java_home\" # jenv\n");
        Ok(())
    }

    #[test]
    fn test_parse_reg_query() {
        let output = "\r\nHKEY_CURRENT_USER\\Environment\r\n    JAVA_HOME    REG_SZ    C:\\Java\\JAVA_HOME\r\n\r\n";
        assert_eq!(
            parse_reg_query(output, "java_home"),
            Some("C:\\Java\\JAVA_HOME".to_string())
        );

        let output = "    Path    REG_EXPAND_SZ    %JAVA_HOME%\\bin;C:\\Program Files\\Git\\cmd\r\n";
        assert_eq!(
            parse_reg_query(output, "Path"),
            Some("%JAVA_HOME%\\bin;C:\\Program Files\\Git\\cmd".to_string())
        );
        assert_eq!(parse_reg_query(output, "JAVA_HOME"), None);
    }
}
