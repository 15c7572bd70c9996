use anyhow::Result;

/// Where an environment backend stores its variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvScope {
    /// The running process only
    Process,
    /// The current user's login environment
    User,
}

impl std::fmt::Display for EnvScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvScope::Process => f.write_str("process"),
            EnvScope::User => f.write_str("user"),
        }
    }
}

/// Platform-specific persistent environment variables.
pub trait EnvBackend: Send + Sync {
    fn scope(&self) -> EnvScope;

    /// Current value of `key`, if set.
    fn query(&self, key: &str) -> Result<Option<String>>;

    /// Set `key` to `value` in this backend's scope.
    fn update(&self, key: &str, value: &str) -> Result<()>;
}
