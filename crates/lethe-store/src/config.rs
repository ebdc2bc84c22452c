//! Store configuration.

use std::path::PathBuf;

use lethe_core::defaults;

/// Configuration for opening a filesystem vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root directory holding one sub-directory per media kind.
    pub root: PathBuf,
    /// SHA-256 rounds for the host key. Must match the value used to write
    /// the store.
    pub host_key_iterations: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(defaults::STORE_PATH),
            host_key_iterations: defaults::HOST_KEY_ITERATIONS,
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LETHE_STORE_PATH` | `./lethe-vault` | Vault root directory |
    /// | `LETHE_HOST_KEY_ITERATIONS` | `12` | Host key hash rounds (min 1) |
    pub fn from_env() -> Self {
        let root = std::env::var(defaults::ENV_STORE_PATH)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::STORE_PATH));

        let host_key_iterations = std::env::var(defaults::ENV_HOST_KEY_ITERATIONS)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults::HOST_KEY_ITERATIONS)
            .max(1);

        Self {
            root,
            host_key_iterations,
        }
    }

    /// Set the vault root directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set host key iterations.
    pub fn with_host_key_iterations(mut self, iterations: u32) -> Self {
        self.host_key_iterations = iterations;
        self
    }
}
