//! Configuration management for the operator account store
//!
//! Settings come from `config.toml` with environment overrides. Every value
//! has a default so the store can boot without a file on disk.

use config::{Config, Environment, File, FileFormat};
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `OPERATOR_ACCOUNTS__STORE__PATH`
const ENV_PREFIX: &str = "OPERATOR_ACCOUNTS";

/// Locations searched for `config.toml`, without extension
const CONFIG_PATHS: [&str; 2] = [
    "operator-accounts/config", // Packaged layout: /app/operator-accounts/config.toml
    "config",                   // Local development: ./config.toml
];

/// Complete configuration for the account store and its boundary policy
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AccountsConfig {
    pub store: StoreConfig,
    pub bootstrap: BootstrapConfig,
    pub policy: PolicyConfig,
    pub hashing: HashingConfig,
}

/// What `load` does with a store file it cannot parse
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStorePolicy {
    /// Log a warning and continue with an empty account set
    #[default]
    TreatAsEmpty,
    /// Surface `StoreError::Corrupt` to the caller
    Fail,
}

/// Where and how the account set is persisted
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub on_corrupt: CorruptStorePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("users.json"),
            on_corrupt: CorruptStorePolicy::TreatAsEmpty,
        }
    }
}

/// The protected administrator account written on first initialization
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BootstrapConfig {
    pub username: String,
    pub credential: String,
    pub display_name: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            credential: "admin123".to_string(),
            display_name: "Administrador".to_string(),
        }
    }
}

/// Form policy enforced at the administrative boundary
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PolicyConfig {
    pub min_credential_length: usize,
    pub max_username_length: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_credential_length: 4,
            max_username_length: 64,
        }
    }
}

/// Argon2id work factors for newly written credential hashes
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024, // 19 MiB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl AccountsConfig {
    /// Load configuration from the first `config.toml` found, with environment overrides.
    ///
    /// A missing file is not an error: defaults are used and the environment
    /// can still override them.
    pub fn load() -> Result<Self, config::ConfigError> {
        let found = CONFIG_PATHS
            .iter()
            .find(|candidate| Path::new(&format!("{candidate}.toml")).exists());

        let mut builder = Config::builder();
        match found {
            Some(path) => {
                info!("Loading configuration from {}.toml", path);
                builder = builder.add_source(File::with_name(path));
            }
            None => debug!(
                "No config.toml found (tried {:?}), using defaults",
                CONFIG_PATHS
            ),
        }

        Self::build(builder)
    }

    /// Load configuration from an explicit TOML file, with environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = Config::builder().add_source(File::from(path).format(FileFormat::Toml));
        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let config: AccountsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with the store placed at `path`.
    pub fn with_store_path(path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.store.path = path.into();
        config
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.store.path.as_os_str().is_empty() {
            return Err(config::ConfigError::Message(
                "store.path cannot be empty".into(),
            ));
        }

        if self.bootstrap.username.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bootstrap.username cannot be empty".into(),
            ));
        }

        if self.bootstrap.credential.is_empty() {
            return Err(config::ConfigError::Message(
                "bootstrap.credential cannot be empty".into(),
            ));
        }

        if self.policy.min_credential_length == 0 {
            return Err(config::ConfigError::Message(
                "policy.min_credential_length must be greater than 0".into(),
            ));
        }

        if self.policy.max_username_length == 0 {
            return Err(config::ConfigError::Message(
                "policy.max_username_length must be greater than 0".into(),
            ));
        }

        // Argon2 refuses fewer than 8 KiB per lane
        if self.hashing.parallelism == 0
            || self.hashing.iterations == 0
            || self.hashing.memory_kib < 8 * self.hashing.parallelism
        {
            return Err(config::ConfigError::Message(format!(
                "hashing parameters out of range: m={} KiB, t={}, p={}",
                self.hashing.memory_kib, self.hashing.iterations, self.hashing.parallelism
            )));
        }

        Ok(())
    }
}
