use anyhow::{Context, Result};
use icn_keyring::LksParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for `icn-keyctl`
#[derive(Debug, Deserialize, Clone)]
pub struct KeyctlConfig {
    /// Path to the directory for persistent storage (Sled DB holding keys and chains).
    pub storage_path: PathBuf,

    /// Optional log level string (e.g., "info", "debug", "icn_keygen=trace").
    #[serde(default)]
    pub log_level: Option<String>,

    /// Validity of newly delegated keys, in seconds.
    #[serde(default = "default_expire_secs")]
    pub default_expire_secs: u64,

    /// Argon2id cost parameters for passphrase-derived local key security.
    #[serde(default = "default_lks_memory_kib")]
    pub lks_memory_kib: u32,
    #[serde(default = "default_lks_iterations")]
    pub lks_iterations: u32,
    #[serde(default = "default_lks_parallelism")]
    pub lks_parallelism: u32,
}

fn default_expire_secs() -> u64 {
    icn_keygen::DEFAULT_EXPIRE_IN.as_secs()
}

fn default_lks_memory_kib() -> u32 {
    LksParams::default().memory_kib
}

fn default_lks_iterations() -> u32 {
    LksParams::default().iterations
}

fn default_lks_parallelism() -> u32 {
    LksParams::default().parallelism
}

impl KeyctlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse configuration file: {:?}", path))
    }

    pub fn expire_in(&self) -> Duration {
        Duration::from_secs(self.default_expire_secs)
    }

    pub fn lks_params(&self) -> LksParams {
        LksParams {
            memory_kib: self.lks_memory_kib,
            iterations: self.lks_iterations,
            parallelism: self.lks_parallelism,
        }
    }
}
