//! Configuration for the `vouch` verifier.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "vouch.toml";
const ENV_PREFIX: &str = "VOUCH_";

/// Verifier configuration with defaults, file, and environment overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed `VOUCH_` (highest priority)
/// 2. Configuration file (`vouch.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Exactly one of `policy` and `policy_file` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Named policy resolved through the policy directory and the builtins.
    ///
    /// Environment variable: `VOUCH_POLICY`
    #[serde(default)]
    pub policy: Option<String>,

    /// Explicit path to a policy file.
    ///
    /// Environment variable: `VOUCH_POLICY_FILE`
    #[serde(default)]
    pub policy_file: Option<PathBuf>,

    /// Directory searched for `<name>.policy` files.
    ///
    /// Environment variable: `VOUCH_POLICY_DIR`
    #[serde(default = "default_policy_dir")]
    pub policy_dir: PathBuf,

    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Environment variable: `VOUCH_RUST_LOG`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, `vouch.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration using `path` as the configuration file.
    ///
    /// A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        match (&self.policy, &self.policy_file) {
            (Some(_), Some(_)) => anyhow::bail!("policy and policy_file are mutually exclusive"),
            (None, None) => anyhow::bail!("one of policy or policy_file must be set"),
            (Some(name), None) if name.is_empty() => anyhow::bail!("policy must not be empty"),
            _ => {},
        }

        if self.rust_log.trim().is_empty() {
            anyhow::bail!("rust_log must not be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: None,
            policy_file: None,
            policy_dir: default_policy_dir(),
            rust_log: default_log_level(),
        }
    }
}

fn default_policy_dir() -> PathBuf {
    PathBuf::from("/etc/vouch/policy")
}

fn default_log_level() -> String {
    "info".to_string()
}
