//! Layered configuration resolution.
//!
//! Settings come from two dotenv-style files: a base settings file that is
//! safe to share and a secrets file holding the account credentials. The two
//! are merged into one [`EffectiveConfig`] with the secrets taking precedence,
//! and the result is checked against the keys the entry point needs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::SyncError;

pub const ACCOUNT_NAME: &str = "ACCOUNT_NAME";
pub const ACCOUNT_KEY: &str = "ACCOUNT_KEY";
pub const COMPETITION_ID: &str = "COMPETITION_ID";
pub const DOWNLOAD_DIR: &str = "DOWNLOAD_DIR";
pub const INPUT_DATASETS: &str = "INPUT_DATASETS";
pub const NOTEBOOK_OWNER: &str = "NOTEBOOK_OWNER";

/// Keys every entry point needs.
pub const CREDENTIAL_KEYS: &[&str] = &[ACCOUNT_NAME, ACCOUNT_KEY];

/// Keys the competition download needs.
pub const COMPETITION_KEYS: &[&str] = &[ACCOUNT_NAME, ACCOUNT_KEY, COMPETITION_ID];

/// Environment variables the `kaggle` tool reads its credentials from.
pub const ENV_USERNAME: &str = "KAGGLE_USERNAME";
pub const ENV_KEY: &str = "KAGGLE_KEY";

pub const DEFAULT_CONFIG_PATH: &str = "config/kaggle.env";
pub const DEFAULT_SECRETS_PATH: &str = "config/kaggle.credentials.env";

/// One configuration source on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigLayer {
    pub path: PathBuf,
    /// A required layer must exist and hold at least one entry.
    pub required: bool,
}

impl ConfigLayer {
    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
        }
    }

    /// Read the layer's entries.
    ///
    /// An absent optional layer yields an empty mapping.
    pub fn read(&self) -> Result<BTreeMap<String, String>, SyncError> {
        if !self.path.exists() {
            if self.required {
                return Err(SyncError::ConfigMissing {
                    path: self.path.clone(),
                });
            }
            tracing::debug!(path = %self.path.display(), "optional config layer absent");
            return Ok(BTreeMap::new());
        }

        let entries = read_env_file(&self.path)?;
        if self.required && entries.is_empty() {
            return Err(SyncError::ConfigEmpty {
                path: self.path.clone(),
            });
        }

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "config layer read"
        );
        Ok(entries)
    }
}

/// The merged, validated configuration for one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectiveConfig {
    values: BTreeMap<String, String>,
}

impl EffectiveConfig {
    /// Overlay `secrets` on `base` and check that every required key is set.
    pub fn from_layers(
        base: BTreeMap<String, String>,
        secrets: BTreeMap<String, String>,
        required_keys: &[&str],
    ) -> Result<Self, SyncError> {
        let mut values = base;
        values.extend(secrets);

        let missing: BTreeSet<&str> = required_keys
            .iter()
            .copied()
            .filter(|key| !values.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::ConfigIncomplete {
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        }

        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of a key that was part of the required set.
    ///
    /// Returns an empty string for keys that were never required; callers only
    /// use this for keys validated by [`resolve`].
    pub fn require(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Non-empty value of an optional key.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn account_name(&self) -> &str {
        self.require(ACCOUNT_NAME)
    }

    pub fn account_key(&self) -> &str {
        self.require(ACCOUNT_KEY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Merge a base layer and a secrets layer into one effective configuration.
///
/// Fails with `ConfigMissing`/`ConfigEmpty` for an unusable required layer and
/// with `ConfigIncomplete` listing every absent required key.
pub fn resolve(
    base: &ConfigLayer,
    secrets: &ConfigLayer,
    required_keys: &[&str],
) -> Result<EffectiveConfig, SyncError> {
    tracing::info!(
        base = %base.path.display(),
        secrets = %secrets.path.display(),
        "resolving configuration"
    );
    let config = EffectiveConfig::from_layers(base.read()?, secrets.read()?, required_keys)?;
    tracing::debug!(keys = config.len(), "configuration resolved");
    Ok(config)
}

/// Hand the account credentials to the external tool.
///
/// The `kaggle` tool only reads credentials from the process environment, so
/// this is the one place that mutates it. Call it once, before the first
/// remote operation.
pub fn export_credentials(config: &EffectiveConfig) {
    std::env::set_var(ENV_USERNAME, config.account_name());
    std::env::set_var(ENV_KEY, config.account_key());
    tracing::debug!(username = config.account_name(), "credentials exported");
}

fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, SyncError> {
    let parse_error = |source: dotenvy::Error| SyncError::ConfigParse {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = BTreeMap::new();
    for item in dotenvy::from_path_iter(path).map_err(parse_error)? {
        let (key, value) = item.map_err(parse_error)?;
        entries.insert(key, value);
    }
    Ok(entries)
}
