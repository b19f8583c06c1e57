//! User preferences loaded from TOML.
//!
//! ```toml
//! [adapters.jrds]
//! enabled = true
//! url = "http://jrds.example.com:8080/jrds"
//! zone = "Europe/Paris"
//! encoding = "utf-8"
//! tree_filter = "hoststab"
//! ```

use std::{fs, path::Path, str::FromStr};

use indexmap::IndexMap;
use serde::Deserialize;
use shared_utils::{config::ConfigError, env::get_env_var};

/// Environment variable holding the path of the preferences file.
pub const CONFIG_ENV_VAR: &str = "BINJR_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinjrConfig {
    #[serde(default)]
    pub adapters: IndexMap<String, AdapterConfig>,
}

/// Settings handed to one adapter constructor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_zone")]
    pub zone: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub tree_filter: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_zone() -> String {
    "UTC".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: None,
            zone: default_zone(),
            encoding: default_encoding(),
            tree_filter: None,
        }
    }
}

impl AdapterConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The `url` setting, which most adapters require.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "url".to_string(),
                message: "a source URL is required".to_string(),
            })
    }
}

/// Lower-cases and trims an adapter key.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

impl FromStr for BinjrConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: BinjrConfig = toml::from_str(s).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let mut adapters = IndexMap::with_capacity(raw.adapters.len());
        for (key, cfg) in raw.adapters {
            let key = normalize_key(&key);
            if adapters.insert(key.clone(), cfg).is_some() {
                return Err(ConfigError::Invalid(format!("adapter {key} is configured twice")));
            }
        }
        Ok(Self { adapters })
    }
}

impl BinjrConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Loads the file named by `BINJR_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(get_env_var(CONFIG_ENV_VAR)?)
    }

    pub fn adapter(&self, key: &str) -> Option<&AdapterConfig> {
        self.adapters.get(&normalize_key(key))
    }
}
