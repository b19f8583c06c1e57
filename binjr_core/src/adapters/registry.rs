//! Runtime table mapping adapter keys to constructors.

use std::{collections::HashMap, fmt, sync::Arc};

use shared_utils::config::ConfigError;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, info};

use crate::{
    adapters::{
        DataAdapter,
        errors::{CannotInitializeAdapterSnafu, NoAdapterFoundSnafu, RegistryError},
        jrds::{self, JrdsDataAdapter},
        transport::HttpTransport,
    },
    config::{AdapterConfig, BinjrConfig, normalize_key},
};

/// Builds an adapter from its preferences entry.
pub type AdapterConstructor =
    fn(&AdapterConfig, Arc<dyn HttpTransport>) -> Result<Arc<dyn DataAdapter>, ConfigError>;

/// Metadata and constructor of one registered adapter kind.
#[derive(Clone)]
pub struct AdapterInfo {
    key: String,
    name: String,
    description: String,
    version: String,
    enabled: bool,
    constructor: AdapterConstructor,
}

impl AdapterInfo {
    pub fn new(
        key: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        constructor: AdapterConstructor,
    ) -> Self {
        Self {
            key: normalize_key(key),
            name: name.into(),
            description: description.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            enabled: true,
            constructor,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Debug for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterInfo")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

fn new_jrds(config: &AdapterConfig, transport: Arc<dyn HttpTransport>) -> Result<Arc<dyn DataAdapter>, ConfigError> {
    let adapter: Arc<dyn DataAdapter> = JrdsDataAdapter::from_config(config, transport)?;
    Ok(adapter)
}

/// Adapter kinds available for instantiation.
pub struct AdapterRegistry {
    adapters: HashMap<String, AdapterInfo>,
    transport: Arc<dyn HttpTransport>,
}

impl AdapterRegistry {
    /// An empty registry whose adapters will share `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            adapters: HashMap::new(),
            transport,
        }
    }

    /// A registry holding the adapters shipped with this crate.
    pub fn with_builtin(transport: Arc<dyn HttpTransport>) -> Self {
        let mut registry = Self::new(transport);
        registry.register(AdapterInfo::new(
            jrds::ADAPTER_KEY,
            "JRDS",
            "Connects to a JRDS performance monitoring server",
            new_jrds,
        ));
        registry
    }

    /// Registers `info`, replacing any adapter with the same key.
    pub fn register(&mut self, info: AdapterInfo) {
        debug!(key = info.key(), name = info.name(), "Registering data adapter");
        self.adapters.insert(info.key.clone(), info);
    }

    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> Result<(), RegistryError> {
        let key = normalize_key(key);
        let info = self.adapters.get_mut(&key).context(NoAdapterFoundSnafu { key: key.as_str() })?;
        info.enabled = enabled;
        Ok(())
    }

    /// Applies the `enabled` flags of `config`; entries for unknown keys are ignored.
    pub fn apply_preferences(&mut self, config: &BinjrConfig) {
        for (key, cfg) in &config.adapters {
            if let Some(info) = self.adapters.get_mut(key) {
                info.enabled = cfg.enabled;
            }
        }
    }

    /// Every registered adapter, sorted by name.
    pub fn all_adapters(&self) -> Vec<&AdapterInfo> {
        let mut all: Vec<_> = self.adapters.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Enabled adapters, sorted by name.
    pub fn active_adapters(&self) -> Vec<&AdapterInfo> {
        self.all_adapters().into_iter().filter(|a| a.enabled).collect()
    }

    pub fn info(&self, key: &str) -> Result<&AdapterInfo, RegistryError> {
        let key = normalize_key(key);
        self.adapters.get(&key).context(NoAdapterFoundSnafu { key })
    }

    /// Creates a new instance of the adapter registered under `key`.
    pub fn new_adapter(&self, key: &str, config: &AdapterConfig) -> Result<Arc<dyn DataAdapter>, RegistryError> {
        let info = self.info(key)?;
        let adapter = (info.constructor)(config, Arc::clone(&self.transport))
            .context(CannotInitializeAdapterSnafu { key: info.key() })?;
        info!(key = info.key(), source = %adapter.source_name(), "Created data adapter");
        Ok(adapter)
    }

    /// Instantiates every configured adapter whose kind is registered and active.
    pub fn open_from_config(&self, config: &BinjrConfig) -> Result<Vec<Arc<dyn DataAdapter>>, RegistryError> {
        config
            .adapters
            .iter()
            .filter(|(key, cfg)| cfg.enabled && self.adapters.get(*key).is_some_and(|i| i.enabled))
            .map(|(key, cfg)| self.new_adapter(key, cfg))
            .collect()
    }
}
