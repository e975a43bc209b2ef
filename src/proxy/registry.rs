use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::{MemoryProxy, Proxy, ProxyConfig, ProxyError};

/// Builds a proxy from its config.
pub type ProxyFactory =
    Arc<dyn Fn(ProxyConfig) -> Result<Arc<dyn Proxy>, ProxyError> + Send + Sync>;

/// Input to `ProxyRegistry::create`: an existing proxy or a config naming a
/// registered type.
pub enum ProxySource {
    Instance(Arc<dyn Proxy>),
    Config(ProxyConfig),
}

impl From<Arc<dyn Proxy>> for ProxySource {
    fn from(proxy: Arc<dyn Proxy>) -> Self {
        ProxySource::Instance(proxy)
    }
}

impl From<&Arc<dyn Proxy>> for ProxySource {
    fn from(proxy: &Arc<dyn Proxy>) -> Self {
        ProxySource::Instance(Arc::clone(proxy))
    }
}

impl From<ProxyConfig> for ProxySource {
    fn from(config: ProxyConfig) -> Self {
        ProxySource::Config(config)
    }
}

/// Type-name to factory registry for polymorphic proxy construction.
///
/// Names are case-insensitive. Registering a name twice is an error rather
/// than a silent replacement. Clone-friendly via Arc; clones share
/// registrations.
#[derive(Clone, Default)]
pub struct ProxyRegistry {
    factories: Arc<RwLock<HashMap<String, ProxyFactory>>>,
}

impl ProxyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `memory` type.
    pub fn with_defaults() -> Result<Self, ProxyError> {
        let registry = Self::new();
        registry.register("memory", MemoryProxy::from_config)?;
        Ok(registry)
    }

    pub fn register<F>(&self, type_name: &str, factory: F) -> Result<(), ProxyError>
    where
        F: Fn(ProxyConfig) -> Result<Arc<dyn Proxy>, ProxyError> + Send + Sync + 'static,
    {
        let key = type_name.to_lowercase();
        let mut factories = self
            .factories
            .write()
            .map_err(|_| ProxyError::LockPoisoned("proxy registration"))?;

        if factories.contains_key(&key) {
            return Err(ProxyError::AlreadyRegistered(type_name.to_string()));
        }

        debug!(type_name = %key, "registered proxy type");
        factories.insert(key, Arc::new(factory));
        Ok(())
    }

    pub fn is_registered(&self, type_name: &str) -> Result<bool, ProxyError> {
        let factories = self
            .factories
            .read()
            .map_err(|_| ProxyError::LockPoisoned("proxy lookup"))?;
        Ok(factories.contains_key(&type_name.to_lowercase()))
    }

    /// Return an existing proxy unchanged, or build one from a config whose
    /// `type` names a registered proxy.
    pub fn create(&self, source: impl Into<ProxySource>) -> Result<Arc<dyn Proxy>, ProxyError> {
        let config = match source.into() {
            ProxySource::Instance(proxy) => return Ok(proxy),
            ProxySource::Config(config) => config,
        };

        let type_name = config.type_name.as_deref().ok_or(ProxyError::MissingType)?;
        let factory = {
            let factories = self
                .factories
                .read()
                .map_err(|_| ProxyError::LockPoisoned("proxy lookup"))?;
            factories
                .get(&type_name.to_lowercase())
                .cloned()
                .ok_or_else(|| ProxyError::UnknownType(type_name.to_string()))?
        };

        debug!(type_name = %type_name, "creating proxy");
        factory(config)
    }
}
