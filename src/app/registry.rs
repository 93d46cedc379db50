use crate::app::config::ExchangeConfig;
use crate::core::adapters::Adapter;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Default)]
struct Index {
    adapters: Vec<Arc<Adapter>>,
    by_name: HashMap<String, Arc<Adapter>>,
}

impl Index {
    fn build(config: &ExchangeConfig) -> Self {
        let adapters: Vec<Arc<Adapter>> = config
            .adapters
            .iter()
            .filter(|a| a.enabled)
            .map(|a| Arc::new(a.to_adapter()))
            .collect();

        let by_name = adapters
            .iter()
            .map(|a| (a.name().to_string(), Arc::clone(a)))
            .collect();

        Index { adapters, by_name }
    }
}

/// Enabled adapters built from config, swappable on reload.
/// Readers hold an `Arc` so an in flight callout keeps its
/// adapter across a reload
pub struct AdapterRegistry {
    index: RwLock<Index>,
}

impl AdapterRegistry {
    pub fn new(config: &ExchangeConfig) -> Result<Self, anyhow::Error> {
        config.validate()?;

        let index = Index::build(config);
        info!("Loaded {} enabled adapters", index.adapters.len());

        Ok(AdapterRegistry {
            index: RwLock::new(index),
        })
    }

    /// Replaces every adapter. An invalid config leaves the
    /// current adapters in place
    pub fn reload(&self, config: &ExchangeConfig) -> Result<(), anyhow::Error> {
        config.validate()?;

        let index = Index::build(config);
        info!("Reloaded {} enabled adapters", index.adapters.len());
        *self.index.write() = index;

        Ok(())
    }

    pub fn adapters(&self) -> Vec<Arc<Adapter>> {
        self.index.read().adapters.clone()
    }

    pub fn adapter(&self, name: &str) -> Option<Arc<Adapter>> {
        self.index.read().by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.index.read().adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
