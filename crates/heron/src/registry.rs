use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::providers::base::Provider;
use crate::providers::configs::ProviderConfig;
use crate::providers::factory::get_provider;

/// Maps model identifiers to provider configurations. Built once at startup;
/// the key set is the service's model allow-list.
#[derive(Default)]
pub struct ModelRegistry {
    entries: HashMap<String, ProviderConfig>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register<S: Into<String>>(&mut self, model: S, config: ProviderConfig) {
        self.entries.insert(model.into(), config);
    }

    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }

    /// All registered model identifiers, sorted for stable listings
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.entries.keys().cloned().collect();
        models.sort();
        models
    }

    /// Build the provider client for a model
    pub fn resolve(&self, model: &str) -> AgentResult<Box<dyn Provider + Send + Sync>> {
        let config = self.entries.get(model).ok_or_else(|| {
            AgentError::Configuration(format!("model '{}' is not in the allow-list", model))
        })?;

        get_provider(config.clone()).map_err(|e| AgentError::Configuration(e.to_string()))
    }
}
