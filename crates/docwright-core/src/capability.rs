use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use docwright_agent::ToolDefinition;

/// Errors a capability handler can report back to the model
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A named, schema-described function the model may ask to run
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name the model uses to call this capability
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON Schema describing the accepted arguments
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the capability with already-parsed arguments
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, CapabilityError>;
}

/// Deserialize capability arguments into a typed struct
pub fn parse_arguments<T: DeserializeOwned>(
    arguments: serde_json::Value,
) -> Result<T, CapabilityError> {
    serde_json::from_value(arguments).map_err(|e| CapabilityError::InvalidArguments(e.to_string()))
}

/// Set of capabilities offered to the model, keyed by name
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Box<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, replacing any existing one with the same name
    pub fn register<C: Capability + 'static>(&mut self, capability: C) {
        let name = capability.name().to_string();
        if self
            .capabilities
            .insert(name.clone(), Box::new(capability))
            .is_some()
        {
            debug!(capability = %name, "Replaced capability");
        } else {
            debug!(capability = %name, "Registered capability");
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn Capability> {
        self.capabilities.get(name).map(|c| c.as_ref())
    }

    /// All capabilities, sorted by name
    pub fn list(&self) -> Vec<&dyn Capability> {
        self.capabilities.values().map(|c| c.as_ref()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }

    /// Tool manifest for the model backend
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.capabilities
            .values()
            .map(|c| ToolDefinition {
                name: c.name().to_string(),
                description: c.description().to_string(),
                parameters: c.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
