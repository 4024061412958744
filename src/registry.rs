//! Process-wide table of connectors keyed by type.
//!
//! The registry is filled once at start-up and then shared read-only
//! (typically behind an `Arc`). Persisted definitions find their connector
//! through it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::connectors::{GptConnector, SinkConnector};
use crate::error::{Direction, RegistryError};
use crate::model::EntityDefinition;
use crate::template::UiTemplate;
use crate::traits::{InputBroker, InputConnector, OutputBroker, OutputConnector};

#[derive(Default, Clone)]
pub struct ConnectorRegistry {
    inputs: HashMap<String, Arc<dyn InputConnector>>,
    outputs: HashMap<String, Arc<dyn OutputConnector>>,
}

impl ConnectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in connectors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.inputs.insert(
            crate::connectors::sink::TYPE.to_string(),
            Arc::new(SinkConnector),
        );
        registry.outputs.insert(
            crate::connectors::gpt::TYPE.to_string(),
            Arc::new(GptConnector),
        );
        registry
    }

    /// Registers a source connector under its type.
    ///
    /// # Errors
    ///
    /// Fails if an input connector of the same type is already registered.
    pub fn register_input(
        &mut self,
        connector: Arc<dyn InputConnector>,
    ) -> Result<(), RegistryError> {
        let connector_type = connector.connector_type().to_string();
        if self.inputs.contains_key(&connector_type) {
            return Err(RegistryError::DuplicateConnector {
                connector: connector_type,
                direction: Direction::Input,
            });
        }
        self.inputs.insert(connector_type, connector);
        Ok(())
    }

    /// Registers a destination connector under its type.
    pub fn register_output(
        &mut self,
        connector: Arc<dyn OutputConnector>,
    ) -> Result<(), RegistryError> {
        let connector_type = connector.connector_type().to_string();
        if self.outputs.contains_key(&connector_type) {
            return Err(RegistryError::DuplicateConnector {
                connector: connector_type,
                direction: Direction::Output,
            });
        }
        self.outputs.insert(connector_type, connector);
        Ok(())
    }

    pub fn input(&self, connector_type: &str) -> Option<&Arc<dyn InputConnector>> {
        self.inputs.get(connector_type)
    }

    pub fn output(&self, connector_type: &str) -> Option<&Arc<dyn OutputConnector>> {
        self.outputs.get(connector_type)
    }

    /// Builds a source broker with the connector named by `definition`.
    pub fn create_input_broker(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Box<dyn InputBroker>, RegistryError> {
        let connector = self.input(definition.connector_type()).ok_or_else(|| {
            RegistryError::UnknownConnector {
                connector: definition.connector_type().to_string(),
                direction: Direction::Input,
            }
        })?;
        Ok(connector.create_broker(definition)?)
    }

    /// Builds a destination broker with the connector named by `definition`.
    pub fn create_output_broker(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Box<dyn OutputBroker>, RegistryError> {
        let connector = self.output(definition.connector_type()).ok_or_else(|| {
            RegistryError::UnknownConnector {
                connector: definition.connector_type().to_string(),
                direction: Direction::Output,
            }
        })?;
        Ok(connector.create_broker(definition)?)
    }

    /// Sorted types of all registered connectors, de-duplicated across directions.
    pub fn registered_connectors(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .inputs
            .keys()
            .chain(self.outputs.keys())
            .cloned()
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Templates of the input connectors, sorted by type.
    pub fn input_templates(&self, locale: &str) -> Vec<UiTemplate> {
        let mut templates: Vec<UiTemplate> =
            self.inputs.values().map(|c| c.template(locale)).collect();
        templates.sort_by(|a, b| a.connector_type.cmp(&b.connector_type));
        templates
    }

    /// Templates of the output connectors, sorted by type.
    pub fn output_templates(&self, locale: &str) -> Vec<UiTemplate> {
        let mut templates: Vec<UiTemplate> =
            self.outputs.values().map(|c| c.template(locale)).collect();
        templates.sort_by(|a, b| a.connector_type.cmp(&b.connector_type));
        templates
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut inputs: Vec<&String> = self.inputs.keys().collect();
        let mut outputs: Vec<&String> = self.outputs.keys().collect();
        inputs.sort();
        outputs.sort();
        f.debug_struct("ConnectorRegistry")
            .field("inputs", &inputs)
            .field("outputs", &outputs)
            .finish()
    }
}
