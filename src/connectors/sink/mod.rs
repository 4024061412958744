//! Drop-folder source.
//!
//! Files placed in a folder are harvested as records and removed once the
//! destination has accepted them.

mod adaptor;
mod broker;
mod file;

pub use adaptor::{SinkDefinition, DEFAULT_MAX_FILE_SIZE};
pub use broker::SinkBroker;

use crate::error::InvalidDefinition;
use crate::model::EntityDefinition;
use crate::template::{message, Argument, UiTemplate};
use crate::traits::{Connector, InputBroker, InputConnector};

pub const TYPE: &str = "SINK";

pub const P_DROP_FOLDER: &str = "sink-drop-folder";
pub const P_RECURSIVE: &str = "sink-recursive";
pub const P_MAX_FILE_SIZE: &str = "sink-max-file-size";

/// Connector building [`SinkBroker`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinkConnector;

impl SinkConnector {
    /// Typed variant of [`InputConnector::create_broker`].
    pub fn create(&self, definition: &EntityDefinition) -> Result<SinkBroker, InvalidDefinition> {
        Ok(SinkBroker::new(SinkDefinition::new(definition)?))
    }
}

impl Connector for SinkConnector {
    fn connector_type(&self) -> &str {
        TYPE
    }

    fn template(&self, locale: &str) -> UiTemplate {
        let arguments = vec![
            Argument::new(P_DROP_FOLDER, message(locale, "sink.dropFolder"))
                .required()
                .with_hint(message(locale, "sink.hint")),
            Argument::new(P_RECURSIVE, message(locale, "sink.recursive")),
            Argument::new(P_MAX_FILE_SIZE, message(locale, "sink.maxFileSize")),
        ];
        UiTemplate::new(TYPE, message(locale, "sink"), arguments)
    }
}

impl InputConnector for SinkConnector {
    fn create_broker(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Box<dyn InputBroker>, InvalidDefinition> {
        Ok(Box::new(self.create(definition)?))
    }
}
