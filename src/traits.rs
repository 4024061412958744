//! Connector and broker contracts.
//!
//! A [`Connector`] is a process-wide factory identified by its type string.
//! It validates an [`EntityDefinition`] and builds a broker bound to it:
//! - [`InputBroker`]: enumerates [`DataReference`]s, loads their content and
//!   removes them once delivered
//! - [`OutputBroker`]: publishes one record at a time
//!
//! Brokers never log and never retry; they return typed errors and leave
//! policy to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{
    BrokerError, CleanupError, DeliveryError, InvalidDefinition, RecordReadError,
};
use crate::model::{BrokerUri, Content, DataReference, EntityDefinition, IteratorContext};
use crate::template::UiTemplate;

// ============================================================================
// Connectors
// ============================================================================

/// Factory shared by all runs of one kind of source or destination.
pub trait Connector: Send + Sync {
    /// Returns the globally unique type identifier (e.g. `"SINK"`).
    ///
    /// Persisted definitions carry this value to find their connector again.
    fn connector_type(&self) -> &str;

    /// Describes the configurable arguments for UI generation.
    ///
    /// Purely descriptive; validation happens in `create_broker`.
    fn template(&self, locale: &str) -> UiTemplate;
}

/// Connector for sources of records.
pub trait InputConnector: Connector {
    /// Validates `definition` and builds a source broker.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDefinition`] before any I/O is attempted if a
    /// required key is missing or a value is malformed.
    fn create_broker(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Box<dyn InputBroker>, InvalidDefinition>;
}

/// Connector for destinations of records.
pub trait OutputConnector: Connector {
    /// Validates `definition`, builds the transport and returns a destination
    /// broker.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDefinition`] if the definition is malformed or the
    /// transport cannot be configured from it.
    fn create_broker(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Box<dyn OutputBroker>, InvalidDefinition>;
}

// ============================================================================
// Brokers
// ============================================================================

/// Live handle bound to one validated definition.
///
/// A broker is used by one harvest task at a time. Brokers built from
/// different definitions share no state.
pub trait Broker: Send + Sync {
    /// Identifies this configured broker in produced records and errors.
    fn broker_uri(&self) -> &BrokerUri;

    /// Type of the connector that built this broker.
    fn connector_type(&self) -> &str;

    /// Definition this broker was built from.
    fn entity_definition(&self) -> &EntityDefinition;
}

/// Lazy, finite and non-restartable sequence of records of one run.
///
/// Per-record failures are items of the sequence; they never end it.
pub type RecordIterator = Box<dyn Iterator<Item = Result<DataReference, RecordReadError>> + Send>;

/// Source side of a harvest.
///
/// All operations block on I/O.
pub trait InputBroker: Broker {
    /// Starts enumerating the records currently available.
    ///
    /// Each call discovers records anew. Dropping the iterator at any point
    /// releases everything it holds.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the source is unusable as a whole.
    fn iterate(&self, context: &IteratorContext) -> Result<RecordIterator, BrokerError>;

    /// Reads the payload of a record produced by [`iterate`](Self::iterate).
    fn load_content(&self, reference: &DataReference) -> Result<Content, RecordReadError>;

    /// Removes a record from the source after it has been delivered.
    fn delete(&self, reference: &DataReference) -> Result<(), CleanupError>;
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    /// The destination did not know the record before
    Created,

    /// The destination replaced an existing record
    Updated,
}

/// Destination side of a harvest.
#[async_trait]
pub trait OutputBroker: Broker {
    /// Delivers one record. Makes a single attempt.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the destination rejected the record or
    /// could not be reached.
    async fn publish(
        &self,
        reference: &DataReference,
        content: &Content,
    ) -> Result<PublishingStatus, DeliveryError>;
}
