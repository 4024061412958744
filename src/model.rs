//! Value types that flow between connectors, brokers and the host.
//!
//! - [`EntityDefinition`]: persisted configuration of one connector instance
//! - [`DataReference`]: provenance of one harvested record (no payload)
//! - [`Content`]: payload of a record, loaded on demand

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::mime::MimeType;

// ============================================================================
// Entity Definition
// ============================================================================

/// Persisted, typed configuration of one connector instance.
///
/// The `type` discriminator routes the definition back to the connector
/// that understands its properties. Definitions are built once and then
/// only read; adaptors project them into typed views.
///
/// # Example
///
/// ```
/// use harvest_connectors::EntityDefinition;
///
/// let def = EntityDefinition::new("SINK", "Incoming records")
///     .with_property("sink-drop-folder", "/var/harvest/drop");
/// assert_eq!(def.get("sink-drop-folder"), Some("/var/harvest/drop"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    #[serde(rename = "type")]
    connector_type: String,

    #[serde(default)]
    label: String,

    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl EntityDefinition {
    pub fn new(connector_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            connector_type: connector_type.into(),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property, replacing any previous value under the same key.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Identifier of the connector this definition belongs to.
    pub fn connector_type(&self) -> &str {
        &self.connector_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

// ============================================================================
// Broker identity and run context
// ============================================================================

/// Identifies the configured broker a record came from.
///
/// Rendered as `<TYPE>:<locator>`, e.g. `SINK:/var/harvest/drop`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrokerUri(String);

impl BrokerUri {
    pub fn new(connector_type: &str, locator: impl fmt::Display) -> Self {
        Self(format!("{}:{}", connector_type, locator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Connector type prefix of the URI.
    pub fn connector_type(&self) -> &str {
        self.0.split_once(':').map(|(t, _)| t).unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for BrokerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiers the host assigns to one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IteratorContext {
    /// Identifier of the harvesting task the source belongs to
    pub task_id: String,

    /// Identifier of this particular run of the task
    pub run_id: Uuid,
}

impl IteratorContext {
    /// Creates a context for a fresh run of `task_id`.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }
}

// ============================================================================
// Data Reference
// ============================================================================

/// Provenance-carrying handle to one harvested record.
///
/// A reference never carries the payload; call
/// [`InputBroker::load_content`](crate::InputBroker::load_content) to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReference {
    /// Broker that produced the record
    pub broker_uri: BrokerUri,

    /// Human-readable label of the source (the definition label)
    pub label: String,

    /// Stable identifier of the record within its source
    ///
    /// Absolute path for file sources, remote key for remote sources.
    pub id: String,

    /// Last modification time of the record at the source
    pub last_modified: DateTime<Utc>,

    /// Where the record originally lives
    pub origin: Url,

    /// Harvesting task identifier
    pub task_id: String,

    /// Harvest run identifier
    pub run_id: Uuid,
}

/// Payload of a record together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// `None` when the media type could not be determined
    pub media_type: Option<MimeType>,
    pub bytes: Vec<u8>,
}

impl Content {
    pub fn new(media_type: Option<MimeType>, bytes: Vec<u8>) -> Self {
        Self { media_type, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
