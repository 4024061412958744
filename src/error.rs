//! Error taxonomy of the harvesting core.
//!
//! Errors are split by when they happen and what they abort:
//! - [`InvalidDefinition`]: broker construction, fatal to that broker
//! - [`BrokerError`]: fatal to the whole run of one broker
//! - [`RecordReadError`], [`DeliveryError`], [`CleanupError`]: one record only
//!
//! Every error names the broker (or connector) and the record it concerns.

use std::fmt;
use thiserror::Error;

use crate::model::BrokerUri;

// ============================================================================
// Configuration-time errors
// ============================================================================

/// A definition is missing a required key or a value fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid definition for connector '{connector}', key '{key}': {reason}")]
pub struct InvalidDefinition {
    /// Type of the connector that rejected the definition
    pub connector: String,

    /// Offending configuration key
    pub key: String,

    pub reason: String,
}

impl InvalidDefinition {
    pub fn new(
        connector: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            connector: connector.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Direction of a connector: records flow out of inputs and into outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Errors raised while routing a definition to its connector.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No {direction} connector registered for type '{connector}'")]
    UnknownConnector {
        connector: String,
        direction: Direction,
    },

    #[error("A {direction} connector of type '{connector}' is already registered")]
    DuplicateConnector {
        connector: String,
        direction: Direction,
    },

    #[error(transparent)]
    InvalidDefinition(#[from] InvalidDefinition),
}

// ============================================================================
// Run-level errors
// ============================================================================

/// Errors that abort a whole run of one broker.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The configured root cannot be accessed at all
    #[error("{broker}: root '{path}' is inaccessible: {source}")]
    RootInaccessible {
        broker: BrokerUri,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured root exists but is not a directory
    #[error("{broker}: root '{path}' is not a directory")]
    NotADirectory { broker: BrokerUri, path: String },
}

// ============================================================================
// Per-record errors
// ============================================================================

/// A record could not be enumerated or its content could not be read.
#[derive(Error, Debug)]
#[error("Failed to read record '{record}' from {broker}: {kind}")]
pub struct RecordReadError {
    pub broker: BrokerUri,

    /// Record identifier (path for file sources)
    pub record: String,

    #[source]
    pub kind: ReadErrorKind,
}

#[derive(Error, Debug)]
pub enum ReadErrorKind {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("content exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("cannot express '{0}' as a URI")]
    InvalidOrigin(String),

    /// The reference was produced by another broker
    #[error("record belongs to {0}")]
    ForeignRecord(BrokerUri),

    /// The record path resolves outside the broker's root
    #[error("record is outside of the configured root")]
    OutsideRoot,
}

/// A record was not accepted by a destination.
#[derive(Error, Debug)]
#[error("Failed to deliver record '{record}' to {broker}: {kind}")]
pub struct DeliveryError {
    pub broker: BrokerUri,
    pub record: String,

    #[source]
    pub kind: DeliveryErrorKind,
}

#[derive(Error, Debug)]
pub enum DeliveryErrorKind {
    /// The destination answered and refused the record
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The destination could not be reached or the exchange broke off
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timed out after {0}s")]
    Timeout(u64),

    /// The record cannot be expressed in the destination's format
    #[error("unsupported record: {0}")]
    Unsupported(String),
}

/// Removing a delivered record from its source failed.
///
/// Delivery already succeeded; this never invalidates the delivered record.
#[derive(Error, Debug)]
#[error("Failed to clean up record '{record}' in {broker}: {kind}")]
pub struct CleanupError {
    pub broker: BrokerUri,
    pub record: String,

    #[source]
    pub kind: CleanupErrorKind,
}

#[derive(Error, Debug)]
pub enum CleanupErrorKind {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reference was produced by another broker
    #[error("record belongs to {0}")]
    ForeignRecord(BrokerUri),

    /// The record path resolves outside the broker's root
    #[error("record is outside of the configured root")]
    OutsideRoot,
}

// ============================================================================
// Crate-level error
// ============================================================================

/// Any error of the harvesting core, for hosts that handle them uniformly.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    InvalidDefinition(#[from] InvalidDefinition),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    RecordRead(#[from] RecordReadError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A blocking broker operation panicked or was aborted
    #[error("Harvest worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Harvest executor is shut down")]
    ExecutorClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_definition_names_key() {
        let err = InvalidDefinition::new("SINK", "sink-drop-folder", "is required");
        assert_eq!(
            err.to_string(),
            "Invalid definition for connector 'SINK', key 'sink-drop-folder': is required"
        );
    }

    #[test]
    fn test_record_error_carries_context() {
        let err = RecordReadError {
            broker: BrokerUri::new("SINK", "/drop"),
            record: "/drop/a.xml".to_string(),
            kind: ReadErrorKind::TooLarge { limit: 10 },
        };
        let msg = err.to_string();
        assert!(msg.contains("SINK:/drop"));
        assert!(msg.contains("/drop/a.xml"));
        assert!(msg.contains("10 bytes"));
    }

    #[test]
    fn test_unknown_connector_message() {
        let err = RegistryError::UnknownConnector {
            connector: "CSW".to_string(),
            direction: Direction::Input,
        };
        assert_eq!(err.to_string(), "No input connector registered for type 'CSW'");
    }
}
