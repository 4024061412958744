//! Connector and broker abstractions for harvesting metadata records.
//!
//! A [`Connector`] turns a persisted [`EntityDefinition`] into a live broker:
//! an [`InputBroker`] that enumerates [`DataReference`]s and loads their
//! [`Content`], or an [`OutputBroker`] that publishes records. The
//! [`HarvestExecutor`] moves records from one to the other, isolating
//! per-record failures.

pub mod adaptor;
pub mod config;
pub mod connectors;
pub mod error;
pub mod executor;
pub mod logging;
pub mod mime;
pub mod model;
pub mod registry;
pub mod template;
pub mod traits;

// Re-export common types for convenience
pub use adaptor::DefinitionAdaptor;
pub use config::{ConfigError, ExecutorConfig, HarvestConfig};
pub use error::*;
pub use executor::{HarvestExecutor, RecordFailure, RunReport};
pub use mime::MimeType;
pub use model::*;
pub use registry::ConnectorRegistry;
pub use template::{Argument, UiTemplate};
pub use traits::*;
