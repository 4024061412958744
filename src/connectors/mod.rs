//! Built-in connectors.
//!
//! - [`sink`]: drop-folder source
//! - [`gpt`]: Geoportal Server catalog destination

pub mod gpt;
pub mod sink;

pub use gpt::{GptBroker, GptConnector};
pub use sink::{SinkBroker, SinkConnector};
