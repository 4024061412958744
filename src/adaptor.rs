//! Validating accessors over an [`EntityDefinition`].
//!
//! Connector-specific adaptors (e.g. [`SinkDefinition`](crate::connectors::sink::SinkDefinition))
//! are built on top of [`DefinitionAdaptor`]; every accessor reports the
//! offending key in an [`InvalidDefinition`]. No accessor touches the
//! filesystem or the network.

use std::path::PathBuf;
use url::Url;

use crate::error::InvalidDefinition;
use crate::model::EntityDefinition;

/// Borrowed, read-only view over a definition owned by one connector type.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionAdaptor<'a> {
    definition: &'a EntityDefinition,
    connector: &'a str,
}

impl<'a> DefinitionAdaptor<'a> {
    /// Wraps `definition` for the connector `connector`.
    ///
    /// # Errors
    ///
    /// Fails on key `type` if the definition was made for another connector.
    pub fn new(
        definition: &'a EntityDefinition,
        connector: &'a str,
    ) -> Result<Self, InvalidDefinition> {
        if definition.connector_type() != connector {
            return Err(InvalidDefinition::new(
                connector,
                "type",
                format!("expected '{}', found '{}'", connector, definition.connector_type()),
            ));
        }
        Ok(Self {
            definition,
            connector,
        })
    }

    pub fn definition(&self) -> &'a EntityDefinition {
        self.definition
    }

    /// Builds an error for `key` attributed to this connector.
    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> InvalidDefinition {
        InvalidDefinition::new(self.connector, key, reason)
    }

    /// Trimmed value of `key`; blank values count as absent.
    pub fn optional(&self, key: &str) -> Option<&'a str> {
        self.definition
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, key: &str) -> Result<&'a str, InvalidDefinition> {
        self.optional(key)
            .ok_or_else(|| self.invalid(key, "is required"))
    }

    /// Required absolute `http`/`https` URL.
    pub fn url(&self, key: &str) -> Result<Url, InvalidDefinition> {
        let raw = self.required(key)?;
        let url = Url::parse(raw)
            .map_err(|e| self.invalid(key, format!("'{}' is not a valid URL: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(url),
            _ => Err(self.invalid(key, format!("'{}' is not an http(s) URL", raw))),
        }
    }

    /// Required filesystem path, checked syntactically only.
    pub fn path(&self, key: &str) -> Result<PathBuf, InvalidDefinition> {
        let raw = self.required(key)?;
        if raw.contains('\0') {
            return Err(self.invalid(key, "path contains a NUL byte"));
        }
        Ok(PathBuf::from(raw))
    }

    /// Optional boolean, `default` when absent.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool, InvalidDefinition> {
        match self.optional(key) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(self.invalid(key, format!("'{}' is not a boolean", v))),
            },
        }
    }

    /// Optional positive integer, `default` when absent.
    pub fn number(&self, key: &str, default: u64) -> Result<u64, InvalidDefinition> {
        match self.optional(key) {
            None => Ok(default),
            Some(v) => match v.parse::<u64>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(self.invalid(key, format!("'{}' is not a positive integer", v))),
            },
        }
    }
}
