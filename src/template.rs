//! UI description of connector arguments and localized labels.

use serde::{Deserialize, Serialize};

/// Describes a connector's configurable arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiTemplate {
    /// Connector type the template belongs to
    #[serde(rename = "type")]
    pub connector_type: String,

    /// Localized display name of the connector
    pub label: String,

    pub arguments: Vec<Argument>,
}

impl UiTemplate {
    pub fn new(
        connector_type: impl Into<String>,
        label: impl Into<String>,
        arguments: Vec<Argument>,
    ) -> Self {
        Self {
            connector_type: connector_type.into(),
            label: label.into(),
            arguments,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

/// One configurable argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// Definition property key
    pub name: String,
    pub label: String,
    pub required: bool,

    /// Input should be masked
    pub password: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: false,
            password: false,
            hint: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn password(mut self) -> Self {
        self.password = true;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Localization
// ============================================================================

const EN: &[(&str, &str)] = &[
    ("sink", "Drop folder"),
    ("sink.dropFolder", "Drop folder"),
    (
        "sink.hint",
        "Folder scanned for metadata files. Files are removed once published.",
    ),
    ("sink.recursive", "Include subfolders"),
    ("sink.maxFileSize", "Maximum file size (bytes)"),
    ("gpt", "Geoportal Server New Generation"),
    ("gpt.hostUrl", "URL"),
    ("gpt.userName", "User name"),
    ("gpt.userPassword", "User password"),
    ("gpt.index", "Index"),
];

const DE: &[(&str, &str)] = &[
    ("sink", "Ablageordner"),
    ("sink.dropFolder", "Ablageordner"),
    (
        "sink.hint",
        "Ordner mit Metadatendateien. Dateien werden nach der Veröffentlichung entfernt.",
    ),
    ("sink.recursive", "Unterordner einbeziehen"),
    ("gpt.userName", "Benutzername"),
    ("gpt.userPassword", "Passwort"),
];

/// Returns the message for `key` in `locale`.
///
/// Locales are matched on their primary language subtag (`de-AT` and
/// `de_DE` both use German). Unknown locales and keys missing from a
/// translation fall back to English; unknown keys return the key itself.
pub fn message<'a>(locale: &str, key: &'a str) -> &'a str {
    let language = locale
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let table = match language.as_str() {
        "de" => DE,
        _ => EN,
    };
    lookup(table, key)
        .or_else(|| lookup(EN, key))
        .unwrap_or(key)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
