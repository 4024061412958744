//! Media types and file-extension lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A parsed `type/subtype` media type, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MimeType {
    essence: String,
    slash: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid media type: '{0}'")]
pub struct InvalidMimeType(pub String);

impl MimeType {
    pub fn primary(&self) -> &str {
        &self.essence[..self.slash]
    }

    pub fn subtype(&self) -> &str {
        &self.essence[self.slash + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.essence
    }

    /// Whether the payload is textual XML (`*/xml` or `*/*+xml`).
    pub fn is_xml(&self) -> bool {
        let sub = self.subtype();
        sub == "xml" || sub.ends_with("+xml")
    }

    /// Looks up the media type registered for a file extension.
    ///
    /// Matching is case-insensitive and ignores a leading dot.
    /// Returns `None` for unknown extensions.
    pub fn from_extension(ext: &str) -> Option<MimeType> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .and_then(|(_, m)| m.parse().ok())
    }

    /// Infers the media type of a file from its extension.
    pub fn from_path(path: &Path) -> Option<MimeType> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(MimeType::from_extension)
    }
}

impl FromStr for MimeType {
    type Err = InvalidMimeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Parameters such as `; charset=utf-8` are not part of the essence
        let essence = s.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        let slash = essence
            .find('/')
            .ok_or_else(|| InvalidMimeType(s.to_string()))?;
        let (primary, subtype) = (&essence[..slash], &essence[slash + 1..]);
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
        };
        if !valid(primary) || !valid(subtype) {
            return Err(InvalidMimeType(s.to_string()));
        }
        Ok(MimeType { essence, slash })
    }
}

impl TryFrom<String> for MimeType {
    type Error = InvalidMimeType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MimeType> for String {
    fn from(value: MimeType) -> Self {
        value.essence
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)
    }
}

const EXTENSIONS: &[(&str, &str)] = &[
    ("xml", "application/xml"),
    ("json", "application/json"),
    ("geojson", "application/geo+json"),
    ("pdf", "application/pdf"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("zip", "application/zip"),
    ("kml", "application/vnd.google-earth.kml+xml"),
    ("kmz", "application/vnd.google-earth.kmz"),
    ("gml", "application/gml+xml"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];
