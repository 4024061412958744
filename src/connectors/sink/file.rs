//! A single file in the drop folder.

use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;
use url::Url;

use crate::error::{CleanupError, CleanupErrorKind, ReadErrorKind, RecordReadError};
use crate::mime::MimeType;
use crate::model::{BrokerUri, Content, DataReference, IteratorContext};

pub(crate) struct SinkFile<'a> {
    broker: &'a BrokerUri,
    path: PathBuf,
}

impl<'a> SinkFile<'a> {
    pub(crate) fn new(broker: &'a BrokerUri, path: impl Into<PathBuf>) -> Self {
        Self {
            broker,
            path: path.into(),
        }
    }

    /// Builds the reference of this file without reading its content.
    pub(crate) fn reference(
        &self,
        label: &str,
        context: &IteratorContext,
    ) -> Result<DataReference, RecordReadError> {
        let last_modified = self.read_last_modified()?;
        let origin = Url::from_file_path(&self.path)
            .map_err(|_| self.read_error(ReadErrorKind::InvalidOrigin(self.id())))?;
        Ok(DataReference {
            broker_uri: self.broker.clone(),
            label: label.to_string(),
            id: self.id(),
            last_modified,
            origin,
            task_id: context.task_id.clone(),
            run_id: context.run_id,
        })
    }

    /// Reads at most `limit` bytes of content.
    ///
    /// The file handle is released when this returns, on every path.
    pub(crate) fn read_content(&self, limit: u64) -> Result<Content, RecordReadError> {
        let file = File::open(&self.path).map_err(|e| self.read_error(e.into()))?;
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| self.read_error(e.into()))?;
        if bytes.len() as u64 > limit {
            return Err(self.read_error(ReadErrorKind::TooLarge { limit }));
        }
        Ok(Content::new(self.content_type(), bytes))
    }

    pub(crate) fn delete(&self) -> Result<(), CleanupError> {
        fs::remove_file(&self.path).map_err(|e| CleanupError {
            broker: self.broker.clone(),
            record: self.id(),
            kind: CleanupErrorKind::Io(e),
        })
    }

    fn read_last_modified(&self) -> Result<DateTime<Utc>, RecordReadError> {
        let modified = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| self.read_error(e.into()))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    /// `None` when the extension is missing or unknown.
    fn content_type(&self) -> Option<MimeType> {
        MimeType::from_path(&self.path)
    }

    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn read_error(&self, kind: ReadErrorKind) -> RecordReadError {
        RecordReadError {
            broker: self.broker.clone(),
            record: self.id(),
            kind,
        }
    }
}
