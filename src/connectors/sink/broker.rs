use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{
    BrokerError, CleanupError, CleanupErrorKind, ReadErrorKind, RecordReadError,
};
use crate::model::{BrokerUri, Content, DataReference, EntityDefinition, IteratorContext};
use crate::traits::{Broker, InputBroker, RecordIterator};

use super::file::SinkFile;
use super::{SinkDefinition, TYPE};

/// Source broker over a drop folder.
///
/// Regular files under the folder become records; symbolic links are not
/// followed. Enumeration is sorted by file name at every level, so an
/// unchanged folder always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SinkBroker {
    uri: BrokerUri,
    definition: SinkDefinition,
}

impl SinkBroker {
    pub(crate) fn new(definition: SinkDefinition) -> Self {
        Self {
            uri: BrokerUri::new(TYPE, definition.drop_folder().display()),
            definition,
        }
    }

    pub fn definition(&self) -> &SinkDefinition {
        &self.definition
    }

    /// Resolves the drop folder, failing if it is unusable.
    fn root(&self) -> Result<PathBuf, BrokerError> {
        let folder = self.definition.drop_folder();
        let inaccessible = |source| BrokerError::RootInaccessible {
            broker: self.uri.clone(),
            path: folder.display().to_string(),
            source,
        };
        let metadata = fs::metadata(folder).map_err(inaccessible)?;
        if !metadata.is_dir() {
            return Err(BrokerError::NotADirectory {
                broker: self.uri.clone(),
                path: folder.display().to_string(),
            });
        }
        let root = fs::canonicalize(folder).map_err(inaccessible)?;
        fs::read_dir(&root).map_err(inaccessible)?;
        Ok(root)
    }

    /// Path of a record of this broker, if it lies inside `root`.
    fn owned_path(&self, reference: &DataReference, root: &Path) -> Option<PathBuf> {
        let path = PathBuf::from(&reference.id);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.is_absolute() || !path.starts_with(root) || path == root {
            return None;
        }
        Some(path)
    }
}

impl Broker for SinkBroker {
    fn broker_uri(&self) -> &BrokerUri {
        &self.uri
    }

    fn connector_type(&self) -> &str {
        TYPE
    }

    fn entity_definition(&self) -> &EntityDefinition {
        self.definition.entity_definition()
    }
}

impl InputBroker for SinkBroker {
    fn iterate(&self, context: &IteratorContext) -> Result<RecordIterator, BrokerError> {
        let root = self.root()?;
        let mut walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        if !self.definition.recursive() {
            walker = walker.max_depth(1);
        }

        let uri = self.uri.clone();
        let label = self.entity_definition().label().to_string();
        let context = context.clone();

        let records = walker.into_iter().filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => {
                Some(SinkFile::new(&uri, entry.path()).reference(&label, &context))
            }
            Ok(_) => None,
            Err(err) => {
                let record = err
                    .path()
                    .unwrap_or(root.as_path())
                    .display()
                    .to_string();
                Some(Err(RecordReadError {
                    broker: uri.clone(),
                    record,
                    kind: ReadErrorKind::Walk(err),
                }))
            }
        });
        Ok(Box::new(records.fuse()))
    }

    fn load_content(&self, reference: &DataReference) -> Result<Content, RecordReadError> {
        let read_error = |kind| RecordReadError {
            broker: self.uri.clone(),
            record: reference.id.clone(),
            kind,
        };
        if reference.broker_uri != self.uri {
            return Err(read_error(ReadErrorKind::ForeignRecord(
                reference.broker_uri.clone(),
            )));
        }
        let root = fs::canonicalize(self.definition.drop_folder())
            .map_err(|e| read_error(ReadErrorKind::Io(e)))?;
        let path = self
            .owned_path(reference, &root)
            .ok_or_else(|| read_error(ReadErrorKind::OutsideRoot))?;
        SinkFile::new(&self.uri, path).read_content(self.definition.max_file_size())
    }

    fn delete(&self, reference: &DataReference) -> Result<(), CleanupError> {
        let cleanup_error = |kind| CleanupError {
            broker: self.uri.clone(),
            record: reference.id.clone(),
            kind,
        };
        if reference.broker_uri != self.uri {
            return Err(cleanup_error(CleanupErrorKind::ForeignRecord(
                reference.broker_uri.clone(),
            )));
        }
        let root = fs::canonicalize(self.definition.drop_folder())
            .map_err(|e| cleanup_error(CleanupErrorKind::Io(e)))?;
        let path = self
            .owned_path(reference, &root)
            .ok_or_else(|| cleanup_error(CleanupErrorKind::OutsideRoot))?;
        SinkFile::new(&self.uri, path).delete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::sink::{P_DROP_FOLDER, P_RECURSIVE};
    use tempfile::tempdir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    /// Removes all permissions from `dir`.
    ///
    /// Returns `false` when the process can still list it (e.g. running as
    /// root), in which case permission tests have nothing to check.
    #[cfg(unix)]
    fn lock(dir: &Path) -> bool {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(dir).is_ok() {
            unlock(dir);
            return false;
        }
        true
    }

    #[cfg(unix)]
    fn unlock(dir: &Path) {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn broker(folder: &Path, recursive: bool) -> SinkBroker {
        let def = EntityDefinition::new(TYPE, "drop")
            .with_property(P_DROP_FOLDER, folder.display().to_string())
            .with_property(P_RECURSIVE, recursive.to_string());
        SinkBroker::new(SinkDefinition::new(&def).unwrap())
    }

    fn ids(broker: &SinkBroker) -> Vec<String> {
        broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .map(|r| r.unwrap().id)
            .collect()
    }

    #[test]
    fn test_enumeration_is_sorted_and_stable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.xml"), b"<b/>").unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.json"), b"{}").unwrap();

        let broker = broker(dir.path(), true);
        let first = ids(&broker);
        let root = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(
            first,
            vec![
                root.join("a.xml").display().to_string(),
                root.join("b.xml").display().to_string(),
                root.join("sub").join("c.json").display().to_string(),
            ]
        );
        assert_eq!(ids(&broker), first);
    }

    #[test]
    fn test_non_recursive_skips_subfolders() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.xml"), b"<c/>").unwrap();

        assert_eq!(ids(&broker(dir.path(), false)).len(), 1);
    }

    #[test]
    fn test_reference_provenance() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        let broker = broker(dir.path(), true);
        let context = IteratorContext::new("task-7");

        let reference = broker.iterate(&context).unwrap().next().unwrap().unwrap();
        assert_eq!(&reference.broker_uri, broker.broker_uri());
        assert_eq!(reference.label, "drop");
        assert_eq!(reference.task_id, "task-7");
        assert_eq!(reference.run_id, context.run_id);
        assert_eq!(reference.origin.scheme(), "file");
    }

    #[test]
    fn test_missing_root_fails_run() {
        let dir = tempdir().unwrap();
        let broker = broker(&dir.path().join("absent"), true);
        let err = broker.iterate(&IteratorContext::new("task")).err().unwrap();
        assert!(matches!(err, BrokerError::RootInaccessible { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_fails_run() {
        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("a.xml"), b"<a/>").unwrap();
        if !lock(&locked) {
            return;
        }

        let result = broker(&locked, true).iterate(&IteratorContext::new("task"));
        unlock(&locked);
        assert!(matches!(
            result.err().unwrap(),
            BrokerError::RootInaccessible { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subfolder_is_a_record_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        let locked = dir.path().join("b");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.xml"), b"<h/>").unwrap();
        fs::write(dir.path().join("c.xml"), b"<c/>").unwrap();
        if !lock(&locked) {
            return;
        }

        let results: Vec<_> = broker(dir.path(), true)
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .collect();
        unlock(&locked);

        let root = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap().id,
            root.join("a.xml").display().to_string()
        );
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::Walk(_)));
        assert_eq!(err.record, root.join("b").display().to_string());
        assert_eq!(
            results[2].as_ref().unwrap().id,
            root.join("c.xml").display().to_string()
        );
    }

    #[test]
    fn test_file_root_fails_run() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        let err = broker(&file, true)
            .iterate(&IteratorContext::new("task"))
            .err()
            .unwrap();
        assert!(matches!(err, BrokerError::NotADirectory { .. }));
    }

    #[test]
    fn test_unknown_extension_still_loads() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("record.qqq"), b"payload").unwrap();
        let broker = broker(dir.path(), true);

        let reference = broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        let content = broker.load_content(&reference).unwrap();
        assert!(content.media_type.is_none());
        assert_eq!(content.bytes, b"payload");
    }

    #[test]
    fn test_vanished_file_is_a_record_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        fs::write(dir.path().join("b.xml"), b"<b/>").unwrap();
        let broker = broker(dir.path(), true);

        let references: Vec<_> = broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        fs::remove_file(&references[0].id).unwrap();

        let err = broker.load_content(&references[0]).unwrap_err();
        assert_eq!(err.record, references[0].id);
        assert!(matches!(err.kind, ReadErrorKind::Io(_)));
        assert_eq!(broker.load_content(&references[1]).unwrap().bytes, b"<b/>");
    }

    #[test]
    fn test_delete_removes_record() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        fs::write(dir.path().join("b.xml"), b"<b/>").unwrap();
        let broker = broker(dir.path(), true);

        let first = broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        broker.delete(&first).unwrap();

        assert!(!Path::new(&first.id).exists());
        let remaining = ids(&broker);
        assert_eq!(remaining.len(), 1);
        assert!(!remaining.contains(&first.id));
    }

    #[test]
    fn test_delete_refuses_foreign_and_escaping_records() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        let broker = broker(dir.path(), true);
        let mut reference = broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        let mut foreign = reference.clone();
        foreign.broker_uri = BrokerUri::new(TYPE, "/elsewhere");
        let err = broker.delete(&foreign).unwrap_err();
        assert!(matches!(err.kind, CleanupErrorKind::ForeignRecord(_)));

        reference.id = format!("{}/../outside.xml", dir.path().display());
        let err = broker.delete(&reference).unwrap_err();
        assert!(matches!(err.kind, CleanupErrorKind::OutsideRoot));
        assert!(dir.path().join("a.xml").exists());
    }

    #[test]
    fn test_load_refuses_foreign_and_escaping_records() {
        let dir = tempdir().unwrap();
        let drop = dir.path().join("drop");
        fs::create_dir(&drop).unwrap();
        fs::write(drop.join("a.xml"), b"<a/>").unwrap();
        fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        let broker = broker(&drop, true);
        let mut reference = broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        let mut foreign = reference.clone();
        foreign.broker_uri = BrokerUri::new(TYPE, "/elsewhere");
        let err = broker.load_content(&foreign).unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::ForeignRecord(_)));

        reference.id = format!("{}/../secret.txt", drop.display());
        let err = broker.load_content(&reference).unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::OutsideRoot));

        reference.id = fs::canonicalize(dir.path().join("secret.txt"))
            .unwrap()
            .display()
            .to_string();
        let err = broker.load_content(&reference).unwrap_err();
        assert!(matches!(err.kind, ReadErrorKind::OutsideRoot));
    }

    #[test]
    fn test_delete_of_missing_file_is_cleanup_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), b"<a/>").unwrap();
        let broker = broker(dir.path(), true);
        let reference = broker
            .iterate(&IteratorContext::new("task"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        fs::remove_file(&reference.id).unwrap();

        let err = broker.delete(&reference).unwrap_err();
        assert!(matches!(err.kind, CleanupErrorKind::Io(_)));
        assert_eq!(err.record, reference.id);
    }
}
