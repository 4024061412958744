use std::path::{Path, PathBuf};

use crate::adaptor::DefinitionAdaptor;
use crate::error::InvalidDefinition;
use crate::model::EntityDefinition;

use super::{P_DROP_FOLDER, P_MAX_FILE_SIZE, P_RECURSIVE, TYPE};

/// Default upper bound on the size of a single harvested file (64 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Validated configuration of a drop-folder source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDefinition {
    definition: EntityDefinition,
    drop_folder: PathBuf,
    recursive: bool,
    max_file_size: u64,
}

impl SinkDefinition {
    /// Validates `definition`. The drop folder does not have to exist yet.
    pub fn new(definition: &EntityDefinition) -> Result<Self, InvalidDefinition> {
        let adaptor = DefinitionAdaptor::new(definition, TYPE)?;
        Ok(Self {
            drop_folder: adaptor.path(P_DROP_FOLDER)?,
            recursive: adaptor.flag(P_RECURSIVE, true)?,
            max_file_size: adaptor.number(P_MAX_FILE_SIZE, DEFAULT_MAX_FILE_SIZE)?,
            definition: definition.clone(),
        })
    }

    pub fn entity_definition(&self) -> &EntityDefinition {
        &self.definition
    }

    pub fn drop_folder(&self) -> &Path {
        &self.drop_folder
    }

    /// Whether subfolders of the drop folder are harvested too.
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}
