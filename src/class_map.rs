use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::label::CanonicalLabel;

/// Bidirectional mapping between canonical cell labels and detector class
/// ids. Ids are assigned densely from 0 in first-seen order and are never
/// reassigned or removed within a run.
///
/// One instance is shared by both source adapters behind a `Mutex`; the
/// persisted JSON file is the contract between annotation generation and
/// manifest generation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClassMap {
    pub id_to_label: Vec<CanonicalLabel>,
    pub label_to_id: HashMap<CanonicalLabel, usize>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the class id for `label`, registering it if unseen.
    pub fn get_id(&mut self, label: &CanonicalLabel) -> usize {
        if let Some(&id) = self.label_to_id.get(label) {
            return id;
        }
        let id = self.id_to_label.len();
        self.id_to_label.push(label.clone());
        self.label_to_id.insert(label.clone(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.id_to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_label.is_empty()
    }

    /// Write the mapping as pretty JSON, replacing any previous file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self).map_err(|source| ConvertError::ClassMapWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(file).map_err(|source| ConvertError::ClassMapParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
