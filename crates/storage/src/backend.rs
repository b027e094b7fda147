//! File-backed persistence backend
//!
//! Implements the hierarchy persistence seam over an annotation sidecar.
//! Every mutation is prepared against a scratch copy, written out as one
//! file, and only then committed to memory, so the cascade batch lands
//! atomically from the caller's perspective.

use crate::sidecar::{load_annotations, save_annotations};
use crate::StorageError;
use annot_model::{Annotation, AnnotationDraft, AnnotationId};
use hierarchy::{BackendError, PersistBackend};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileBackend {
    pdf_path: PathBuf,
    records: HashMap<AnnotationId, Annotation>,
    next_id: u64,
}

impl FileBackend {
    /// Open the backend for a PDF, loading any existing sidecar.
    pub fn open(pdf_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let pdf_path = pdf_path.into();
        let annotations = load_annotations(&pdf_path)?;

        let next_id = annotations.iter().map(|a| a.id.0).max().unwrap_or(0);
        let records = annotations.into_iter().map(|a| (a.id, a)).collect();

        Ok(Self { pdf_path, records, next_id })
    }

    pub fn pdf_path(&self) -> &Path {
        &self.pdf_path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current record set, ordered by id.
    pub fn annotations(&self) -> Vec<&Annotation> {
        let mut annotations: Vec<&Annotation> = self.records.values().collect();
        annotations.sort_by_key(|a| a.id);
        annotations
    }

    fn commit(
        &mut self,
        records: HashMap<AnnotationId, Annotation>,
    ) -> Result<(), BackendError> {
        let set: Vec<Annotation> = records.values().cloned().collect();
        save_annotations(&self.pdf_path, &set)
            .map_err(|error| BackendError::new(error.to_string()))?;

        self.records = records;
        Ok(())
    }
}

impl PersistBackend for FileBackend {
    fn persist_insert(&mut self, draft: &AnnotationDraft) -> Result<AnnotationId, BackendError> {
        let id = AnnotationId(self.next_id + 1);

        let mut records = self.records.clone();
        records.insert(id, Annotation::from_draft(id, draft.clone()));

        self.commit(records)?;
        self.next_id = id.0;
        Ok(id)
    }

    fn persist_update(&mut self, annotation: &Annotation) -> Result<(), BackendError> {
        if !self.records.contains_key(&annotation.id) {
            return Err(BackendError::new(format!("unknown annotation {}", annotation.id)));
        }

        let mut records = self.records.clone();
        records.insert(annotation.id, annotation.clone());

        self.commit(records)
    }

    fn persist_delete(&mut self, ids: &[AnnotationId]) -> Result<usize, BackendError> {
        let mut records = self.records.clone();

        let mut removed = 0;
        for id in ids {
            if records.remove(id).is_some() {
                removed += 1;
            }
        }

        self.commit(records)?;
        Ok(removed)
    }
}
