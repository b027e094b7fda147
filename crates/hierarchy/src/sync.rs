//! Persistence seam
//!
//! Mutations are a network round trip to an external store and can fail
//! independently of in-memory state. [`SyncedHierarchy`] commits to the
//! backend before touching the local tree, so a failed persist leaves the
//! tree exactly as it was and the kind/parent invariants intact.

use crate::error::{BackendError, HierarchyError, HierarchyResult};
use crate::store::HierarchyStore;
use annot_model::{Annotation, AnnotationDraft, AnnotationId, PageRect};
use std::collections::HashMap;

/// External annotation store. Id assignment happens here on insert; cascade
/// deletes arrive as one id batch so the store can apply them atomically.
pub trait PersistBackend {
    fn persist_insert(&mut self, draft: &AnnotationDraft) -> Result<AnnotationId, BackendError>;

    fn persist_update(&mut self, annotation: &Annotation) -> Result<(), BackendError>;

    /// Remove the batch and return how many records were removed.
    fn persist_delete(&mut self, ids: &[AnnotationId]) -> Result<usize, BackendError>;
}

/// A hierarchy store paired with its persistence backend.
///
/// Every mutation validates locally, persists, then applies locally.
#[derive(Debug)]
pub struct SyncedHierarchy<B> {
    store: HierarchyStore,
    backend: B,
}

impl<B: PersistBackend> SyncedHierarchy<B> {
    pub fn new(store: HierarchyStore, backend: B) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_parts(self) -> (HierarchyStore, B) {
        (self.store, self.backend)
    }

    pub fn insert(&mut self, draft: AnnotationDraft) -> HierarchyResult<Annotation> {
        self.store.check_draft(&draft)?;

        let id = self.backend.persist_insert(&draft)?;
        self.store.insert_persisted(id, draft)
    }

    pub fn delete(&mut self, id: AnnotationId) -> HierarchyResult<usize> {
        let doomed = self.store.cascade_set(id)?;

        let persisted = self.backend.persist_delete(&doomed)?;
        let removed = self.store.delete(id)?;

        if persisted != removed {
            tracing::warn!(
                %id,
                persisted,
                removed,
                "backend cascade count disagrees with local tree"
            );
        }

        Ok(removed)
    }

    pub fn reparent(&mut self, id: AnnotationId, new_parent: AnnotationId) -> HierarchyResult<()> {
        self.store.check_reparent(id, new_parent)?;

        let mut updated = self
            .store
            .get(id)
            .cloned()
            .ok_or(HierarchyError::NotFound(id))?;
        updated.parent = Some(new_parent);

        self.backend.persist_update(&updated)?;
        self.store.reparent(id, new_parent)
    }

    pub fn update_rect(&mut self, id: AnnotationId, rect: PageRect) -> HierarchyResult<()> {
        let mut updated = self
            .store
            .get(id)
            .cloned()
            .ok_or(HierarchyError::NotFound(id))?;
        updated.rect = rect;

        self.backend.persist_update(&updated)?;
        self.store.update_rect(id, rect)
    }

    pub fn relabel(&mut self, id: AnnotationId, label: impl Into<String>) -> HierarchyResult<()> {
        let label = label.into();

        let mut updated = self
            .store
            .get(id)
            .cloned()
            .ok_or(HierarchyError::NotFound(id))?;
        updated.label = label.clone();

        self.backend.persist_update(&updated)?;
        self.store.relabel(id, label)
    }
}

/// In-memory reference backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: HashMap<AnnotationId, Annotation>,
    next_id: u64,
    fail_next: Option<String>,
    delete_batches: Vec<Vec<AnnotationId>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.records.get(&id)
    }

    /// Make the next call fail with `message`.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    /// Id batches received by `persist_delete`, oldest first.
    pub fn delete_batches(&self) -> &[Vec<AnnotationId>] {
        &self.delete_batches
    }

    fn take_failure(&mut self) -> Result<(), BackendError> {
        match self.fail_next.take() {
            Some(message) => Err(BackendError(message)),
            None => Ok(()),
        }
    }
}

impl PersistBackend for MemoryBackend {
    fn persist_insert(&mut self, draft: &AnnotationDraft) -> Result<AnnotationId, BackendError> {
        self.take_failure()?;

        self.next_id += 1;
        let id = AnnotationId(self.next_id);
        self.records.insert(id, Annotation::from_draft(id, draft.clone()));

        Ok(id)
    }

    fn persist_update(&mut self, annotation: &Annotation) -> Result<(), BackendError> {
        self.take_failure()?;

        if !self.records.contains_key(&annotation.id) {
            return Err(BackendError::new(format!("unknown annotation {}", annotation.id)));
        }
        self.records.insert(annotation.id, annotation.clone());

        Ok(())
    }

    fn persist_delete(&mut self, ids: &[AnnotationId]) -> Result<usize, BackendError> {
        self.take_failure()?;

        self.delete_batches.push(ids.to_vec());

        let mut removed = 0;
        for id in ids {
            if self.records.remove(id).is_some() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}
