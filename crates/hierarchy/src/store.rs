//! Authoritative annotation tree
//!
//! Flat parent-pointer records plus a lazily rebuilt id→children index.
//! Repeated upward/downward walks over the flat record set are the dominant
//! cost, so every downward traversal goes through the index and any mutation
//! invalidates it.

use crate::error::{HierarchyError, HierarchyResult};
use annot_model::{Annotation, AnnotationDraft, AnnotationId, AnnotationKind, PageRect};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};

type ChildrenIndex = HashMap<AnnotationId, Vec<AnnotationId>>;

#[derive(Debug, Default)]
pub struct HierarchyStore {
    records: HashMap<AnnotationId, Annotation>,
    children: RefCell<Option<ChildrenIndex>>,
    next_id: u64,
}

impl HierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records.
    ///
    /// Historical data may contain orphans; they are accepted here and left
    /// for [`HierarchyStore::repair_all`](crate::repair) to fix.
    pub fn from_records(records: Vec<Annotation>) -> Self {
        let next_id = records.iter().map(|a| a.id.0).max().unwrap_or(0);
        let records = records.into_iter().map(|a| (a.id, a)).collect();

        Self {
            records,
            children: RefCell::new(None),
            next_id,
        }
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

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.records.values()
    }

    /// All annotations drawn on a page, ordered by id.
    pub fn page_annotations(&self, page: u32) -> Vec<&Annotation> {
        let mut annotations: Vec<&Annotation> = self
            .records
            .values()
            .filter(|a| a.page_number == page)
            .collect();

        annotations.sort_by_key(|a| a.id);
        annotations
    }

    /// Validate a draft against the enclosing-kind rule without mutating.
    pub fn check_draft(&self, draft: &AnnotationDraft) -> HierarchyResult<()> {
        match (draft.kind.parent_kind(), draft.parent) {
            (None, None) => Ok(()),
            (None, Some(parent)) => Err(HierarchyError::InvalidParentKind {
                child: draft.kind,
                expected: None,
                found: self.records.get(&parent).map(|a| a.kind),
            }),
            (Some(expected), None) => Err(HierarchyError::InvalidParentKind {
                child: draft.kind,
                expected: Some(expected),
                found: None,
            }),
            (Some(expected), Some(parent)) => {
                let record = self
                    .records
                    .get(&parent)
                    .ok_or(HierarchyError::NotFound(parent))?;

                if record.kind == expected {
                    Ok(())
                } else {
                    Err(HierarchyError::InvalidParentKind {
                        child: draft.kind,
                        expected: Some(expected),
                        found: Some(record.kind),
                    })
                }
            }
        }
    }

    /// Insert a draft, assigning the next id.
    pub fn insert(&mut self, draft: AnnotationDraft) -> HierarchyResult<Annotation> {
        self.check_draft(&draft)?;

        self.next_id += 1;
        let annotation = Annotation::from_draft(AnnotationId(self.next_id), draft);
        self.records.insert(annotation.id, annotation.clone());
        self.invalidate_children();

        Ok(annotation)
    }

    /// Insert a draft under an id assigned by the persistence backend.
    pub fn insert_persisted(
        &mut self,
        id: AnnotationId,
        draft: AnnotationDraft,
    ) -> HierarchyResult<Annotation> {
        self.check_draft(&draft)?;

        if self.records.contains_key(&id) {
            return Err(HierarchyError::Backend(crate::error::BackendError::new(
                format!("backend assigned duplicate id {id}"),
            )));
        }

        self.next_id = self.next_id.max(id.0);
        let annotation = Annotation::from_draft(id, draft);
        self.records.insert(id, annotation.clone());
        self.invalidate_children();

        Ok(annotation)
    }

    /// Direct children of a node, ordered by id.
    pub fn children_of(&self, id: AnnotationId) -> Vec<AnnotationId> {
        self.with_children_index(|index| index.get(&id).cloned().unwrap_or_default())
    }

    /// Target plus all transitive descendants, in breadth-first order.
    ///
    /// This is the id set a cascading delete removes; callers submit it to the
    /// persistence backend as one batch so the cascade stays atomic.
    pub fn cascade_set(&self, id: AnnotationId) -> HierarchyResult<Vec<AnnotationId>> {
        if !self.records.contains_key(&id) {
            return Err(HierarchyError::NotFound(id));
        }

        let mut set = Vec::new();
        let mut frontier = VecDeque::from([id]);

        while let Some(current) = frontier.pop_front() {
            set.push(current);
            frontier.extend(self.children_of(current));
        }

        Ok(set)
    }

    /// Delete a node and all transitive descendants as one logical operation.
    ///
    /// Returns the count removed: 1 + |transitive descendants|.
    pub fn delete(&mut self, id: AnnotationId) -> HierarchyResult<usize> {
        let doomed = self.cascade_set(id)?;

        for id in &doomed {
            self.records.remove(id);
        }
        self.invalidate_children();

        tracing::debug!(%id, count = doomed.len(), "cascade delete");
        Ok(doomed.len())
    }

    /// Delete every annotation on a page together with its descendant closure.
    pub fn delete_page(&mut self, page: u32) -> usize {
        let on_page: Vec<AnnotationId> = self
            .records
            .values()
            .filter(|a| a.page_number == page)
            .map(|a| a.id)
            .collect();

        let mut doomed: BTreeSet<AnnotationId> = BTreeSet::new();
        for id in on_page {
            if doomed.contains(&id) {
                continue;
            }
            if let Ok(set) = self.cascade_set(id) {
                doomed.extend(set);
            }
        }

        for id in &doomed {
            self.records.remove(id);
        }
        if !doomed.is_empty() {
            self.invalidate_children();
            tracing::debug!(page, count = doomed.len(), "page delete");
        }

        doomed.len()
    }

    /// Validate a reparent without mutating.
    ///
    /// Cycle detection runs before the kind check so moving a node under its
    /// own descendant is reported as `CycleDetected`, not a kind mismatch.
    pub fn check_reparent(
        &self,
        id: AnnotationId,
        new_parent: AnnotationId,
    ) -> HierarchyResult<()> {
        let annotation = self.records.get(&id).ok_or(HierarchyError::NotFound(id))?;
        let parent = self
            .records
            .get(&new_parent)
            .ok_or(HierarchyError::NotFound(new_parent))?;

        if new_parent == id || self.cascade_set(id)?.contains(&new_parent) {
            return Err(HierarchyError::CycleDetected(id));
        }

        match annotation.kind.parent_kind() {
            Some(expected) if parent.kind == expected => Ok(()),
            expected => Err(HierarchyError::InvalidParentKind {
                child: annotation.kind,
                expected,
                found: Some(parent.kind),
            }),
        }
    }

    pub fn reparent(&mut self, id: AnnotationId, new_parent: AnnotationId) -> HierarchyResult<()> {
        self.check_reparent(id, new_parent)?;

        if let Some(annotation) = self.records.get_mut(&id) {
            annotation.parent = Some(new_parent);
        }
        self.invalidate_children();

        Ok(())
    }

    /// Geometry update from a drag or resize gesture.
    pub fn update_rect(&mut self, id: AnnotationId, rect: PageRect) -> HierarchyResult<()> {
        let annotation = self
            .records
            .get_mut(&id)
            .ok_or(HierarchyError::NotFound(id))?;
        annotation.rect = rect;
        Ok(())
    }

    pub fn relabel(&mut self, id: AnnotationId, label: impl Into<String>) -> HierarchyResult<()> {
        let annotation = self
            .records
            .get_mut(&id)
            .ok_or(HierarchyError::NotFound(id))?;
        annotation.label = label.into();
        Ok(())
    }

    /// Ordered ancestor chain from root to `id` inclusive.
    pub fn path_to(&self, id: AnnotationId) -> HierarchyResult<Vec<AnnotationId>> {
        let mut current = self.records.get(&id).ok_or(HierarchyError::NotFound(id))?;
        let mut path = vec![current.id];

        while let Some(parent_id) = current.parent {
            let parent = self
                .records
                .get(&parent_id)
                .ok_or(HierarchyError::BrokenChain {
                    at: current.id,
                    missing: parent_id,
                })?;
            path.push(parent.id);
            current = parent;
        }

        path.reverse();
        Ok(path)
    }

    /// Other drawings of the same logical entity: same kind, same entity ref.
    pub fn siblings_of(&self, id: AnnotationId) -> HierarchyResult<Vec<&Annotation>> {
        let annotation = self.records.get(&id).ok_or(HierarchyError::NotFound(id))?;

        let mut siblings: Vec<&Annotation> = self
            .records
            .values()
            .filter(|candidate| annotation.is_sibling_of(candidate))
            .collect();

        siblings.sort_by_key(|a| a.id);
        Ok(siblings)
    }

    /// Annotations of `kind` with no parent, ordered by id.
    ///
    /// Rooms are root level by design; calling this for `Room` lists every
    /// room, which the repair pass never does.
    pub fn find_orphans(&self, kind: AnnotationKind) -> Vec<&Annotation> {
        let mut orphans: Vec<&Annotation> = self
            .records
            .values()
            .filter(|a| a.kind == kind && a.parent.is_none())
            .collect();

        orphans.sort_by_key(|a| a.id);
        orphans
    }

    pub(crate) fn set_parent_unchecked(&mut self, id: AnnotationId, parent: AnnotationId) {
        if let Some(annotation) = self.records.get_mut(&id) {
            annotation.parent = Some(parent);
        }
        self.invalidate_children();
    }

    fn invalidate_children(&mut self) {
        *self.children.borrow_mut() = None;
    }

    fn with_children_index<R>(&self, f: impl FnOnce(&ChildrenIndex) -> R) -> R {
        let mut cache = self.children.borrow_mut();
        let index = cache.get_or_insert_with(|| {
            let mut index: ChildrenIndex = HashMap::new();
            for annotation in self.records.values() {
                if let Some(parent) = annotation.parent {
                    index.entry(parent).or_default().push(annotation.id);
                }
            }
            for ids in index.values_mut() {
                ids.sort();
            }
            index
        });

        f(index)
    }
}
