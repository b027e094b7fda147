//! Path selection and active drawing context
//!
//! The ancestor chain of the selected node doubles as the "active context":
//! it decides which parent a newly drawn annotation attaches to, and it feeds
//! the breadcrumb trail the viewer shows while isolated.

use crate::error::{HierarchyError, HierarchyResult};
use crate::store::HierarchyStore;
use annot_model::{AnnotationId, AnnotationKind};

/// One node of a resolved ancestor chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub label: String,
    pub parent: Option<AnnotationId>,
}

/// The selected path, root first, carried explicitly through every draw and
/// isolate operation instead of living in global viewer state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionContext {
    entries: Vec<PathEntry>,
}

impl SelectionContext {
    /// No selection; only rooms can be drawn.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the ancestor chain of `id` into a context.
    pub fn from_selection(store: &HierarchyStore, id: AnnotationId) -> HierarchyResult<Self> {
        let path = store.path_to(id)?;

        let mut entries = Vec::with_capacity(path.len());
        for id in path {
            let annotation = store.get(id).ok_or(HierarchyError::NotFound(id))?;
            entries.push(PathEntry {
                id: annotation.id,
                kind: annotation.kind,
                label: annotation.label.clone(),
                parent: annotation.parent,
            });
        }

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// The deepest selected node; default parent for the next deeper kind.
    pub fn deepest(&self) -> Option<&PathEntry> {
        self.entries.last()
    }

    pub fn entry_of(&self, kind: AnnotationKind) -> Option<&PathEntry> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    /// Labels root→deepest, for the isolation breadcrumb trail.
    pub fn breadcrumbs(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    /// The parent a newly drawn annotation of `kind` receives.
    ///
    /// Drawing a kind already present in the path attaches *beside* that node
    /// (same parent), producing a sibling rather than nesting same-kind
    /// annotations. Otherwise the context must hold the enclosing kind.
    pub fn parent_for_draft(&self, kind: AnnotationKind) -> HierarchyResult<Option<AnnotationId>> {
        let Some(enclosing) = kind.parent_kind() else {
            // Rooms are root level whatever is selected.
            return Ok(None);
        };

        if let Some(matching) = self.entry_of(kind) {
            return match matching.parent {
                Some(parent) => Ok(Some(parent)),
                None => Err(HierarchyError::InvalidParentKind {
                    child: kind,
                    expected: Some(enclosing),
                    found: None,
                }),
            };
        }

        match self.entry_of(enclosing) {
            Some(entry) => Ok(Some(entry.id)),
            None => Err(HierarchyError::InvalidParentKind {
                child: kind,
                expected: Some(enclosing),
                found: self.deepest().map(|entry| entry.kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_model::{AnnotationDraft, PageRect};

    fn draft(kind: AnnotationKind, label: &str) -> AnnotationDraft {
        AnnotationDraft::new(kind, label, PageRect::new(0.0, 0.0, 50.0, 50.0), 1)
    }

    fn chain() -> (HierarchyStore, [AnnotationId; 3]) {
        let mut store = HierarchyStore::new();
        let room = store.insert(draft(AnnotationKind::Room, "Kitchen")).expect("room");
        let location = store
            .insert(draft(AnnotationKind::Location, "Sink Wall").with_parent(room.id))
            .expect("location");
        let run = store
            .insert(draft(AnnotationKind::CabinetRun, "Run 1").with_parent(location.id))
            .expect("run");

        (store, [room.id, location.id, run.id])
    }

    #[test]
    fn context_resolves_root_to_selection() {
        let (store, [room, location, run]) = chain();

        let context = SelectionContext::from_selection(&store, run).expect("context");
        let ids: Vec<AnnotationId> = context.entries().iter().map(|e| e.id).collect();

        assert_eq!(ids, vec![room, location, run]);
        assert_eq!(context.breadcrumbs(), vec!["Kitchen", "Sink Wall", "Run 1"]);
    }

    #[test]
    fn deepest_node_parents_the_next_deeper_kind() {
        let (store, [_, location, run]) = chain();

        let context = SelectionContext::from_selection(&store, location).expect("context");
        assert_eq!(
            context.parent_for_draft(AnnotationKind::CabinetRun).expect("parent"),
            Some(location)
        );

        let deeper = SelectionContext::from_selection(&store, run).expect("context");
        assert_eq!(
            deeper.parent_for_draft(AnnotationKind::Cabinet).expect("parent"),
            Some(run)
        );
    }

    #[test]
    fn drawing_an_active_kind_produces_a_sibling() {
        let (store, [room, location, _]) = chain();

        let context = SelectionContext::from_selection(&store, location).expect("context");
        let parent = context
            .parent_for_draft(AnnotationKind::Location)
            .expect("sibling parent");

        // Sibling of the active location, not its child.
        assert_eq!(parent, Some(room));
        assert_ne!(parent, Some(location));
    }

    #[test]
    fn rooms_never_take_a_parent() {
        let (store, [_, _, run]) = chain();

        let context = SelectionContext::from_selection(&store, run).expect("context");
        assert_eq!(context.parent_for_draft(AnnotationKind::Room).expect("parent"), None);

        assert_eq!(
            SelectionContext::empty().parent_for_draft(AnnotationKind::Room).expect("parent"),
            None
        );
    }

    #[test]
    fn missing_enclosing_kind_is_rejected() {
        let (store, [room, ..]) = chain();

        let context = SelectionContext::from_selection(&store, room).expect("context");
        let result = context.parent_for_draft(AnnotationKind::Cabinet);

        assert_eq!(
            result,
            Err(HierarchyError::InvalidParentKind {
                child: AnnotationKind::Cabinet,
                expected: Some(AnnotationKind::CabinetRun),
                found: Some(AnnotationKind::Room),
            })
        );
    }

    #[test]
    fn empty_context_rejects_non_room_drafts() {
        let result = SelectionContext::empty().parent_for_draft(AnnotationKind::Location);

        assert_eq!(
            result,
            Err(HierarchyError::InvalidParentKind {
                child: AnnotationKind::Location,
                expected: Some(AnnotationKind::Room),
                found: None,
            })
        );
    }
}
