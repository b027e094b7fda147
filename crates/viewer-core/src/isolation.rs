//! Isolation mode
//!
//! Entering an annotation hides everything on the page except the target,
//! its ancestors and its descendants. Re-entering on another node recomputes
//! from scratch; there is no isolation stack.

use annot_model::{AnnotationId, AnnotationKind, ViewBinding};
use hierarchy::{HierarchyError, HierarchyStore};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IsolationError {
    #[error("cannot isolate a {0} annotation")]
    NotIsolatable(AnnotationKind),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// Per-session view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Normal,
    Isolated {
        target: AnnotationId,
        level: AnnotationKind,
    },
}

/// Visible/hidden membership for the current page, plus the resolved
/// highlight path while isolated.
///
/// Membership is a function of selection only; scroll and zoom never change
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleSet {
    pub visible: BTreeSet<AnnotationId>,
    pub hidden: BTreeSet<AnnotationId>,
    pub path: Vec<AnnotationId>,
}

impl VisibleSet {
    pub fn is_visible(&self, id: AnnotationId) -> bool {
        self.visible.contains(&id)
    }
}

/// A viewing session over one document page.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSession {
    state: ViewState,
    page: u32,
    view: Option<ViewBinding>,
    normal_depth_cap: Option<u8>,
}

impl ViewSession {
    pub fn new(page: u32) -> Self {
        Self {
            state: ViewState::Normal,
            page,
            view: None,
            normal_depth_cap: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self.state, ViewState::Isolated { .. })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    /// Bind the session to one drawing view; annotations bound to another
    /// view are hidden in every state.
    pub fn set_view(&mut self, view: Option<ViewBinding>) {
        self.view = view;
    }

    /// Hide kinds deeper than `depth` while in normal mode. `None` shows
    /// everything (the default); `Some(1)` reproduces the legacy viewer,
    /// which kept cabinet runs and cabinets for isolation only.
    pub fn set_normal_depth_cap(&mut self, cap: Option<u8>) {
        self.normal_depth_cap = cap;
    }

    /// Enter isolation on `target` (double-click gesture).
    ///
    /// Rooms, locations and cabinet runs are isolation levels; cabinets are
    /// leaves and are rejected. A target whose ancestor chain is broken
    /// cannot be isolated; the session stays in (or falls back to) normal
    /// mode and the corruption is surfaced to the caller.
    pub fn isolate(
        &mut self,
        store: &HierarchyStore,
        target: AnnotationId,
    ) -> Result<VisibleSet, IsolationError> {
        let annotation = store
            .get(target)
            .ok_or(HierarchyError::NotFound(target))?;

        if annotation.kind == AnnotationKind::Cabinet {
            return Err(IsolationError::NotIsolatable(AnnotationKind::Cabinet));
        }

        if let Err(error) = store.path_to(target) {
            tracing::warn!(id = %target, %error, "isolation target unresolvable, staying in normal mode");
            self.state = ViewState::Normal;
            return Err(error.into());
        }

        self.state = ViewState::Isolated {
            target,
            level: annotation.kind,
        };

        Ok(self.visible_set(store))
    }

    /// Explicit exit back to normal mode.
    pub fn exit_isolation(&mut self) {
        self.state = ViewState::Normal;
    }

    /// Recompute membership for the current page.
    ///
    /// While isolated, a broken ancestor chain (data corruption since entry)
    /// falls back to normal mode with a warning rather than leaving the
    /// viewer empty.
    pub fn visible_set(&mut self, store: &HierarchyStore) -> VisibleSet {
        match self.state {
            ViewState::Normal => self.normal_set(store),
            ViewState::Isolated { target, .. } => match self.isolated_set(store, target) {
                Ok(set) => set,
                Err(error) => {
                    tracing::warn!(id = %target, %error, "isolation fell back to normal mode");
                    self.state = ViewState::Normal;
                    self.normal_set(store)
                }
            },
        }
    }

    fn admits(&self, bound: Option<&ViewBinding>) -> bool {
        match &self.view {
            Some(view) => view.admits(bound),
            None => true,
        }
    }

    fn normal_set(&self, store: &HierarchyStore) -> VisibleSet {
        let mut set = VisibleSet::default();

        for annotation in store.page_annotations(self.page) {
            let capped = self
                .normal_depth_cap
                .is_some_and(|cap| annotation.kind.depth() > cap);

            if !capped && self.admits(annotation.view.as_ref()) {
                set.visible.insert(annotation.id);
            } else {
                set.hidden.insert(annotation.id);
            }
        }

        set
    }

    fn isolated_set(
        &self,
        store: &HierarchyStore,
        target: AnnotationId,
    ) -> Result<VisibleSet, HierarchyError> {
        let path = store.path_to(target)?;

        let mut closure: BTreeSet<AnnotationId> = path.iter().copied().collect();
        closure.extend(store.cascade_set(target)?);

        let mut set = VisibleSet {
            path: path.clone(),
            ..VisibleSet::default()
        };

        for annotation in store.page_annotations(self.page) {
            if closure.contains(&annotation.id) && self.admits(annotation.view.as_ref()) {
                set.visible.insert(annotation.id);
            } else {
                set.hidden.insert(annotation.id);
            }
        }

        // Ancestors drawn on other pages stay part of the visible context.
        for id in path {
            set.visible.insert(id);
            set.hidden.remove(&id);
        }

        Ok(set)
    }
}
