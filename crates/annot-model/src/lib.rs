//! Shop-drawing annotation data model
//!
//! Annotations are rectangles drawn over PDF shop drawings, arranged in a
//! fixed hierarchy: room → location → cabinet run → cabinet. Geometry is
//! stored in page-local document coordinates, never screen pixels.

use serde::{Deserialize, Serialize};

pub mod rect;
pub mod schedule;

pub use rect::PageRect;
pub use schedule::{write_schedule, ScheduleError};

/// Stable annotation identifier, assigned by the store on insert.
///
/// Ids are allocation-ordered: a higher id was created later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hierarchy level of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Room,
    Location,
    CabinetRun,
    Cabinet,
}

impl AnnotationKind {
    /// The kind a parent of this kind must have. `None` for `Room` (root level).
    pub fn parent_kind(self) -> Option<AnnotationKind> {
        match self {
            Self::Room => None,
            Self::Location => Some(Self::Room),
            Self::CabinetRun => Some(Self::Location),
            Self::Cabinet => Some(Self::CabinetRun),
        }
    }

    /// The kind of children this kind encloses. `None` for `Cabinet` (leaf level).
    pub fn child_kind(self) -> Option<AnnotationKind> {
        match self {
            Self::Room => Some(Self::Location),
            Self::Location => Some(Self::CabinetRun),
            Self::CabinetRun => Some(Self::Cabinet),
            Self::Cabinet => None,
        }
    }

    /// Tree depth: room = 0, location = 1, cabinet run = 2, cabinet = 3.
    pub fn depth(self) -> u8 {
        match self {
            Self::Room => 0,
            Self::Location => 1,
            Self::CabinetRun => 2,
            Self::Cabinet => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Location => "location",
            Self::CabinetRun => "cabinet_run",
            Self::Cabinet => "cabinet",
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the domain entity (room record, location record, cabinet-run
/// record) an annotation represents.
///
/// Two annotations of the same kind sharing an `EntityRef` are the same
/// logical object drawn on different pages. They stay distinct records and
/// share a parent; they never point at each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef(pub String);

impl EntityRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

/// Drawing view a page presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Plan,
    Elevation,
    Section,
}

/// Facing direction for elevation and section views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    North,
    South,
    East,
    West,
}

/// Binds an annotation (or a viewing session) to one drawing view.
///
/// An annotation with no binding is shown in every view. Orientation only
/// participates for elevation and section views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewBinding {
    pub kind: ViewKind,
    pub orientation: Option<Orientation>,
}

impl ViewBinding {
    pub fn new(kind: ViewKind) -> Self {
        Self { kind, orientation: None }
    }

    pub fn oriented(kind: ViewKind, orientation: Orientation) -> Self {
        Self { kind, orientation: Some(orientation) }
    }

    /// Whether an annotation bound to `bound` is visible while this binding is
    /// the session's current view.
    pub fn admits(&self, bound: Option<&ViewBinding>) -> bool {
        let Some(bound) = bound else {
            return true;
        };

        if bound.kind != self.kind {
            return false;
        }

        if matches!(self.kind, ViewKind::Elevation | ViewKind::Section) {
            if let (Some(session), Some(annotation)) = (self.orientation, bound.orientation) {
                return session == annotation;
            }
        }

        true
    }
}

/// A persisted annotation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub label: String,
    /// `None` only for rooms; every other kind attaches to the enclosing level.
    pub parent: Option<AnnotationId>,
    pub rect: PageRect,
    pub page_number: u32,
    pub entity_ref: Option<EntityRef>,
    pub view: Option<ViewBinding>,
}

impl Annotation {
    pub fn from_draft(id: AnnotationId, draft: AnnotationDraft) -> Self {
        Self {
            id,
            kind: draft.kind,
            label: draft.label,
            parent: draft.parent,
            rect: draft.rect,
            page_number: draft.page_number,
            entity_ref: draft.entity_ref,
            view: draft.view,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Same logical entity drawn elsewhere: same kind, same entity reference.
    pub fn is_sibling_of(&self, other: &Annotation) -> bool {
        if self.id == other.id || self.kind != other.kind {
            return false;
        }

        match (&self.entity_ref, &other.entity_ref) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// What the drawing tool submits before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDraft {
    pub kind: AnnotationKind,
    pub label: String,
    pub parent: Option<AnnotationId>,
    pub rect: PageRect,
    pub page_number: u32,
    pub entity_ref: Option<EntityRef>,
    pub view: Option<ViewBinding>,
}

impl AnnotationDraft {
    pub fn new(kind: AnnotationKind, label: impl Into<String>, rect: PageRect, page_number: u32) -> Self {
        Self {
            kind,
            label: label.into(),
            parent: None,
            rect,
            page_number,
            entity_ref: None,
            view: None,
        }
    }

    pub fn with_parent(mut self, parent: AnnotationId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_entity_ref(mut self, entity_ref: impl Into<String>) -> Self {
        self.entity_ref = Some(EntityRef::new(entity_ref));
        self
    }

    pub fn with_view(mut self, view: ViewBinding) -> Self {
        self.view = Some(view);
        self
    }
}
