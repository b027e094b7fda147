use annot_model::{AnnotationId, AnnotationKind};

/// Failure reported by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error types for hierarchy mutations and traversal.
///
/// `NotFound`, `InvalidParentKind` and `CycleDetected` are recoverable: the
/// mutation is rejected and the tree is unchanged. `BrokenChain` signals data
/// corruption and is surfaced to the caller rather than swallowed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HierarchyError {
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),

    #[error(
        "invalid parent for {child} annotation: expected {}, found {}",
        parent_label(.expected),
        parent_label(.found)
    )]
    InvalidParentKind {
        child: AnnotationKind,
        expected: Option<AnnotationKind>,
        found: Option<AnnotationKind>,
    },

    #[error("reparenting {0} would create a cycle")]
    CycleDetected(AnnotationId),

    #[error("ancestor chain broken at {at}: parent {missing} is missing")]
    BrokenChain {
        at: AnnotationId,
        missing: AnnotationId,
    },

    #[error("no repair candidate for orphan {0}")]
    RepairFailed(AnnotationId),

    #[error("persistence backend failure: {0}")]
    Backend(#[from] BackendError),
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

fn parent_label(kind: &Option<AnnotationKind>) -> &'static str {
    match kind {
        Some(kind) => kind.as_str(),
        None => "root level",
    }
}
