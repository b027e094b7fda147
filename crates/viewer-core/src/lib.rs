//! Viewer state for the annotation overlay
//!
//! Isolation mode and the screen-space projection of annotation geometry.
//! Visible/hidden membership changes only on selection changes; scroll and
//! zoom re-project mask rectangles without touching membership.

pub mod isolation;
pub mod projection;

pub use isolation::{IsolationError, ViewSession, ViewState, VisibleSet};
pub use projection::{
    fit_transform, mask_layout, ContainerMetrics, MaskCutout, ScreenRect, ViewTransform,
    MASK_CORNER_RADIUS, MASK_PADDING, MAX_ZOOM, MIN_ZOOM,
};
