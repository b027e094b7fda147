//! Document-to-screen projection and isolation mask geometry
//!
//! Projection is a pure function of (geometry, zoom, scroll, container
//! offset). The container bounding rect is cached and invalidated only on
//! resize or explicit refresh, never per scroll event.

use crate::isolation::VisibleSet;
use annot_model::{AnnotationId, PageRect};
use hierarchy::HierarchyStore;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 16.0;

/// Padding applied per side around each mask cutout, in screen pixels.
pub const MASK_PADDING: f32 = 15.0;
/// Corner radius of mask cutouts, in screen pixels.
pub const MASK_CORNER_RADIUS: f32 = 8.0;

/// Screen-space rectangle in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Active zoom factor, scroll offset and container offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { zoom: 1.0, scroll_x: 0.0, scroll_y: 0.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

impl ViewTransform {
    /// Project a document-space rectangle into screen space.
    pub fn project(&self, rect: PageRect) -> ScreenRect {
        ScreenRect {
            x: rect.x * self.zoom - self.scroll_x + self.offset_x,
            y: rect.y * self.zoom - self.scroll_y + self.offset_y,
            width: rect.width * self.zoom,
            height: rect.height * self.zoom,
        }
    }

    pub fn scrolled_by(self, dx: f32, dy: f32) -> Self {
        Self { scroll_x: self.scroll_x + dx, scroll_y: self.scroll_y + dy, ..self }
    }

    pub fn with_zoom(self, zoom: f32) -> Self {
        Self { zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM), ..self }
    }

    pub fn with_offset(self, offset_x: f32, offset_y: f32) -> Self {
        Self { offset_x, offset_y, ..self }
    }
}

/// One cutout of the isolation mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskCutout {
    pub id: AnnotationId,
    pub rect: ScreenRect,
    pub corner_radius: f32,
}

/// Project the visible set into mask cutouts for one page.
///
/// Cutouts are padded by `padding` per side ([`MASK_PADDING`] unless the
/// user overrode it) and ordered by annotation id. Annotations whose
/// projected size is not positive are skipped.
pub fn mask_layout(
    store: &HierarchyStore,
    visible: &VisibleSet,
    page: u32,
    transform: &ViewTransform,
    padding: f32,
) -> Vec<MaskCutout> {
    let mut cutouts = Vec::new();

    for &id in &visible.visible {
        let Some(annotation) = store.get(id) else {
            continue;
        };
        if annotation.page_number != page {
            continue;
        }

        let projected = transform.project(annotation.rect);
        if projected.is_empty() {
            continue;
        }

        cutouts.push(MaskCutout {
            id,
            rect: ScreenRect {
                x: projected.x - padding,
                y: projected.y - padding,
                width: projected.width + padding * 2.0,
                height: projected.height + padding * 2.0,
            },
            corner_radius: MASK_CORNER_RADIUS,
        });
    }

    cutouts
}

/// Cached container bounding rect.
///
/// Measuring the container forces layout in the host; the cache keeps the
/// per-frame projection cost bounded. Invalidate on resize or explicit
/// refresh only.
#[derive(Debug, Clone, Default)]
pub struct ContainerMetrics {
    rect: Option<ScreenRect>,
}

impl ContainerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_measure(&mut self, measure: impl FnOnce() -> ScreenRect) -> ScreenRect {
        match self.rect {
            Some(rect) => rect,
            None => {
                let rect = measure();
                self.rect = Some(rect);
                rect
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.rect = None;
    }

    pub fn is_cached(&self) -> bool {
        self.rect.is_some()
    }
}

/// Transform that fits `target` inside the viewport, centered, with
/// `padding` screen pixels on each side.
///
/// Used when entering isolation to zoom to the target. The zoom factor uses
/// the smallest dimension ratio and is clamped to the viewer's zoom range.
pub fn fit_transform(target: PageRect, viewport_width: f32, viewport_height: f32, padding: f32) -> ViewTransform {
    if target.is_empty() || viewport_width <= 0.0 || viewport_height <= 0.0 {
        return ViewTransform::default();
    }

    let usable_width = (viewport_width - padding * 2.0).max(1.0);
    let usable_height = (viewport_height - padding * 2.0).max(1.0);

    let zoom = (usable_width / target.width)
        .min(usable_height / target.height)
        .clamp(MIN_ZOOM, MAX_ZOOM);

    let (center_x, center_y) = target.center();

    ViewTransform {
        zoom,
        scroll_x: center_x * zoom - viewport_width / 2.0,
        scroll_y: center_y * zoom - viewport_height / 2.0,
        offset_x: 0.0,
        offset_y: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isolation::ViewSession;
    use annot_model::{AnnotationDraft, AnnotationKind};

    #[test]
    fn projection_scales_then_translates() {
        let transform = ViewTransform {
            zoom: 2.0,
            scroll_x: 50.0,
            scroll_y: 20.0,
            offset_x: 10.0,
            offset_y: 5.0,
        };

        let projected = transform.project(PageRect::new(100.0, 40.0, 30.0, 20.0));

        assert_eq!(projected, ScreenRect::new(160.0, 65.0, 60.0, 40.0));
    }

    #[test]
    fn scrolling_is_a_pure_translation() {
        let transform = ViewTransform { zoom: 1.5, ..ViewTransform::default() };
        let rect = PageRect::new(80.0, 60.0, 40.0, 40.0);

        let before = transform.project(rect);
        let after = transform.scrolled_by(25.0, -10.0).project(rect);

        assert_eq!(after.x, before.x - 25.0);
        assert_eq!(after.y, before.y + 10.0);
        assert_eq!(after.width, before.width);
        assert_eq!(after.height, before.height);
    }

    #[test]
    fn scrolling_never_changes_membership() {
        let mut store = HierarchyStore::new();
        let room = store
            .insert(AnnotationDraft::new(
                AnnotationKind::Room,
                "Kitchen",
                PageRect::new(0.0, 0.0, 200.0, 100.0),
                1,
            ))
            .expect("room");

        let mut session = ViewSession::new(1);
        let before = session.isolate(&store, room.id).expect("isolate");
        let after = session.visible_set(&store);

        // Membership is transform-independent by construction; the same set
        // projects under any scroll offset.
        assert_eq!(before, after);
        let transform = ViewTransform::default().scrolled_by(300.0, 400.0);
        assert_eq!(mask_layout(&store, &after, 1, &transform, MASK_PADDING).len(), 1);
    }

    #[test]
    fn zoom_is_clamped_to_viewer_range() {
        let transform = ViewTransform::default().with_zoom(100.0);
        assert_eq!(transform.zoom, MAX_ZOOM);

        let tiny = ViewTransform::default().with_zoom(0.0);
        assert_eq!(tiny.zoom, MIN_ZOOM);
    }

    #[test]
    fn mask_cutouts_are_padded_and_rounded() {
        let mut store = HierarchyStore::new();
        let room = store
            .insert(AnnotationDraft::new(
                AnnotationKind::Room,
                "Kitchen",
                PageRect::new(100.0, 100.0, 50.0, 30.0),
                1,
            ))
            .expect("room");

        let mut session = ViewSession::new(1);
        let set = session.isolate(&store, room.id).expect("isolate");

        let cutouts = mask_layout(&store, &set, 1, &ViewTransform::default(), MASK_PADDING);
        assert_eq!(cutouts.len(), 1);

        let cutout = cutouts[0];
        assert_eq!(cutout.rect, ScreenRect::new(85.0, 85.0, 80.0, 60.0));
        assert_eq!(cutout.corner_radius, MASK_CORNER_RADIUS);
        assert_eq!(cutout.id, room.id);
    }

    #[test]
    fn mask_skips_annotations_on_other_pages_and_degenerate_rects() {
        let mut store = HierarchyStore::new();
        let room = store
            .insert(AnnotationDraft::new(
                AnnotationKind::Room,
                "Kitchen",
                PageRect::new(0.0, 0.0, 100.0, 100.0),
                1,
            ))
            .expect("room");
        store
            .insert(
                AnnotationDraft::new(
                    AnnotationKind::Location,
                    "Degenerate",
                    PageRect::new(10.0, 10.0, 0.0, 40.0),
                    1,
                )
                .with_parent(room.id),
            )
            .expect("degenerate location");

        let mut session = ViewSession::new(1);
        let set = session.visible_set(&store);

        let cutouts = mask_layout(&store, &set, 1, &ViewTransform::default(), MASK_PADDING);
        assert_eq!(cutouts.len(), 1);
        assert_eq!(cutouts[0].id, room.id);
    }

    #[test]
    fn container_metrics_measures_once_until_invalidated() {
        let mut metrics = ContainerMetrics::new();
        let mut measured = 0;

        for _ in 0..3 {
            metrics.get_or_measure(|| {
                measured += 1;
                ScreenRect::new(0.0, 0.0, 1280.0, 720.0)
            });
        }
        assert_eq!(measured, 1);
        assert!(metrics.is_cached());

        metrics.invalidate();
        metrics.get_or_measure(|| {
            measured += 1;
            ScreenRect::new(0.0, 0.0, 800.0, 600.0)
        });
        assert_eq!(measured, 2);
    }

    #[test]
    fn fit_transform_centers_target_with_smallest_ratio() {
        let target = PageRect::new(100.0, 100.0, 100.0, 50.0);
        let transform = fit_transform(target, 500.0, 400.0, 50.0);

        // Width ratio 4.0, height ratio 6.0; smaller wins.
        assert_eq!(transform.zoom, 4.0);

        // Target center lands on the viewport center.
        let projected = transform.project(target);
        assert_eq!(projected.x + projected.width / 2.0, 250.0);
        assert_eq!(projected.y + projected.height / 2.0, 200.0);
    }

    #[test]
    fn fit_transform_clamps_zoom_and_guards_degenerate_input() {
        let tiny = fit_transform(PageRect::new(0.0, 0.0, 1.0, 1.0), 1000.0, 1000.0, 0.0);
        assert_eq!(tiny.zoom, MAX_ZOOM);

        let empty = fit_transform(PageRect::new(0.0, 0.0, 0.0, 0.0), 1000.0, 1000.0, 0.0);
        assert_eq!(empty, ViewTransform::default());
    }
}
