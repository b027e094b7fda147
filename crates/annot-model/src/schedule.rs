//! CSV schedule export
//!
//! Flattens an annotation set into a schedule table for reporting and
//! integration with external takeoff tools.

use crate::Annotation;
use std::io::Write;

/// Error types for schedule export
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

/// Export annotations as a CSV schedule, ordered by page then label.
///
/// Columns: ID, Kind, Label, Page, Parent, X, Y, Width, Height, Entity Ref.
/// Returns the number of rows written.
pub fn write_schedule<W: Write>(
    annotations: &[&Annotation],
    writer: W,
) -> Result<usize, ScheduleError> {
    let mut rows: Vec<&Annotation> = annotations.to_vec();
    rows.sort_by(|a, b| {
        a.page_number
            .cmp(&b.page_number)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "ID",
        "Kind",
        "Label",
        "Page",
        "Parent",
        "X",
        "Y",
        "Width",
        "Height",
        "Entity Ref",
    ])?;

    for annotation in &rows {
        let parent = annotation
            .parent
            .map(|id| id.0.to_string())
            .unwrap_or_default();
        let entity_ref = annotation
            .entity_ref
            .as_ref()
            .map(|entity| entity.0.clone())
            .unwrap_or_default();

        csv_writer.write_record([
            annotation.id.0.to_string(),
            annotation.kind.to_string(),
            annotation.label.clone(),
            annotation.page_number.to_string(),
            parent,
            format!("{:.2}", annotation.rect.x),
            format!("{:.2}", annotation.rect.y),
            format!("{:.2}", annotation.rect.width),
            format!("{:.2}", annotation.rect.height),
            entity_ref,
        ])?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}
