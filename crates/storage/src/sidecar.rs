//! Annotation sidecar files
//!
//! Annotation sets are stored as JSON sidecar files alongside the PDF, with
//! the same name plus a `.shopmark.annotations.json` extension. Writes go
//! through a temporary file and rename so readers never see a partial file.

use crate::StorageError;
use annot_model::Annotation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ANNOTATIONS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotationsEnvelope {
    version: u32,
    annotations: Vec<Annotation>,
}

/// Sidecar path for a PDF: the full filename plus the sidecar extension.
pub fn sidecar_path(pdf_path: &Path) -> PathBuf {
    let mut path_str = pdf_path.to_string_lossy().to_string();
    path_str.push_str(".shopmark.annotations.json");
    PathBuf::from(path_str)
}

/// Save an annotation set, sorted by id for stable diffs.
///
/// Returns the sidecar path written.
pub fn save_annotations(
    pdf_path: &Path,
    annotations: &[Annotation],
) -> Result<PathBuf, StorageError> {
    let path = sidecar_path(pdf_path);

    let mut annotations = annotations.to_vec();
    annotations.sort_by_key(|a| a.id);

    let envelope = AnnotationsEnvelope { version: ANNOTATIONS_SCHEMA_VERSION, annotations };
    let json = serde_json::to_vec_pretty(&envelope)?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, &path)?;

    Ok(path)
}

/// Load an annotation set. An absent sidecar is an empty set.
pub fn load_annotations(pdf_path: &Path) -> Result<Vec<Annotation>, StorageError> {
    let path = sidecar_path(pdf_path);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let bytes = fs::read(path)?;
    let envelope: AnnotationsEnvelope = serde_json::from_slice(&bytes)?;

    if envelope.version != ANNOTATIONS_SCHEMA_VERSION {
        return Err(StorageError::SchemaVersion {
            found: envelope.version,
            expected: ANNOTATIONS_SCHEMA_VERSION,
        });
    }

    Ok(envelope.annotations)
}

pub fn annotations_exist(pdf_path: &Path) -> bool {
    sidecar_path(pdf_path).exists()
}

pub fn delete_annotations(pdf_path: &Path) -> Result<(), StorageError> {
    let path = sidecar_path(pdf_path);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_model::{AnnotationDraft, AnnotationId, AnnotationKind, PageRect};

    fn annotation(id: u64, label: &str) -> Annotation {
        Annotation::from_draft(
            AnnotationId(id),
            AnnotationDraft::new(
                AnnotationKind::Room,
                label,
                PageRect::new(0.0, 0.0, 50.0, 50.0),
                1,
            ),
        )
    }

    #[test]
    fn sidecar_path_appends_extension() {
        let path = sidecar_path(Path::new("/jobs/lot-4/drawings.pdf"));
        assert_eq!(
            path,
            Path::new("/jobs/lot-4/drawings.pdf.shopmark.annotations.json")
        );
    }

    #[test]
    fn annotations_round_trip_sorted_by_id() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("drawings.pdf");

        let set = vec![annotation(9, "Bath"), annotation(2, "Kitchen")];
        save_annotations(&pdf, &set).expect("save should succeed");

        let loaded = load_annotations(&pdf).expect("load should succeed");
        let ids: Vec<AnnotationId> = loaded.iter().map(|a| a.id).collect();

        assert_eq!(ids, vec![AnnotationId(2), AnnotationId(9)]);
        assert_eq!(loaded[1].label, "Bath");
    }

    #[test]
    fn absent_sidecar_is_an_empty_set() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("drawings.pdf");

        assert!(!annotations_exist(&pdf));
        assert!(load_annotations(&pdf).expect("load should succeed").is_empty());
    }

    #[test]
    fn version_mismatch_is_an_explicit_error() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("drawings.pdf");

        fs::write(
            sidecar_path(&pdf),
            r#"{"version": 7, "annotations": []}"#,
        )
        .expect("write");

        assert!(matches!(
            load_annotations(&pdf),
            Err(StorageError::SchemaVersion { found: 7, .. })
        ));
    }

    #[test]
    fn delete_removes_the_sidecar() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("drawings.pdf");

        save_annotations(&pdf, &[annotation(1, "Kitchen")]).expect("save should succeed");
        assert!(annotations_exist(&pdf));

        delete_annotations(&pdf).expect("delete should succeed");
        assert!(!annotations_exist(&pdf));

        // Deleting an absent sidecar is fine
        delete_annotations(&pdf).expect("delete should succeed");
    }
}
