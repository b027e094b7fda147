//! Local persistence
//!
//! Viewer preferences live under the platform data directory; annotation
//! sets live in JSON sidecar files next to the PDF they annotate. Both are
//! wrapped in schema-versioned envelopes.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod backend;
pub mod sidecar;

pub use backend::FileBackend;
pub use sidecar::{
    annotations_exist, delete_annotations, load_annotations, save_annotations, sidecar_path,
    ANNOTATIONS_SCHEMA_VERSION,
};

const PREFS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version {found}, expected {expected}")]
    SchemaVersion { found: u32, expected: u32 },
}

/// Viewer preferences persisted across sessions.
///
/// `None` fields defer to the viewer's built-in defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewerPreferences {
    /// Hide annotation kinds deeper than this while in normal mode.
    pub normal_depth_cap: Option<u8>,
    /// Override the mask cutout padding, in screen pixels.
    pub mask_padding: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferencesEnvelope {
    version: u32,
    preferences: ViewerPreferences,
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Shopmark", "Shopmark")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_preferences(&self) -> Result<ViewerPreferences, StorageError> {
        let path = self.preferences_path();
        if !path.exists() {
            return Ok(ViewerPreferences::default());
        }

        let bytes = fs::read(path)?;
        let envelope: PreferencesEnvelope = serde_json::from_slice(&bytes)?;

        if envelope.version != PREFS_SCHEMA_VERSION {
            return Err(StorageError::SchemaVersion {
                found: envelope.version,
                expected: PREFS_SCHEMA_VERSION,
            });
        }

        Ok(envelope.preferences)
    }

    pub fn save_preferences(&self, preferences: &ViewerPreferences) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = PreferencesEnvelope {
            version: PREFS_SCHEMA_VERSION,
            preferences: preferences.clone(),
        };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.preferences_path(), bytes)?;
        Ok(())
    }

    fn preferences_path(&self) -> PathBuf {
        self.root.join("preferences.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let prefs = ViewerPreferences { normal_depth_cap: Some(1), mask_padding: Some(20.0) };

        store.save_preferences(&prefs).expect("save should succeed");
        let loaded = store.load_preferences().expect("load should succeed");

        assert_eq!(loaded, prefs);
    }

    #[test]
    fn load_defaults_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let loaded = store.load_preferences().expect("load should succeed");
        assert_eq!(loaded, ViewerPreferences::default());
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        fs::create_dir_all(temp.path()).expect("data dir");
        fs::write(
            temp.path().join("preferences.json"),
            r#"{"version": 99, "preferences": {"normal_depth_cap": null, "mask_padding": null}}"#,
        )
        .expect("write");

        let result = store.load_preferences();
        assert!(matches!(
            result,
            Err(StorageError::SchemaVersion { found: 99, expected: PREFS_SCHEMA_VERSION })
        ));
    }
}
