//! Dataset utilities for the evaluation harness.
//!
//! An example is a triple of files sharing a base id inside the dataset
//! directory:
//!
//! - `<id>.strums` reference strum labels
//! - `<id>_line.wav` line-in audio
//! - `<id>.csv` motion sensor trace
//!
//! The catalog discovers examples by their label files and loads the
//! matching audio and motion data.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::AudioConfig;
use crate::error::DatasetError;

pub mod loaders;

pub use loaders::{MotionSignal, StrumLabel, Waveform};

/// Extension of reference label files
pub const LABELS_EXTENSION: &str = "strums";
/// Suffix appended to the base id for the audio file
pub const AUDIO_SUFFIX: &str = "_line.wav";
/// Extension of motion trace files
pub const MOTION_EXTENSION: &str = "csv";

/// Paths of the three files that make up one example
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleFiles {
    pub id: String,
    pub audio: PathBuf,
    pub motion: PathBuf,
    pub labels: PathBuf,
}

impl ExampleFiles {
    /// Build the file triple for `id` inside `dir`
    pub fn resolve(dir: &Path, id: &str) -> Self {
        Self {
            id: id.to_string(),
            audio: dir.join(format!("{id}{AUDIO_SUFFIX}")),
            motion: dir.join(format!("{id}.{MOTION_EXTENSION}")),
            labels: dir.join(format!("{id}.{LABELS_EXTENSION}")),
        }
    }

    /// Derive the file triple from the path of a `.strums` label file
    pub fn from_labels_path(path: &Path) -> Result<Self, DatasetError> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(LABELS_EXTENSION) {
            return Err(DatasetError::MissingFile {
                kind: "labels",
                path: path.to_path_buf(),
            });
        }
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DatasetError::MissingFile {
                kind: "labels",
                path: path.to_path_buf(),
            })?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::resolve(dir, id))
    }

    /// File name of the label file, used as the example's display name
    pub fn labels_file_name(&self) -> String {
        self.labels
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.{LABELS_EXTENSION}", self.id))
    }

    /// Fail if any of the three files does not exist
    pub fn verify(&self) -> Result<(), DatasetError> {
        for (kind, path) in [
            ("labels", &self.labels),
            ("audio", &self.audio),
            ("motion", &self.motion),
        ] {
            if !path.is_file() {
                return Err(DatasetError::MissingFile {
                    kind,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Fully loaded example ready for analysis
#[derive(Debug, Clone)]
pub struct LoadedExample {
    pub files: ExampleFiles,
    pub waveform: Waveform,
    /// Motion trace normalized to a peak magnitude of 1.0
    pub motion: MotionSignal,
    pub labels: Vec<StrumLabel>,
}

impl LoadedExample {
    /// Load and normalize all three files of an example
    pub fn load(files: &ExampleFiles, audio: &AudioConfig) -> Result<Self, DatasetError> {
        files.verify()?;
        let waveform = loaders::load_waveform(&files.audio, audio.target_sample_rate)?;
        let motion = loaders::load_motion(&files.motion)?;
        let labels = loaders::read_strum_labels(&files.labels)?;

        tracing::debug!(
            "[Dataset] Loaded {}: {:.2}s audio @ {} Hz, {} motion samples, {} labels",
            files.id,
            waveform.duration_secs(),
            waveform.sample_rate,
            motion.len(),
            labels.len()
        );

        Ok(Self {
            files: files.clone(),
            waveform,
            motion,
            labels,
        })
    }
}

/// Catalog responsible for discovering examples on disk.
pub struct DatasetCatalog {
    root: PathBuf,
}

impl DatasetCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File triple for a base id in this dataset
    pub fn resolve(&self, id: &str) -> ExampleFiles {
        ExampleFiles::resolve(&self.root, id)
    }

    /// List every example (one per `.strums` file), sorted by id.
    pub fn discover(&self) -> Result<Vec<ExampleFiles>, DatasetError> {
        let io_err = |source| DatasetError::Io {
            path: self.root.clone(),
            source,
        };

        let mut examples = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(LABELS_EXTENSION)
            {
                examples.push(ExampleFiles::from_labels_path(&path)?);
            }
        }

        examples.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builds_file_triple() {
        let files = ExampleFiles::resolve(Path::new("dataset"), "take_01");
        assert_eq!(files.audio, PathBuf::from("dataset/take_01_line.wav"));
        assert_eq!(files.motion, PathBuf::from("dataset/take_01.csv"));
        assert_eq!(files.labels, PathBuf::from("dataset/take_01.strums"));
        assert_eq!(files.labels_file_name(), "take_01.strums");
    }

    #[test]
    fn test_from_labels_path_round_trips_resolve() {
        let files = ExampleFiles::from_labels_path(Path::new("dataset/take_02.strums")).unwrap();
        assert_eq!(files, ExampleFiles::resolve(Path::new("dataset"), "take_02"));
    }

    #[test]
    fn test_from_labels_path_rejects_other_extensions() {
        assert!(ExampleFiles::from_labels_path(Path::new("dataset/take_02.csv")).is_err());
    }

    #[test]
    fn test_discover_lists_label_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.strums", "a.strums", "a.csv", "a_line.wav", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let catalog = DatasetCatalog::new(dir.path());
        let ids: Vec<String> = catalog
            .discover()
            .unwrap()
            .into_iter()
            .map(|files| files.id)
            .collect();

        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_verify_reports_missing_motion() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.strums"), "").unwrap();
        fs::write(dir.path().join("a_line.wav"), "").unwrap();

        let err = DatasetCatalog::new(dir.path()).resolve("a").verify().unwrap_err();

        match err {
            DatasetError::MissingFile { kind, .. } => assert_eq!(kind, "motion"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_discover_missing_directory_is_io_error() {
        let err = DatasetCatalog::new("/nonexistent/dataset").discover().unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
