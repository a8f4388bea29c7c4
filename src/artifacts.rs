//! Artifact store
//!
//! The fitted feature pipeline and the selected model are persisted as JSON
//! documents under one directory. Writes go to a temporary file in the
//! destination directory and are renamed into place, so a reader sees either
//! the previous artifact or the new one. A training run writes both
//! artifacts through [`ArtifactStore::save_all`], which restores the previous
//! pipeline if the model cannot be put in place.

use crate::config::ArtifactConfig;
use crate::error::{LoanError, Result};
use crate::preprocessing::FeaturePipeline;
use crate::training::LoanModel;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    config: ArtifactConfig,
}

impl ArtifactStore {
    pub fn new(config: ArtifactConfig) -> Self {
        Self { config }
    }

    /// Store rooted at `dir` with the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(ArtifactConfig::in_dir(dir))
    }

    pub fn config(&self) -> &ArtifactConfig {
        &self.config
    }

    pub fn pipeline_path(&self) -> PathBuf {
        self.config.pipeline_path()
    }

    pub fn model_path(&self) -> PathBuf {
        self.config.model_path()
    }

    /// True when both artifacts exist on disk
    pub fn is_complete(&self) -> bool {
        self.pipeline_path().is_file() && self.model_path().is_file()
    }

    pub fn save_pipeline(&self, pipeline: &FeaturePipeline) -> Result<PathBuf> {
        if !pipeline.is_fitted() {
            return Err(LoanError::ModelNotFitted);
        }
        let path = self.pipeline_path();
        save_json(&path, pipeline)?;
        Ok(path)
    }

    pub fn load_pipeline(&self) -> Result<FeaturePipeline> {
        let path = self.pipeline_path();
        let pipeline: FeaturePipeline = load_json(&path)?;
        if !pipeline.is_fitted() {
            return Err(LoanError::ArtifactCorrupt {
                path,
                reason: "pipeline was saved before fitting".to_string(),
            });
        }
        Ok(pipeline)
    }

    pub fn save_model(&self, model: &LoanModel) -> Result<PathBuf> {
        let path = self.model_path();
        save_json(&path, model)?;
        Ok(path)
    }

    pub fn load_model(&self) -> Result<LoanModel> {
        load_json(&self.model_path())
    }

    /// Write the pipeline and model of one training run as a pair.
    ///
    /// Both documents are serialized and synced before either is renamed into
    /// place. If the model rename fails, the pipeline on disk is put back to
    /// what it was before the call.
    pub fn save_all(
        &self,
        pipeline: &FeaturePipeline,
        model: &LoanModel,
    ) -> Result<(PathBuf, PathBuf)> {
        if !pipeline.is_fitted() {
            return Err(LoanError::ModelNotFitted);
        }
        let pipeline_path = self.pipeline_path();
        let model_path = self.model_path();

        let staged_pipeline = stage_json(&pipeline_path, pipeline)?;
        let staged_model = stage_json(&model_path, model)?;

        let previous = match fs::read(&pipeline_path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        persist_staged(staged_pipeline, &pipeline_path)?;
        if let Err(e) = persist_staged(staged_model, &model_path) {
            if let Err(restore) = restore_file(&pipeline_path, previous.as_deref()) {
                warn!(
                    path = %pipeline_path.display(),
                    error = %restore,
                    "Could not restore previous pipeline artifact"
                );
            }
            return Err(e);
        }

        info!(
            pipeline = %pipeline_path.display(),
            model = %model_path.display(),
            "Artifacts written"
        );
        Ok((pipeline_path, model_path))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Serialize `value` into a synced temp file next to `path`
fn stage_json<T: Serialize>(path: &Path, value: &T) -> Result<NamedTempFile> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)?;

    let tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn persist_staged(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path).map_err(|e| LoanError::IoError(e.error))?;
    Ok(())
}

/// Put `path` back to `previous`, or remove it if it did not exist
fn restore_file(path: &Path, previous: Option<&[u8]>) -> Result<()> {
    match previous {
        Some(bytes) => {
            let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
            tmp.write_all(bytes)?;
            tmp.as_file().sync_all()?;
            persist_staged(tmp, path)
        }
        None => Ok(fs::remove_file(path)?),
    }
}

/// Serialize `value` to `path` atomically
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = stage_json(path, value)?;
    persist_staged(tmp, path)?;

    info!(path = %path.display(), "Artifact written");
    Ok(())
}

/// Deserialize a JSON artifact, separating absence from corruption
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(LoanError::ArtifactNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        LoanError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    debug!(path = %path.display(), "Artifact loaded");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        values: Vec<f64>,
    }

    #[test]
    fn test_json_round_trip_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("blob.json");
        let blob = Blob {
            name: "scaler".to_string(),
            values: vec![0.1, 2.5e-7, -3.0],
        };

        save_json(&path, &blob).unwrap();
        let back: Blob = load_json(&path).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        assert!(!store.is_complete());
        match store.load_model() {
            Err(LoanError::ArtifactNotFound(path)) => assert_eq!(path, store.model_path()),
            other => panic!("expected ArtifactNotFound, got {:?}", other.map(|m| m.name)),
        }
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        fs::write(store.pipeline_path(), b"{ not json").unwrap();
        assert!(matches!(
            store.load_pipeline(),
            Err(LoanError::ArtifactCorrupt { .. })
        ));
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.json");
        save_json(&path, &Blob { name: "a".to_string(), values: vec![] }).unwrap();
        save_json(&path, &Blob { name: "b".to_string(), values: vec![1.0] }).unwrap();

        let back: Blob = load_json(&path).unwrap();
        assert_eq!(back.name, "b");
        // no stray temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_restore_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");

        fs::write(&path, b"new").unwrap();
        restore_file(&path, Some(b"old".as_slice())).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"old");

        restore_file(&path, None).unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unfitted_pipeline_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        assert!(matches!(
            store.save_pipeline(&FeaturePipeline::default()),
            Err(LoanError::ModelNotFitted)
        ));
        assert!(!store.pipeline_path().exists());
    }
}
