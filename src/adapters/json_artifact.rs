//! JSON artifact writer.
//!
//! One compact document per result plus a manifest the dashboard uses to
//! discover which analyses exist. A metric that failed simply has no entry;
//! that absence is the contract, never a zero-filled payload.

use crate::domain::error::AnalysisError;
use crate::domain::result::AnalysisResult;
use crate::ports::artifact::ArtifactPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonArtifactWriter {
    out_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub id: u32,
    pub metric_name: String,
    pub path: String,
}

impl JsonArtifactWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn artifact_path(&self, result: &AnalysisResult) -> PathBuf {
        self.out_dir
            .join(format!("{:02}_{}.json", result.id, result.metric_name))
    }

    /// Write the manifest after a run; entries for failed metrics are absent.
    pub fn write_manifest(&self, entries: &[ManifestEntry]) -> Result<PathBuf, AnalysisError> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("manifest.json");
        let body = serde_json::to_string(entries).map_err(|e| AnalysisError::MalformedResult {
            metric: "manifest".into(),
            reason: e.to_string(),
        })?;
        fs::write(&path, body)?;
        Ok(path)
    }
}

impl ArtifactPort for JsonArtifactWriter {
    fn write(&self, result: &AnalysisResult) -> Result<PathBuf, AnalysisError> {
        result
            .aligned_len()
            .map_err(|reason| AnalysisError::MalformedResult {
                metric: result.metric_name.clone(),
                reason,
            })?;
        if !result.scalars_finite() {
            return Err(AnalysisError::MalformedResult {
                metric: result.metric_name.clone(),
                reason: "non-finite scalar in payload".into(),
            });
        }

        fs::create_dir_all(&self.out_dir)?;
        let path = self.artifact_path(result);
        let body = serde_json::to_string(result).map_err(|e| AnalysisError::MalformedResult {
            metric: result.metric_name.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, body)?;
        Ok(path)
    }
}

/// Entry for a successfully serialized artifact, path relative to the
/// manifest's own directory.
pub fn manifest_entry(result: &AnalysisResult, path: &Path) -> ManifestEntry {
    ManifestEntry {
        id: result.id,
        metric_name: result.metric_name.clone(),
        path: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}
