//! Artifact output port trait.

use crate::domain::error::AnalysisError;
use crate::domain::result::AnalysisResult;
use std::path::PathBuf;

/// Port for persisting finished analysis results.
pub trait ArtifactPort {
    /// Write one result and return the path it landed at.
    fn write(&self, result: &AnalysisResult) -> Result<PathBuf, AnalysisError>;
}
