//! Error taxonomy for the analysis pipeline.

/// Top-level error type for marketlens.
///
/// Loader errors are fatal to the whole run; metric and simulator errors are
/// fatal only to the metric that raised them. A metric that fails is absent
/// from the output set, never coerced to zeros or NaN.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("data unavailable: {path}")]
    DataUnavailable { path: String },

    #[error("schema mismatch in {path}: {reason}")]
    SchemaMismatch { path: String, reason: String },

    #[error("insufficient data for {metric}: {reason}")]
    InsufficientData { metric: String, reason: String },

    #[error("empty cohort: {reason}")]
    EmptyCohort { reason: String },

    #[error("invalid Kelly fraction {fraction}: must lie in [0, 1]")]
    InvalidFraction { fraction: f64 },

    #[error("malformed result for {metric}: {reason}")]
    MalformedResult { metric: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AnalysisError> for std::process::ExitCode {
    fn from(err: &AnalysisError) -> Self {
        let code: u8 = match err {
            AnalysisError::Io(_) | AnalysisError::MalformedResult { .. } => 1,
            AnalysisError::ConfigParse { .. }
            | AnalysisError::ConfigMissing { .. }
            | AnalysisError::ConfigInvalid { .. } => 2,
            AnalysisError::DataUnavailable { .. } | AnalysisError::SchemaMismatch { .. } => 3,
            AnalysisError::InsufficientData { .. }
            | AnalysisError::EmptyCohort { .. }
            | AnalysisError::InvalidFraction { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
