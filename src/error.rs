use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for deeppcb2yolo operations.
#[derive(Debug, Error)]
pub enum Deeppcb2YoloError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Raw corpus root {path} does not exist or is not a directory")]
    RawRootMissing { path: PathBuf },

    #[error("No candidate images matching '{pattern}' found under {path}")]
    NoCandidates { path: PathBuf, pattern: String },

    #[error("Invalid candidate pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed while traversing {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to clear existing output root {path}: {source}")]
    OutputRootClear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputRootCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data.yaml for {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse data.yaml at {path}: {source}")]
    DataYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report as JSON: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("Check failed with {error_count} error(s) and {warning_count} warning(s)")]
    CheckFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
