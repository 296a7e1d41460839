//! Error types shared across the core.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid construction of a model object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("annotation needs a target widget")]
    MissingTarget,
    #[error("annotation needs a kind")]
    MissingKind,
}

/// An image, sidecar or composite source could not be used.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("no windows to composite")]
    NoWindows,
    #[error("window {0} has no frame descriptor")]
    MissingFrame(usize),
    #[error("{0}")]
    Other(String),
}

/// Malformed or unexpected document shape.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown annotation kind: {0}")]
    UnknownKind(String),
    #[error("unknown slide layout: {0}")]
    UnknownLayout(String),
    #[error("invalid slide code: {0}")]
    BadSlideCode(String),
    #[error("invalid color: {0}")]
    BadColor(String),
    #[error("annotation kind {0} is transient and cannot be saved")]
    TransientKind(&'static str),
    #[error("{0}")]
    Other(String),
}

/// Recoverable problem found while loading; the load itself succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// An annotation's widget path is not on its slide; a degenerate target was used.
    MissingWidget { slide: usize, path: String },
    /// A slide could not be built and was left out.
    SlideSkipped { slide: usize, reason: String },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::MissingWidget { slide, path } => {
                write!(f, "slide {slide}: widget {path} not found")
            }
            LoadWarning::SlideSkipped { slide, reason } => {
                write!(f, "slide {slide} skipped: {reason}")
            }
        }
    }
}
