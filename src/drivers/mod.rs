//! Driver paths and record overlays for sensitivity analysis

mod overlay;
mod path;

pub use overlay::{overlay, overlay_path, read_value};
pub use path::{DriverPath, PathSegment};

use serde::Serialize;
use thiserror::Error;

/// Failure to apply a driver override to a record
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlayError {
    #[error("malformed driver path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("driver path '{path}' not found: '{missing}' does not exist")]
    PathNotFound { path: String, missing: String },

    #[error("driver path '{path}' points at a {found}, expected a {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot set '{path}' to non-finite value {value}")]
    NonFinite { path: String, value: f64 },

    #[error("record is invalid after setting '{path}': {reason}")]
    Rebuild { path: String, reason: String },
}
