//! Request error taxonomy
//!
//! Every fallible operation on the request path returns `ResizeError`.
//! The server boundary maps the kind to an HTTP status and a log line;
//! nothing below it retries or swallows errors.

use std::fmt;

/// Errors that can occur while serving a transformed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    /// Malformed directive segment (client-caused)
    Grammar { message: String },

    /// A `_name` directive referenced a preset that is not configured
    UnknownPreset { name: String },

    /// Source or watermark asset does not exist
    NotFound { path: String },

    /// Object store failure other than a missing key
    Store { code: String, message: String },

    /// Image decode, transform or encode failure
    Engine { stage: &'static str, message: String },
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeError::Grammar { message } => write!(f, "Invalid directives: {}", message),
            ResizeError::UnknownPreset { name } => write!(f, "Unknown preset: {}", name),
            ResizeError::NotFound { path } => write!(f, "Asset not found: {}", path),
            ResizeError::Store { code, message } => {
                write!(f, "Object store error ({}): {}", code, message)
            }
            ResizeError::Engine { stage, message } => {
                write!(f, "Image engine failed during {}: {}", stage, message)
            }
        }
    }
}

impl std::error::Error for ResizeError {}

impl ResizeError {
    /// Maps errors to the outward HTTP status
    ///
    /// Only a missing asset is distinguished (404). Grammar and preset errors
    /// are client-caused but keep the historical 500 contract.
    pub fn to_http_status(&self) -> u16 {
        match self {
            ResizeError::NotFound { .. } => 404,
            ResizeError::Grammar { .. }
            | ResizeError::UnknownPreset { .. }
            | ResizeError::Store { .. }
            | ResizeError::Engine { .. } => 500,
        }
    }

    /// Short machine-friendly label, used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ResizeError::Grammar { .. } => "grammar",
            ResizeError::UnknownPreset { .. } => "unknown_preset",
            ResizeError::NotFound { .. } => "not_found",
            ResizeError::Store { .. } => "store",
            ResizeError::Engine { .. } => "engine",
        }
    }

    pub fn grammar(message: impl Into<String>) -> Self {
        ResizeError::Grammar {
            message: message.into(),
        }
    }

    pub fn unknown_preset(name: impl Into<String>) -> Self {
        ResizeError::UnknownPreset { name: name.into() }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        ResizeError::NotFound { path: path.into() }
    }

    pub fn store(code: impl Into<String>, message: impl Into<String>) -> Self {
        ResizeError::Store {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn engine(stage: &'static str, message: impl Into<String>) -> Self {
        ResizeError::Engine {
            stage,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResizeError::NotFound { .. })
    }
}
