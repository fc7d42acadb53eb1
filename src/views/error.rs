//! View engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// A bundled template failed to load
    #[error("Template load error: {0}")]
    LoadError(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    TemplateError(String),
}
