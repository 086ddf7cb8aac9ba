//! Theme engine error types

use thiserror::Error;

/// Theme-specific errors
#[derive(Debug, Error)]
pub enum ThemeError {
    /// Template could not be parsed or rendered
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Template file is not valid UTF-8
    #[error("Template {0} is not valid UTF-8")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
