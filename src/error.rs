//! Error types for build extraction and comparison

use thiserror::Error;

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build extraction and comparison errors
///
/// Missing secondary sections are not errors: they degrade to empty
/// sub-models and are reported through [`crate::extract::Diagnostics`].
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Structural error in '{section}': {reason}")]
    Structural { section: String, reason: String },

    #[error("Invalid canonical model: {0}")]
    InvalidModel(String),

    #[error("Invalid reference data: {0}")]
    InvalidReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl BuildError {
    /// Shorthand for a structural error on a named section
    pub fn structural(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structural {
            section: section.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the build itself is unusable
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}
