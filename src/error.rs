use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

/// Failures a single data feed can hit. The dashboard coordinator catches
/// these per feed and leaves that feed's series empty.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("resource unavailable: {path}: {reason}")]
    ResourceUnavailable { path: String, reason: String },

    #[error("invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("missing required column `{column}` in {path}")]
    MissingColumn { path: String, column: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LoadError {
    pub fn unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::ResourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(path: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::InvalidDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
