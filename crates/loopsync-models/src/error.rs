//! Error types for the `loopsync-models` crate.
//!
//! Mapping itself never fails; only parsing configuration (field paths)
//! can produce a [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A field path could not be parsed.
    #[error("invalid field path \"{path}\": {reason}")]
    InvalidFieldPath {
        /// The path that failed to parse.
        path: String,
        /// Human-readable explanation.
        reason: String,
    },
}

impl ModelError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_path() {
        let err = ModelError::invalid_path("a..b", "empty segment");
        assert_eq!(err.to_string(), "invalid field path \"a..b\": empty segment");
    }
}
