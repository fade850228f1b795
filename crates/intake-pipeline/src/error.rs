//! Error types for the submission pipeline.

use thiserror::Error;

/// Errors raised while committing a form.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The attachment could not be turned into a displayable preview.
    #[error("preview derivation failed for {name}: {reason}")]
    PreviewDerivationFailed { name: String, reason: String },

    /// The key-value store rejected or could not complete a write.
    #[error("persistence write failed for key {key}: {source}")]
    PersistenceWriteFailed {
        key: String,
        #[source]
        source: intake_core::Error,
    },

    /// The renderer could not draw a view.
    #[error("render failed: {0}")]
    Render(#[source] std::io::Error),

    /// An error propagated from the form model.
    #[error(transparent)]
    Form(#[from] intake_core::Error),
}

impl PipelineError {
    /// Returns `true` when the error comes from the environment (preview,
    /// persistence or the output surface) rather than from an invalid edit.
    #[must_use]
    pub const fn is_environmental(&self) -> bool {
        matches!(
            self,
            Self::PreviewDerivationFailed { .. }
                | Self::PersistenceWriteFailed { .. }
                | Self::Render(_)
        )
    }

    pub(crate) fn preview(name: &str, reason: impl ToString) -> Self {
        Self::PreviewDerivationFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environmental_classification() {
        assert!(PipelineError::preview("me.png", "unreadable").is_environmental());
        assert!(PipelineError::PersistenceWriteFailed {
            key: "form".to_string(),
            source: intake_core::Error::InvalidOptions("x".to_string()),
        }
        .is_environmental());
        assert!(PipelineError::Render(std::io::Error::other("tty gone")).is_environmental());
        assert!(
            !PipelineError::Form(intake_core::Error::InvalidSelector("age".to_string()))
                .is_environmental()
        );
    }

    #[test]
    fn test_preview_error_display() {
        let err = PipelineError::preview("me.png", "not an image");
        assert_eq!(
            err.to_string(),
            "preview derivation failed for me.png: not an image"
        );
    }
}
