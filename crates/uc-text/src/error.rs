//! Text layout error types.

use thiserror::Error;

/// Result type for text layout operations.
pub type TextResult<T> = Result<T, TextError>;

/// Errors that can occur during text layout operations.
#[derive(Debug, Error)]
pub enum TextError {
    /// Shared plumbing failure.
    #[error(transparent)]
    Core(#[from] uc_core::CoreError),

    /// More positions requested than the paragraph has characters.
    #[error("requested {requested} positions but the paragraph has {available} characters")]
    PositionsOutOfRange {
        /// Slot limit passed by the caller.
        requested: usize,
        /// Character count of the laid-out paragraph.
        available: usize,
    },

    /// Markup could not be parsed.
    #[error("invalid markup at byte {offset}: {message}")]
    Markup {
        /// Byte offset into the markup string.
        offset: usize,
        /// Parser message.
        message: String,
    },

    /// Font file or directory could not be loaded.
    #[error("failed to load fonts from {path}: {message}")]
    FontLoad {
        /// Path that was given.
        path: String,
        /// Loader message.
        message: String,
    },

    /// The shared font system lock was poisoned by a panic elsewhere.
    #[error("font system unavailable")]
    FontSystemPoisoned,
}

impl TextError {
    pub(crate) fn markup(offset: usize, message: impl Into<String>) -> Self {
        TextError::Markup {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = TextError::PositionsOutOfRange {
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "requested 5 positions but the paragraph has 3 characters"
        );
        assert!(TextError::markup(4, "unexpected </b>").to_string().contains("byte 4"));
    }
}
