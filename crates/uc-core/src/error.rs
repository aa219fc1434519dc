//! Error types for handle, lifecycle and settings operations.
//!
//! Engine crates (`uc-cms`, `uc-img`, `uc-text`) have their own error enums
//! and convert from [`CoreError`] where a core precondition fails.

use thiserror::Error;

/// Result type alias using [`CoreError`] as the error type.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised by the shared binding plumbing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The native engine returned no resource.
    ///
    /// Nothing was wrapped, so no teardown will ever run for it.
    #[error("failed to create {kind}")]
    CreateFailed {
        /// Resource type tag, e.g. `cmsHPROFILE`.
        kind: &'static str,
    },

    /// A process-wide engine was used before genesis or after terminus.
    #[error("{subsystem} is not initialized")]
    NotInitialized {
        /// Subsystem name.
        subsystem: &'static str,
    },

    /// A guarded resource outlived the engine generation that created it.
    #[error("{kind} belongs to a terminated {subsystem} instance")]
    StaleResource {
        /// Resource type tag.
        kind: &'static str,
        /// Subsystem name.
        subsystem: &'static str,
    },

    /// Settings file could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// I/O error while reading settings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CoreError::CreateFailed { kind: "MagickWand" };
        assert_eq!(err.to_string(), "failed to create MagickWand");

        let err = CoreError::NotInitialized { subsystem: "image toolkit" };
        assert!(err.to_string().contains("image toolkit"));
    }
}
