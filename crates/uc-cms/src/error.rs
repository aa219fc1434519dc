//! Colour engine error types.

use thiserror::Error;

/// Result type for colour engine operations.
pub type CmsResult<T> = Result<T, CmsError>;

/// Errors that can occur during colour engine operations.
#[derive(Debug, Error)]
pub enum CmsError {
    /// Failed to load profile from file.
    #[error("failed to load profile: {0}")]
    LoadFailed(String),

    /// Failed to create profile.
    #[error("failed to create profile: {0}")]
    CreateFailed(String),

    /// Failed to create transform.
    #[error("failed to create transform: {0}")]
    TransformFailed(String),

    /// Invalid profile data.
    #[error("invalid profile data: {0}")]
    InvalidProfile(String),

    /// Rendering intent code outside 0..=3.
    #[error("unknown rendering intent {0}")]
    UnknownIntent(u32),

    /// A pixel buffer is shorter than the requested geometry needs.
    #[error("{what} buffer holds {actual} bytes, {needed} needed")]
    BufferSize {
        /// Which buffer.
        what: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        actual: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CmsError {
    pub(crate) fn check_len(what: &'static str, needed: usize, actual: usize) -> CmsResult<()> {
        if actual < needed {
            Err(CmsError::BufferSize {
                what,
                needed,
                actual,
            })
        } else {
            Ok(())
        }
    }

    /// `count * size` in bytes; overflow is a size error against `actual`.
    pub(crate) fn bytes(what: &'static str, count: usize, size: usize, actual: usize) -> CmsResult<usize> {
        count.checked_mul(size).ok_or(CmsError::BufferSize {
            what,
            needed: usize::MAX,
            actual,
        })
    }

    /// Checks that `height` rows of `row` bytes, `stride` apart, fit in
    /// `actual` bytes.
    pub(crate) fn check_rows(
        what: &'static str,
        height: usize,
        stride: usize,
        row: usize,
        actual: usize,
    ) -> CmsResult<()> {
        if height == 0 {
            return Ok(());
        }
        let needed = (height - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(row))
            .unwrap_or(usize::MAX);
        Self::check_len(what, needed, actual)
    }
}
