//! Image toolkit error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for image toolkit operations.
pub type ImgResult<T> = Result<T, ImgError>;

/// Errors that can occur during image toolkit operations.
#[derive(Debug, Error)]
pub enum ImgError {
    /// Toolkit used before genesis, after terminus, or by a stale wand.
    #[error(transparent)]
    Core(#[from] uc_core::CoreError),

    /// Decoding failed.
    #[error("failed to decode {source_name}: {message}")]
    Decode {
        /// File path or `<blob>`.
        source_name: String,
        /// Decoder message.
        message: String,
    },

    /// Encoding failed.
    #[error("failed to encode {format}: {message}")]
    Encode {
        /// Target format name.
        format: String,
        /// Encoder message.
        message: String,
    },

    /// Neither the path nor the wand names a known output format.
    #[error("no output format for {0}")]
    UnknownFormat(PathBuf),

    /// Format tag not recognised.
    #[error("unknown image format tag {0:?}")]
    UnknownFormatTag(String),

    /// Operation needs at least one frame.
    #[error("wand holds no images")]
    NoImages,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImgError {
    pub(crate) fn decode(source_name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ImgError::Decode {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(format: image::ImageFormat, err: impl std::fmt::Display) -> Self {
        ImgError::Encode {
            format: format!("{format:?}"),
            message: err.to_string(),
        }
    }
}
