//! # uc-cms
//!
//! Colour management binding built on Little CMS 2.
//!
//! Profiles and transforms are wrapped in [`uc_core::Handle`] by callers;
//! this crate defines the resources themselves and the pixel-buffer
//! helpers that feed 8-bit bitmaps through a transform.
//!
//! # Example
//!
//! ```rust
//! use uc_cms::{Intent, PixelMode, Profile, Transform};
//!
//! let rgb = Profile::srgb();
//! let lab = Profile::lab().unwrap();
//! let t = Transform::new(&rgb, PixelMode::Rgba, &lab, PixelMode::Lab, Intent::Perceptual, 0)
//!     .unwrap();
//! let out = t.transform_pixel([255, 255, 255, 0]);
//! assert!(out[0] > 250); // L* of white
//! ```

#![warn(missing_docs)]

mod bitmap;
mod error;
mod mode;
mod profile;
mod transform;

pub use bitmap::{Bitmap, PixelBuffer, pixels_from_image, set_image_pixels};
pub use error::{CmsError, CmsResult};
pub use mode::PixelMode;
pub use profile::Profile;
pub use transform::{Transform, flags, set_alarm_codes};

/// Version number of the linked engine, e.g. `2160` for 2.16.
pub fn version() -> u32 {
    lcms2::version()
}

/// Rendering intent for colour transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    /// Compresses the whole source gamut into the destination.
    #[default]
    Perceptual,

    /// Keeps in-gamut colours exact and clips the rest; white is mapped.
    RelativeColorimetric,

    /// Favours saturation over hue accuracy.
    Saturation,

    /// Like relative colorimetric without white point adaptation.
    AbsoluteColorimetric,
}

impl Intent {
    /// Decodes the integer intent code used across the binding boundary.
    pub fn from_code(code: u32) -> CmsResult<Self> {
        match code {
            0 => Ok(Intent::Perceptual),
            1 => Ok(Intent::RelativeColorimetric),
            2 => Ok(Intent::Saturation),
            3 => Ok(Intent::AbsoluteColorimetric),
            other => Err(CmsError::UnknownIntent(other)),
        }
    }

    /// Integer code of this intent.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl From<Intent> for lcms2::Intent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Perceptual => lcms2::Intent::Perceptual,
            Intent::RelativeColorimetric => lcms2::Intent::RelativeColorimetric,
            Intent::Saturation => lcms2::Intent::Saturation,
            Intent::AbsoluteColorimetric => lcms2::Intent::AbsoluteColorimetric,
        }
    }
}

impl uc_core::NativeResource for Profile {
    const KIND: &'static str = "cmsHPROFILE";
}

impl uc_core::NativeResource for Transform {
    const KIND: &'static str = "cmsHTRANSFORM";
}

impl uc_core::NativeResource for PixelBuffer {
    const KIND: &'static str = "pixbuf";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_codes() {
        for code in 0..4 {
            assert_eq!(Intent::from_code(code).unwrap().code(), code);
        }
        assert!(matches!(Intent::from_code(4), Err(CmsError::UnknownIntent(4))));
    }

    #[test]
    fn test_version() {
        assert!(version() >= 2000);
    }
}
