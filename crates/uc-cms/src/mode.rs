//! Pixel mode tags.
//!
//! Callers name pixel layouts with short mode strings (`"RGB"`, `"CMYK"`,
//! `"L;16"`...). Several tags share one engine layout: 8-bit RGB always
//! travels as four bytes per pixel.

use lcms2::PixelFormat;

/// Buffer layout accepted by a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelMode {
    /// 8-bit RGBA (`RGB`, `RGBA`, `RGBX`).
    Rgba,
    /// 16-bit big-endian RGBA (`RGBA;16B`).
    Rgba16,
    /// 8-bit CMYK.
    Cmyk,
    /// 8-bit gray (`L`), also the fallback for unknown tags.
    Gray8,
    /// 16-bit native-endian gray (`L;16`).
    Gray16,
    /// 16-bit byte-swapped gray (`L;16B`).
    Gray16Swapped,
    /// 8-bit YCbCr (`YCC`, `YCCA`).
    YCbCr,
    /// 8-bit CIE Lab (`LAB`).
    Lab,
}

impl PixelMode {
    /// Maps a mode tag. Unknown tags map to [`PixelMode::Gray8`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "RGB" | "RGBA" | "RGBX" => PixelMode::Rgba,
            "RGBA;16B" => PixelMode::Rgba16,
            "CMYK" => PixelMode::Cmyk,
            "L" => PixelMode::Gray8,
            "L;16" => PixelMode::Gray16,
            "L;16B" => PixelMode::Gray16Swapped,
            "YCC" | "YCCA" => PixelMode::YCbCr,
            "LAB" => PixelMode::Lab,
            _ => PixelMode::Gray8,
        }
    }

    /// Canonical tag.
    pub fn as_tag(self) -> &'static str {
        match self {
            PixelMode::Rgba => "RGBA",
            PixelMode::Rgba16 => "RGBA;16B",
            PixelMode::Cmyk => "CMYK",
            PixelMode::Gray8 => "L",
            PixelMode::Gray16 => "L;16",
            PixelMode::Gray16Swapped => "L;16B",
            PixelMode::YCbCr => "YCC",
            PixelMode::Lab => "LAB",
        }
    }

    /// Engine pixel format.
    pub fn format(self) -> PixelFormat {
        match self {
            PixelMode::Rgba => PixelFormat::RGBA_8,
            PixelMode::Rgba16 => PixelFormat::RGBA_16,
            PixelMode::Cmyk => PixelFormat::CMYK_8,
            PixelMode::Gray8 => PixelFormat::GRAY_8,
            PixelMode::Gray16 => PixelFormat::GRAY_16,
            PixelMode::Gray16Swapped => PixelFormat::GRAY_16_SE,
            PixelMode::YCbCr => PixelFormat::YCbCr_8,
            PixelMode::Lab => PixelFormat::Lab_8,
        }
    }

    /// Bytes one pixel occupies in this layout.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelMode::Gray8 => 1,
            PixelMode::Gray16 | PixelMode::Gray16Swapped => 2,
            PixelMode::YCbCr | PixelMode::Lab => 3,
            PixelMode::Rgba | PixelMode::Cmyk => 4,
            PixelMode::Rgba16 => 8,
        }
    }
}

impl std::fmt::Display for PixelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}
