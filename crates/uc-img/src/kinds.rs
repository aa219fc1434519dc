//! Image type and colourspace names.
//!
//! Callers see both as the toolkit's historic spellings
//! (`TrueColorMatteType`, `sRGBColorspace`), so each enum carries its
//! spelling table here.

use std::fmt;

/// Image class as reported and requested by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Unknown class.
    Undefined,
    /// Pure black and white.
    Bilevel,
    /// Gray.
    Grayscale,
    /// Gray with alpha.
    GrayscaleMatte,
    /// At most 256 colours.
    Palette,
    /// At most 256 colours, with alpha.
    PaletteMatte,
    /// Full colour.
    TrueColor,
    /// Full colour with alpha.
    TrueColorMatte,
    /// CMYK separation.
    ColorSeparation,
    /// CMYK separation with alpha.
    ColorSeparationMatte,
    /// Let the encoder pick.
    Optimize,
    /// Black and white palette with alpha.
    PaletteBilevelMatte,
}

impl ImageType {
    const SPELLINGS: [(ImageType, &'static str); 12] = [
        (ImageType::Undefined, "UndefinedType"),
        (ImageType::Bilevel, "BilevelType"),
        (ImageType::Grayscale, "GrayscaleType"),
        (ImageType::GrayscaleMatte, "GrayscaleMatteType"),
        (ImageType::Palette, "PaletteType"),
        (ImageType::PaletteMatte, "PaletteMatteType"),
        (ImageType::TrueColor, "TrueColorType"),
        (ImageType::TrueColorMatte, "TrueColorMatteType"),
        (ImageType::ColorSeparation, "ColorSeparationType"),
        (ImageType::ColorSeparationMatte, "ColorSeparationMatteType"),
        (ImageType::Optimize, "OptimizeType"),
        (ImageType::PaletteBilevelMatte, "PaletteBilevelMatteType"),
    ];

    /// Spelling of this type.
    pub fn as_str(self) -> &'static str {
        Self::SPELLINGS
            .iter()
            .find(|(t, _)| *t == self)
            .map_or("UndefinedType", |(_, s)| s)
    }

    /// Parses a requested type.
    ///
    /// Only the nine settable spellings are recognised; everything else,
    /// including `UndefinedType` and `OptimizeType`, means `TrueColorType`.
    pub fn parse(name: &str) -> Self {
        match name {
            "BilevelType" => ImageType::Bilevel,
            "GrayscaleType" => ImageType::Grayscale,
            "GrayscaleMatteType" => ImageType::GrayscaleMatte,
            "PaletteType" => ImageType::Palette,
            "PaletteMatteType" => ImageType::PaletteMatte,
            "TrueColorType" => ImageType::TrueColor,
            "TrueColorMatteType" => ImageType::TrueColorMatte,
            "ColorSeparationType" => ImageType::ColorSeparation,
            "ColorSeparationMatteType" => ImageType::ColorSeparationMatte,
            _ => ImageType::TrueColor,
        }
    }

    /// Whether the type carries an alpha channel.
    pub fn has_matte(self) -> bool {
        matches!(
            self,
            ImageType::GrayscaleMatte
                | ImageType::PaletteMatte
                | ImageType::TrueColorMatte
                | ImageType::ColorSeparationMatte
                | ImageType::PaletteBilevelMatte
        )
    }

    /// The same class without alpha.
    pub fn without_matte(self) -> Self {
        match self {
            ImageType::GrayscaleMatte => ImageType::Grayscale,
            ImageType::PaletteMatte => ImageType::Palette,
            ImageType::TrueColorMatte => ImageType::TrueColor,
            ImageType::ColorSeparationMatte => ImageType::ColorSeparation,
            ImageType::PaletteBilevelMatte => ImageType::Bilevel,
            other => other,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour model of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Colorspace {
    Undefined,
    Rgb,
    Gray,
    Transparent,
    Ohta,
    Lab,
    Xyz,
    YCbCr,
    Ycc,
    Yiq,
    YPbPr,
    Yuv,
    Cmyk,
    Srgb,
    Hsb,
    Hsl,
    Hwb,
    Rec601YCbCr,
    Rec709YCbCr,
    Log,
    Cmy,
}

impl Colorspace {
    /// Spelling of this colourspace.
    pub fn as_str(self) -> &'static str {
        match self {
            Colorspace::Undefined => "UndefinedColorspace",
            Colorspace::Rgb => "RGBColorspace",
            Colorspace::Gray => "GRAYColorspace",
            Colorspace::Transparent => "TransparentColorspace",
            Colorspace::Ohta => "OHTAColorspace",
            Colorspace::Lab => "LabColorspace",
            Colorspace::Xyz => "XYZColorspace",
            Colorspace::YCbCr => "YCbCrColorspace",
            Colorspace::Ycc => "YCCColorspace",
            Colorspace::Yiq => "YIQColorspace",
            Colorspace::YPbPr => "YPbPrColorspace",
            Colorspace::Yuv => "YUVColorspace",
            Colorspace::Cmyk => "CMYKColorspace",
            Colorspace::Srgb => "sRGBColorspace",
            Colorspace::Hsb => "HSBColorspace",
            Colorspace::Hsl => "HSLColorspace",
            Colorspace::Hwb => "HWBColorspace",
            Colorspace::Rec601YCbCr => "Rec601YCbCrColorspace",
            Colorspace::Rec709YCbCr => "Rec709YCbCrColorspace",
            Colorspace::Log => "LogColorspace",
            Colorspace::Cmy => "CMYColorspace",
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settable_spellings_parse_back() {
        for (ty, name) in ImageType::SPELLINGS {
            let parsed = ImageType::parse(name);
            match ty {
                ImageType::Undefined | ImageType::Optimize | ImageType::PaletteBilevelMatte => {
                    assert_eq!(parsed, ImageType::TrueColor)
                }
                _ => assert_eq!(parsed, ty),
            }
            assert_eq!(ty.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_defaults_to_truecolor() {
        assert_eq!(ImageType::parse("grayscale"), ImageType::TrueColor);
        assert_eq!(ImageType::parse(""), ImageType::TrueColor);
    }

    #[test]
    fn test_matte() {
        assert!(ImageType::GrayscaleMatte.has_matte());
        assert!(!ImageType::Bilevel.has_matte());
        assert_eq!(ImageType::TrueColorMatte.without_matte(), ImageType::TrueColor);
    }

    #[test]
    fn test_colorspace_spelling() {
        assert_eq!(Colorspace::Srgb.to_string(), "sRGBColorspace");
        assert_eq!(Colorspace::Gray.as_str(), "GRAYColorspace");
        assert_eq!(Colorspace::Cmy.as_str(), "CMYColorspace");
    }
}
