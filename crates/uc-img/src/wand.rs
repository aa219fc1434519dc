//! Wands: ordered frame lists with a current-image cursor.

use std::collections::HashSet;
use std::path::Path;

use image::{Delay, DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use tracing::{debug, trace};

use crate::codec::{self, format_from_path, format_from_tag};
use crate::{Colorspace, ImageType, ImgError, ImgResult};

/// One image in a wand, with its page offset on the virtual canvas.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixels.
    pub image: DynamicImage,
    /// Page offset, x.
    pub left: u32,
    /// Page offset, y.
    pub top: u32,
    /// Animation delay.
    pub delay: Delay,
    colorspace: Colorspace,
    explicit_type: Option<ImageType>,
    source_format: Option<ImageFormat>,
}

impl Frame {
    /// Frame at the canvas origin.
    pub fn new(image: DynamicImage) -> Self {
        let colorspace = if image.color().has_color() {
            Colorspace::Srgb
        } else {
            Colorspace::Gray
        };
        Self {
            image,
            left: 0,
            top: 0,
            delay: Delay::from_numer_denom_ms(0, 1),
            colorspace,
            explicit_type: None,
            source_format: None,
        }
    }

    pub(crate) fn from_animation(frame: image::Frame) -> Self {
        let (left, top, delay) = (frame.left(), frame.top(), frame.delay());
        Self {
            left,
            top,
            delay,
            ..Self::new(DynamicImage::ImageRgba8(frame.into_buffer()))
        }
    }

    pub(crate) fn to_animation(&self) -> image::Frame {
        image::Frame::from_parts(self.image.to_rgba8(), self.left, self.top, self.delay)
    }

    /// Colour model.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Format the frame was decoded from.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Image class. A type set through [`Frame::set_type`] wins over
    /// inspection of the pixels.
    pub fn image_type(&self) -> ImageType {
        if let Some(ty) = self.explicit_type {
            return ty;
        }
        let matte = self.image.color().has_alpha();
        let pick = |plain, with_alpha| if matte { with_alpha } else { plain };

        if self.colorspace == Colorspace::Cmyk {
            return pick(ImageType::ColorSeparation, ImageType::ColorSeparationMatte);
        }

        let rgba = self.image.to_rgba8();
        let is_gray = !self.image.color().has_color()
            || rgba.pixels().all(|p| p[0] == p[1] && p[1] == p[2]);
        if is_gray {
            if rgba.pixels().all(|p| p[0] == 0 || p[0] == u8::MAX) {
                return ImageType::Bilevel;
            }
            return pick(ImageType::Grayscale, ImageType::GrayscaleMatte);
        }

        let mut colours = HashSet::new();
        let few = rgba.pixels().all(|p| {
            colours.insert(p.0);
            colours.len() <= 256
        });
        if few {
            pick(ImageType::Palette, ImageType::PaletteMatte)
        } else {
            pick(ImageType::TrueColor, ImageType::TrueColorMatte)
        }
    }

    /// Converts the pixels to the requested class.
    ///
    /// Palette types keep the pixels as they are; separation types only
    /// mark the frame as CMYK. Classes that cannot be requested by name
    /// convert to `TrueColor`, the same as [`ImageType::parse`].
    pub fn set_type(&mut self, ty: ImageType) {
        trace!(ty = %ty, "Frame::set_type");
        let ty = ImageType::parse(ty.as_str());
        let img = &self.image;
        let (image, colorspace) = match ty {
            ImageType::Bilevel => (DynamicImage::ImageLuma8(threshold(img.to_luma8())), Colorspace::Gray),
            ImageType::Grayscale => (DynamicImage::ImageLuma8(img.to_luma8()), Colorspace::Gray),
            ImageType::GrayscaleMatte => {
                (DynamicImage::ImageLumaA8(img.to_luma_alpha8()), Colorspace::Gray)
            }
            ImageType::PaletteMatte | ImageType::TrueColorMatte => {
                (DynamicImage::ImageRgba8(img.to_rgba8()), Colorspace::Srgb)
            }
            ImageType::ColorSeparation => (DynamicImage::ImageRgb8(img.to_rgb8()), Colorspace::Cmyk),
            ImageType::ColorSeparationMatte => {
                (DynamicImage::ImageRgba8(img.to_rgba8()), Colorspace::Cmyk)
            }
            // Palette and TrueColor
            _ => (DynamicImage::ImageRgb8(img.to_rgb8()), Colorspace::Srgb),
        };
        self.image = image;
        self.colorspace = colorspace;
        self.explicit_type = Some(ty);
    }

    /// Drops the alpha channel, keeping depth and colour model.
    pub fn remove_alpha(&mut self) {
        let image = match &self.image {
            DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLuma8(self.image.to_luma8()),
            DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma16(self.image.to_luma16()),
            DynamicImage::ImageRgba8(_) => DynamicImage::ImageRgb8(self.image.to_rgb8()),
            DynamicImage::ImageRgba16(_) => DynamicImage::ImageRgb16(self.image.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgb32F(self.image.to_rgb32f()),
            _ => return,
        };
        self.image = image;
        self.explicit_type = self.explicit_type.map(ImageType::without_matte);
    }
}

fn threshold(mut gray: image::GrayImage) -> image::GrayImage {
    for p in gray.pixels_mut() {
        p[0] = if p[0] >= 128 { u8::MAX } else { 0 };
    }
    gray
}

/// An ordered list of frames with a cursor and an optional output format.
///
/// # Example
///
/// ```rust
/// use image::DynamicImage;
/// use uc_img::{Frame, Wand};
///
/// let mut wand = Wand::new();
/// wand.push(Frame::new(DynamicImage::new_rgb8(4, 4)));
/// wand.push(Frame::new(DynamicImage::new_rgba8(2, 2)));
/// wand.reset_iterator();
/// assert!(wand.next_image());
/// assert!(!wand.next_image());
/// assert_eq!(wand.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Wand {
    frames: Vec<Frame>,
    cursor: usize,
    format: Option<ImageFormat>,
}

impl Wand {
    /// Empty wand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame and makes it current.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
        self.cursor = self.frames.len() - 1;
    }

    fn append(&mut self, format: ImageFormat, frames: Vec<Frame>) {
        for mut frame in frames {
            frame.source_format = Some(format);
            self.push(frame);
        }
    }

    /// Reads every frame of an image file and appends them.
    ///
    /// The last frame read becomes current.
    pub fn load(&mut self, path: impl AsRef<Path>) -> ImgResult<()> {
        let path = path.as_ref();
        trace!(path = %path.display(), "Wand::load");
        let bytes = std::fs::read(path)?;
        let name = path.display().to_string();
        let (format, frames) = codec::decode(&bytes, format_from_path(path), &name)?;
        debug!(path = %name, ?format, frames = frames.len(), "image loaded");
        self.append(format, frames);
        Ok(())
    }

    /// Reads every frame of an in-memory image and appends them.
    pub fn load_blob(&mut self, bytes: &[u8]) -> ImgResult<()> {
        trace!(len = bytes.len(), "Wand::load_blob");
        let (format, frames) = codec::decode(bytes, None, "<blob>")?;
        self.append(format, frames);
        Ok(())
    }

    /// Composites all frames, in order and at their page offsets, into a
    /// single frame just large enough to hold them.
    ///
    /// Resets the cursor to the first frame.
    pub fn merge_layers(&mut self) -> ImgResult<Wand> {
        trace!(frames = self.frames.len(), "Wand::merge_layers");
        self.reset_iterator();
        let first = self.frames.first().ok_or(ImgError::NoImages)?;

        let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0u32, 0u32);
        for f in &self.frames {
            x0 = x0.min(f.left);
            y0 = y0.min(f.top);
            x1 = x1.max(f.left.saturating_add(f.image.width()));
            y1 = y1.max(f.top.saturating_add(f.image.height()));
        }

        let mut canvas = RgbaImage::from_pixel(x1 - x0, y1 - y0, Rgba([0, 0, 0, 0]));
        for f in &self.frames {
            let layer = f.image.to_rgba8();
            imageops::overlay(
                &mut canvas,
                &layer,
                i64::from(f.left - x0),
                i64::from(f.top - y0),
            );
        }

        let mut merged = Frame::new(DynamicImage::ImageRgba8(canvas));
        merged.left = x0;
        merged.top = y0;
        merged.source_format = first.source_format;

        let mut wand = Wand::new();
        wand.format = self.format;
        wand.push(merged);
        Ok(wand)
    }

    fn output_format(&self, path: Option<&Path>) -> Option<ImageFormat> {
        path.and_then(format_from_path)
            .or(self.format)
            .or_else(|| self.frames.iter().find_map(|f| f.source_format))
    }

    /// Writes all frames to `path`.
    ///
    /// The extension picks the format, else the wand's format. GIF keeps
    /// every frame; other formats keep the first.
    pub fn write(&self, path: impl AsRef<Path>) -> ImgResult<()> {
        let path = path.as_ref();
        trace!(path = %path.display(), frames = self.frames.len(), "Wand::write");
        let format = self
            .output_format(Some(path))
            .ok_or_else(|| ImgError::UnknownFormat(path.to_path_buf()))?;
        let bytes = codec::encode(&self.frames, format, uc_core::settings::current().img.jpeg_quality)?;
        std::fs::write(path, bytes)?;
        debug!(path = %path.display(), ?format, "image written");
        Ok(())
    }

    /// Encodes all frames in the wand's format.
    ///
    /// Falls back to the decoded format, then to the configured blob format.
    pub fn blob(&self) -> ImgResult<Vec<u8>> {
        let settings = uc_core::settings::current();
        let format = match self.output_format(None) {
            Some(format) => format,
            None => format_from_tag(&settings.img.blob_format)
                .ok_or_else(|| ImgError::UnknownFormatTag(settings.img.blob_format.clone()))?,
        };
        codec::encode(&self.frames, format, settings.img.jpeg_quality)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the wand holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Moves the cursor to the first frame.
    pub fn reset_iterator(&mut self) {
        self.cursor = 0;
    }

    /// Advances the cursor. Returns `false` at the last frame.
    pub fn next_image(&mut self) -> bool {
        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Index of the current frame.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// The current frame.
    pub fn current(&self) -> ImgResult<&Frame> {
        self.frames.get(self.cursor).ok_or(ImgError::NoImages)
    }

    fn current_mut(&mut self) -> ImgResult<&mut Frame> {
        self.frames.get_mut(self.cursor).ok_or(ImgError::NoImages)
    }

    /// Type of the current frame, `UndefinedType` for an empty wand.
    pub fn image_type(&self) -> ImageType {
        self.current().map_or(ImageType::Undefined, Frame::image_type)
    }

    /// Colourspace of the current frame, undefined for an empty wand.
    pub fn colorspace(&self) -> Colorspace {
        self.current().map_or(Colorspace::Undefined, Frame::colorspace)
    }

    /// Output format, if one was set.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Sets the output format from a tag such as `"PNG"`.
    pub fn set_format(&mut self, tag: &str) -> ImgResult<()> {
        let format = format_from_tag(tag).ok_or_else(|| ImgError::UnknownFormatTag(tag.into()))?;
        self.format = Some(format);
        Ok(())
    }

    /// Converts the current frame to `ty`.
    pub fn set_type(&mut self, ty: ImageType) -> ImgResult<()> {
        self.current_mut()?.set_type(ty);
        Ok(())
    }

    /// Drops alpha from the current frame.
    pub fn remove_alpha(&mut self) -> ImgResult<()> {
        self.current_mut()?.remove_alpha();
        Ok(())
    }
}

impl uc_core::NativeResource for Wand {
    const KIND: &'static str = "MagickWand";
}
