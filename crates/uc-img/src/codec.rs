//! Format detection, decoding and encoding through the `image` crate.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{AnimationDecoder, DynamicImage, ImageError, ImageFormat};
use tracing::{debug, trace};

use crate::{Frame, ImgError, ImgResult};

/// Formats this toolkit reads and writes.
pub const SUPPORTED: [ImageFormat; 8] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Tiff,
    ImageFormat::Bmp,
    ImageFormat::WebP,
    ImageFormat::Ico,
    ImageFormat::Pnm,
];

/// Resolves a format tag such as `"PNG"`, `"jpg"` or `"TIFF"`.
pub fn format_from_tag(tag: &str) -> Option<ImageFormat> {
    let format = ImageFormat::from_extension(tag.trim().to_ascii_lowercase())?;
    SUPPORTED.contains(&format).then_some(format)
}

/// Canonical upper-case tag of a format.
pub fn format_tag(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Pnm => "PNM",
        _ => "UNKNOWN",
    }
}

/// Format implied by a file extension.
pub fn format_from_path(path: &Path) -> Option<ImageFormat> {
    let format = ImageFormat::from_path(path).ok()?;
    SUPPORTED.contains(&format).then_some(format)
}

/// Decodes every frame in `bytes`.
///
/// The format is sniffed from the content, falling back to `hint`.
pub(crate) fn decode(
    bytes: &[u8],
    hint: Option<ImageFormat>,
    name: &str,
) -> ImgResult<(ImageFormat, Vec<Frame>)> {
    let format = image::guess_format(bytes)
        .ok()
        .or(hint)
        .ok_or_else(|| ImgError::decode(name, "unrecognised image data"))?;
    trace!(source = name, ?format, len = bytes.len(), "decode");

    if format == ImageFormat::Gif {
        let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(|e| ImgError::decode(name, e))?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| ImgError::decode(name, e))?;
        debug!(source = name, frames = frames.len(), "gif decoded");
        return Ok((format, frames.into_iter().map(Frame::from_animation).collect()));
    }

    let image =
        image::load_from_memory_with_format(bytes, format).map_err(|e| ImgError::decode(name, e))?;
    Ok((format, vec![Frame::new(image)]))
}

/// Encodes `frames` as `format`.
///
/// GIF stores every frame; other formats store the first one.
pub(crate) fn encode(frames: &[Frame], format: ImageFormat, jpeg_quality: u8) -> ImgResult<Vec<u8>> {
    let first = frames.first().ok_or(ImgError::NoImages)?;
    trace!(?format, frames = frames.len(), "encode");
    let mut out = Vec::new();

    match format {
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut out);
            if frames.len() > 1 {
                encoder
                    .set_repeat(Repeat::Infinite)
                    .map_err(|e| ImgError::encode(format, e))?;
            }
            encoder
                .encode_frames(frames.iter().map(Frame::to_animation))
                .map_err(|e| ImgError::encode(format, e))?;
        }
        ImageFormat::Jpeg => {
            // JPEG has no alpha.
            let rgb = DynamicImage::ImageRgb8(first.image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
                .map_err(|e| ImgError::encode(format, e))?;
        }
        _ => {
            if let Err(err) = first.image.write_to(&mut Cursor::new(&mut out), format) {
                if !matches!(err, ImageError::Unsupported(_)) {
                    return Err(ImgError::encode(format, err));
                }
                debug!(?format, color = ?first.image.color(), "retrying as 8-bit RGBA");
                out.clear();
                DynamicImage::ImageRgba8(first.image.to_rgba8())
                    .write_to(&mut Cursor::new(&mut out), format)
                    .map_err(|e| ImgError::encode(format, e))?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(format_from_tag("PNG"), Some(ImageFormat::Png));
        assert_eq!(format_from_tag("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(format_from_tag("TIF"), Some(ImageFormat::Tiff));
        assert_eq!(format_from_tag("XCF"), None);
        assert_eq!(format_tag(ImageFormat::WebP), "WEBP");
    }

    #[test]
    fn test_path_format() {
        assert_eq!(format_from_path(Path::new("a/b.GIF")), Some(ImageFormat::Gif));
        assert_eq!(format_from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(decode(b"hello", None, "<blob>"), Err(ImgError::Decode { .. })));
    }

    #[test]
    fn test_png_bytes() {
        let frame = Frame::new(DynamicImage::new_rgba8(3, 2));
        let bytes = encode(&[frame], ImageFormat::Png, 90).unwrap();
        let (format, frames) = decode(&bytes, None, "<blob>").unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].image.width(), 3);
    }
}
