//! Byte bitmaps and detached pixel buffers.
//!
//! A [`Bitmap`] is a row-strided 8-bit image owned by the caller. A
//! [`PixelBuffer`] is a tightly packed copy of part of one, used to stage
//! pixels through a transform and copy them back.

use tracing::trace;

use crate::{CmsError, CmsResult};

/// Row-strided byte image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<u8>,
    width: usize,
    height: usize,
    stride: usize,
}

impl Bitmap {
    /// Zeroed bitmap with packed rows.
    pub fn new(width: usize, height: usize, bytes_per_pixel: usize) -> Self {
        let stride = width * bytes_per_pixel;
        Self {
            data: vec![0; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Wraps existing bytes. `stride` is the distance between rows.
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize, stride: usize) -> CmsResult<Self> {
        CmsError::check_rows("bitmap", height, stride, stride, data.len())?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw bytes, mutable.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Row `y`, `stride` bytes long.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.stride..(y + 1) * self.stride]
    }

    /// Consumes the bitmap, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Packed pixel copy detached from any bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
}

impl PixelBuffer {
    pub(crate) fn from_vec(
        data: Vec<u8>,
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Wraps packed bytes supplied by the caller.
    pub fn from_bytes(data: Vec<u8>, width: usize, bytes_per_pixel: usize) -> CmsResult<Self> {
        let row = CmsError::bytes("pixel row", width, bytes_per_pixel, data.len())?;
        let height = if row == 0 { 0 } else { data.len() / row };
        Ok(Self::from_vec(data, width, height, bytes_per_pixel))
    }

    /// Packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Consumes the buffer, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Copies the top `height` rows of `width` pixels out of a strided image.
pub fn pixels_from_image(
    image: &[u8],
    stride: usize,
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> CmsResult<PixelBuffer> {
    trace!(width, height, bytes_per_pixel, "pixels_from_image");
    let row = CmsError::bytes("image row", width, bytes_per_pixel, stride)?;
    if height > 0 {
        CmsError::check_len("image row", row, stride)?;
        CmsError::check_rows("image", height, stride, row, image.len())?;
    }
    let mut data = Vec::with_capacity(row * height);
    for y in 0..height {
        data.extend_from_slice(&image[y * stride..y * stride + row]);
    }
    Ok(PixelBuffer::from_vec(data, width, height, bytes_per_pixel))
}

/// Copies packed pixels back into the top `height` rows of a strided image.
pub fn set_image_pixels(
    pixels: &PixelBuffer,
    image: &mut [u8],
    stride: usize,
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> CmsResult<()> {
    trace!(width, height, bytes_per_pixel, "set_image_pixels");
    let row = CmsError::bytes("image row", width, bytes_per_pixel, stride)?;
    let needed = CmsError::bytes("pixels", row, height, pixels.data.len())?;
    CmsError::check_len("pixels", needed, pixels.data.len())?;
    if height > 0 {
        CmsError::check_len("image row", row, stride)?;
        CmsError::check_rows("image", height, stride, row, image.len())?;
    }
    for y in 0..height {
        image[y * stride..y * stride + row].copy_from_slice(&pixels.data[y * row..(y + 1) * row]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_out_skips_padding() {
        // 2x2 RGB with one padding byte per row.
        let image = [1, 2, 3, 4, 5, 6, 0xFF, 7, 8, 9, 10, 11, 12, 0xFF];
        let px = pixels_from_image(&image, 7, 2, 2, 3).unwrap();
        assert_eq!(px.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(px.height(), 2);
    }

    #[test]
    fn test_copy_back_keeps_padding() {
        let px = PixelBuffer::from_bytes(vec![9; 4], 2, 1).unwrap();
        let mut image = [0u8; 6];
        set_image_pixels(&px, &mut image, 3, 2, 2, 1).unwrap();
        assert_eq!(image, [9, 9, 0, 9, 9, 0]);
    }

    #[test]
    fn test_short_image() {
        let err = pixels_from_image(&[0; 10], 4, 4, 3, 1).unwrap_err();
        assert!(matches!(err, CmsError::BufferSize { needed: 12, actual: 10, .. }));
    }

    #[test]
    fn test_oversized_dimensions() {
        let huge = usize::MAX / 2;
        assert!(matches!(
            pixels_from_image(&[0; 8], huge, huge, 2, 4),
            Err(CmsError::BufferSize { .. })
        ));
        assert!(Bitmap::from_raw(vec![0; 4], 1, huge, 4).is_err());
        assert!(PixelBuffer::from_bytes(vec![0; 4], huge, 4).is_err());
        let px = PixelBuffer::from_bytes(vec![0; 4], 4, 1).unwrap();
        let mut image = [0u8; 4];
        assert!(set_image_pixels(&px, &mut image, 4, 4, huge, 1).is_err());
    }

    #[test]
    fn test_short_pixels() {
        let px = PixelBuffer::from_bytes(vec![0; 3], 2, 1).unwrap();
        let mut image = [0u8; 8];
        assert!(set_image_pixels(&px, &mut image, 4, 2, 2, 1).is_err());
    }

    #[test]
    fn test_bitmap_rows() {
        let bmp = Bitmap::from_raw((0..8).collect(), 1, 2, 4).unwrap();
        assert_eq!(bmp.row(1), &[4, 5, 6, 7]);
        assert!(Bitmap::from_raw(vec![0; 7], 1, 2, 4).is_err());
    }
}
