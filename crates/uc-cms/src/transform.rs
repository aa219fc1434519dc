//! Colour transforms between ICC profiles.
//!
//! The engine checks that the Rust pixel type matches the declared pixel
//! format size, so a transform is built for a concrete `[u8; N]` pair
//! chosen from the two [`PixelMode`]s and then used through a byte-slice
//! interface.

use lcms2::{Flags, Transform as LcmsTransform};
use tracing::{debug, trace};

use crate::{Bitmap, CmsError, CmsResult, Intent, PixelBuffer, PixelMode, Profile};

/// Transform flag bits accepted by [`Transform::new`].
///
/// Values are the engine's own `cmsFLAGS_*` bits, so integer flags coming
/// from callers can be passed through unchanged. Bits without a mapping
/// here are ignored.
pub mod flags {
    /// Disable the one-pixel cache (always implied by the transform type).
    pub const NOCACHE: u32 = 0x0040;
    /// Keep the full-precision pipeline.
    pub const NOOPTIMIZE: u32 = 0x0100;
    /// Mark out-of-gamut colours with the alarm codes.
    pub const GAMUTCHECK: u32 = 0x1000;
    /// Emulate the proofing device.
    pub const SOFTPROOFING: u32 = 0x4000;
    /// Black point compensation.
    pub const BLACKPOINTCOMPENSATION: u32 = 0x2000;
}

fn engine_flags(bits: u32) -> Option<Flags> {
    let table = [
        (flags::NOOPTIMIZE, Flags::NO_OPTIMIZE),
        (flags::GAMUTCHECK, Flags::GAMUT_CHECK),
        (flags::SOFTPROOFING, Flags::SOFT_PROOFING),
        (flags::BLACKPOINTCOMPENSATION, Flags::BLACKPOINT_COMPENSATION),
    ];
    table
        .into_iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, flag)| flag)
        .reduce(|a, b| a | b)
}

/// Sets the colour used to mark out-of-gamut pixels in gamut-check
/// transforms. Process-wide; affects transforms built afterwards.
pub fn set_alarm_codes(red: u8, green: u8, blue: u8) {
    debug!(red, green, blue, "set_alarm_codes");
    let mut codes = [0u16; 16];
    // Alarm codes are 16-bit; scale 8-bit input to the full range.
    codes[0] = u16::from(red) * 257;
    codes[1] = u16::from(green) * 257;
    codes[2] = u16::from(blue) * 257;
    // SAFETY: the engine copies the 16 codes out of the array before
    // returning; the pointer does not outlive the call.
    unsafe { lcms2_sys::cmsSetAlarmCodes(codes.as_ptr()) }
}

/// Byte-level view of a typed engine transform.
trait RawTransform {
    /// Converts `pixels` pixels from `src` into `dst`.
    fn run(&self, src: &[u8], dst: &mut [u8], pixels: usize);
}

impl<const I: usize, const O: usize> RawTransform for LcmsTransform<[u8; I], [u8; O]> {
    fn run(&self, src: &[u8], dst: &mut [u8], pixels: usize) {
        let src: &[[u8; I]] = bytemuck::cast_slice(&src[..pixels * I]);
        let dst: &mut [[u8; O]] = bytemuck::cast_slice_mut(&mut dst[..pixels * O]);
        self.transform_pixels(src, dst);
    }
}

struct Request<'a> {
    input: &'a Profile,
    in_mode: PixelMode,
    output: &'a Profile,
    out_mode: PixelMode,
    intent: Intent,
    flags: u32,
    proofing: Option<(&'a Profile, Intent)>,
}

type Built = CmsResult<Box<dyn RawTransform>>;

fn build_for_input(req: &Request<'_>) -> Built {
    match req.in_mode.bytes_per_pixel() {
        1 => build_for_output::<1>(req),
        2 => build_for_output::<2>(req),
        3 => build_for_output::<3>(req),
        4 => build_for_output::<4>(req),
        8 => build_for_output::<8>(req),
        n => Err(CmsError::TransformFailed(format!("unsupported pixel size {n}"))),
    }
}

fn build_for_output<const I: usize>(req: &Request<'_>) -> Built {
    match req.out_mode.bytes_per_pixel() {
        1 => build::<I, 1>(req),
        2 => build::<I, 2>(req),
        3 => build::<I, 3>(req),
        4 => build::<I, 4>(req),
        8 => build::<I, 8>(req),
        n => Err(CmsError::TransformFailed(format!("unsupported pixel size {n}"))),
    }
}

fn build<const I: usize, const O: usize>(req: &Request<'_>) -> Built {
    let in_format = req.in_mode.format();
    let out_format = req.out_mode.format();
    let result = match req.proofing {
        Some((proof, proof_intent)) => {
            let flags =
                engine_flags(req.flags | flags::SOFTPROOFING).unwrap_or(Flags::SOFT_PROOFING);
            LcmsTransform::<[u8; I], [u8; O]>::new_proofing(
                &req.input.inner,
                in_format,
                &req.output.inner,
                out_format,
                &proof.inner,
                req.intent.into(),
                proof_intent.into(),
                flags,
            )
        }
        None => match engine_flags(req.flags) {
            Some(flags) => LcmsTransform::<[u8; I], [u8; O]>::new_flags(
                &req.input.inner,
                in_format,
                &req.output.inner,
                out_format,
                req.intent.into(),
                flags,
            ),
            None => LcmsTransform::<[u8; I], [u8; O]>::new(
                &req.input.inner,
                in_format,
                &req.output.inner,
                out_format,
                req.intent.into(),
            ),
        },
    };
    let inner = result.map_err(|e| CmsError::TransformFailed(e.to_string()))?;
    Ok(Box::new(inner))
}

/// A colour transform between two profiles and pixel modes.
///
/// # Example
///
/// ```rust
/// use uc_cms::{Intent, PixelMode, Profile, Transform};
///
/// let srgb = Profile::srgb();
/// let t = Transform::new(&srgb, PixelMode::Rgba, &srgb, PixelMode::Rgba, Intent::Perceptual, 0)
///     .unwrap();
/// let [r, _, _, alpha] = t.transform_pixel([200, 20, 30, 77]);
/// assert!(r.abs_diff(200) <= 1);
/// assert_eq!(alpha, 77);
/// ```
pub struct Transform {
    inner: Box<dyn RawTransform>,
    in_mode: PixelMode,
    out_mode: PixelMode,
}

impl Transform {
    /// Builds a transform from `input` to `output`.
    ///
    /// `flags` is a combination of [`flags`] bits.
    pub fn new(
        input: &Profile,
        in_mode: PixelMode,
        output: &Profile,
        out_mode: PixelMode,
        intent: Intent,
        flags: u32,
    ) -> CmsResult<Self> {
        trace!(%in_mode, %out_mode, ?intent, flags, "Transform::new");
        let req = Request {
            input,
            in_mode,
            output,
            out_mode,
            intent,
            flags,
            proofing: None,
        };
        Ok(Self {
            inner: build_for_input(&req)?,
            in_mode,
            out_mode,
        })
    }

    /// Builds a soft-proofing transform that emulates `proof` on `output`.
    ///
    /// [`flags::SOFTPROOFING`] is always added.
    #[allow(clippy::too_many_arguments)]
    pub fn proofing(
        input: &Profile,
        in_mode: PixelMode,
        output: &Profile,
        out_mode: PixelMode,
        proof: &Profile,
        intent: Intent,
        proof_intent: Intent,
        flags: u32,
    ) -> CmsResult<Self> {
        trace!(%in_mode, %out_mode, ?intent, ?proof_intent, flags, "Transform::proofing");
        let req = Request {
            input,
            in_mode,
            output,
            out_mode,
            intent,
            flags,
            proofing: Some((proof, proof_intent)),
        };
        Ok(Self {
            inner: build_for_input(&req)?,
            in_mode,
            out_mode,
        })
    }

    /// Input pixel mode.
    pub fn in_mode(&self) -> PixelMode {
        self.in_mode
    }

    /// Output pixel mode.
    pub fn out_mode(&self) -> PixelMode {
        self.out_mode
    }

    /// Converts one pixel given as four byte channels.
    ///
    /// Channels beyond the input layout are ignored; output channels beyond
    /// the output layout keep their input values.
    pub fn transform_pixel(&self, channels: [u8; 4]) -> [u8; 4] {
        let len = 4.max(self.in_mode.bytes_per_pixel()).max(self.out_mode.bytes_per_pixel());
        let mut src = vec![0u8; len];
        src[..4].copy_from_slice(&channels);
        let mut dst = src.clone();
        self.inner.run(&src, &mut dst, 1);
        [dst[0], dst[1], dst[2], dst[3]]
    }

    /// Converts one pixel given as four unit-range channels.
    ///
    /// Each channel is scaled by 255 and truncated on the way in, and
    /// divided by 255 on the way out.
    pub fn transform_pixel_f64(&self, channels: [f64; 4]) -> [f64; 4] {
        let bytes = channels.map(|c| (c * 255.0) as u8);
        self.transform_pixel(bytes).map(|b| f64::from(b) / 255.0)
    }

    /// Converts a contiguous run of pixels.
    pub fn transform_slice(&self, src: &[u8], dst: &mut [u8], pixels: usize) -> CmsResult<()> {
        let needed = CmsError::bytes("source", pixels, self.in_mode.bytes_per_pixel(), src.len())?;
        CmsError::check_len("source", needed, src.len())?;
        let needed = CmsError::bytes("destination", pixels, self.out_mode.bytes_per_pixel(), dst.len())?;
        CmsError::check_len("destination", needed, dst.len())?;
        self.inner.run(src, dst, pixels);
        Ok(())
    }

    /// Converts `height` rows of `width` pixels between strided buffers.
    #[allow(clippy::too_many_arguments)]
    pub fn transform_rows(
        &self,
        src: &[u8],
        src_stride: usize,
        dst: &mut [u8],
        dst_stride: usize,
        width: usize,
        height: usize,
    ) -> CmsResult<()> {
        trace!(width, height, "Transform::transform_rows");
        if height == 0 || width == 0 {
            return Ok(());
        }
        let in_row = CmsError::bytes("source row", width, self.in_mode.bytes_per_pixel(), src_stride)?;
        let out_row =
            CmsError::bytes("destination row", width, self.out_mode.bytes_per_pixel(), dst_stride)?;
        CmsError::check_len("source row", in_row, src_stride)?;
        CmsError::check_len("destination row", out_row, dst_stride)?;
        CmsError::check_rows("source", height, src_stride, in_row, src.len())?;
        CmsError::check_rows("destination", height, dst_stride, out_row, dst.len())?;
        for row in 0..height {
            let s = &src[row * src_stride..row * src_stride + in_row];
            let d = &mut dst[row * dst_stride..row * dst_stride + out_row];
            self.inner.run(s, d, width);
        }
        Ok(())
    }

    /// Converts the top-left `width` x `height` area of `src` into `dst`.
    pub fn transform_bitmap(
        &self,
        src: &Bitmap,
        dst: &mut Bitmap,
        width: usize,
        height: usize,
    ) -> CmsResult<()> {
        let dst_stride = dst.stride();
        self.transform_rows(src.data(), src.stride(), dst.data_mut(), dst_stride, width, height)
    }

    /// Converts the first `width` pixels of a pixel buffer into a new one.
    ///
    /// The result is at least four bytes per pixel wide, zero padded when
    /// the output layout is narrower.
    pub fn transform_pixels(&self, pixels: &PixelBuffer, width: usize) -> CmsResult<PixelBuffer> {
        trace!(width, "Transform::transform_pixels");
        let out_bpp = self.out_mode.bytes_per_pixel();
        let src_len = pixels.as_bytes().len();
        let needed = CmsError::bytes("source", width, self.in_mode.bytes_per_pixel(), src_len)?;
        CmsError::check_len("source", needed, src_len)?;
        let mut out = vec![0u8; CmsError::bytes("destination", width, out_bpp.max(4), 0)?];
        self.transform_slice(pixels.as_bytes(), &mut out, width)?;
        Ok(PixelBuffer::from_vec(out, width, 1, out_bpp.max(4)))
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("in_mode", &self.in_mode)
            .field("out_mode", &self.out_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn srgb_to(out: &Profile, out_mode: PixelMode) -> Transform {
        Transform::new(&Profile::srgb(), PixelMode::Rgba, out, out_mode, Intent::Perceptual, 0)
            .unwrap()
    }

    #[test]
    fn test_identity_pixel() {
        let t = srgb_to(&Profile::srgb(), PixelMode::Rgba);
        let out = t.transform_pixel([200, 100, 50, 7]);
        for (a, b) in out[..3].iter().zip([200u8, 100, 50]) {
            assert!((i16::from(*a) - i16::from(b)).abs() <= 1);
        }
    }

    #[test]
    fn test_gray_output_keeps_tail() {
        let t = srgb_to(&Profile::gray().unwrap(), PixelMode::Gray8);
        let out = t.transform_pixel([255, 255, 255, 9]);
        assert!(out[0] >= 254);
        // Only the first byte is written by a one-byte layout.
        assert_eq!(out[1..], [255, 255, 9]);
    }

    #[test]
    fn test_float_pixel() {
        let t = srgb_to(&Profile::srgb(), PixelMode::Rgba);
        let out = t.transform_pixel_f64([1.0, 0.0, 0.5, 0.0]);
        assert_abs_diff_eq!(out[0], 1.0, epsilon = 0.01);
        assert_abs_diff_eq!(out[1], 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(out[2], 127.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_lab_target() {
        let to_lab = srgb_to(&Profile::lab().unwrap(), PixelMode::Lab);
        let white = to_lab.transform_pixel([255, 255, 255, 0]);
        assert!(white[0] > 250);
        // a* and b* of neutral white sit at the 128 midpoint.
        assert!((i16::from(white[1]) - 128).abs() <= 2);
    }

    #[test]
    fn test_rows_with_stride() {
        let t = srgb_to(&Profile::gray().unwrap(), PixelMode::Gray8);
        let src = [255u8, 255, 255, 0, 0xAA, 0xAA, 0, 0, 0, 0, 0xAA, 0xAA];
        let mut dst = [7u8; 4];
        t.transform_rows(&src, 6, &mut dst, 2, 1, 2).unwrap();
        assert!(dst[0] >= 254);
        assert_eq!(dst[1], 7);
        assert_eq!(dst[2], 0);
    }

    #[test]
    fn test_rows_short_buffer() {
        let t = srgb_to(&Profile::srgb(), PixelMode::Rgba);
        let src = [0u8; 12];
        let mut dst = [0u8; 16];
        let err = t.transform_rows(&src, 8, &mut dst, 8, 2, 2).unwrap_err();
        assert!(matches!(err, CmsError::BufferSize { what: "source", .. }));
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        let t = srgb_to(&Profile::srgb(), PixelMode::Rgba);
        let src = [0u8; 16];
        let mut dst = [0u8; 16];
        let huge = usize::MAX / 2;
        let size_err = |r: CmsResult<()>| matches!(r, Err(CmsError::BufferSize { .. }));

        assert!(size_err(t.transform_slice(&src, &mut dst, huge)));
        assert!(size_err(t.transform_rows(&src, 16, &mut dst, 16, huge, 1)));
        // Row fits its stride, but the rows together overflow.
        assert!(size_err(t.transform_rows(&src, huge, &mut dst, huge, 1, 4)));

        let buf = PixelBuffer::from_bytes(src.to_vec(), 4, 4).unwrap();
        assert!(matches!(t.transform_pixels(&buf, huge), Err(CmsError::BufferSize { .. })));
    }

    #[test]
    fn test_proofing_builds() {
        let srgb = Profile::srgb();
        let gray = Profile::gray().unwrap();
        let t = Transform::proofing(
            &srgb,
            PixelMode::Rgba,
            &srgb,
            PixelMode::Rgba,
            &gray,
            Intent::Perceptual,
            Intent::RelativeColorimetric,
            flags::GAMUTCHECK,
        )
        .unwrap();
        let out = t.transform_pixel([255, 255, 255, 0]);
        assert!(out[..3].iter().all(|&c| c > 240));
    }

    #[test]
    fn test_engine_flags() {
        assert!(engine_flags(0).is_none());
        assert!(engine_flags(flags::NOCACHE).is_none());
        assert!(engine_flags(flags::BLACKPOINTCOMPENSATION | flags::NOOPTIMIZE).is_some());
    }
}
