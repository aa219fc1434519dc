//! `_cms`: colour profiles and transforms.

use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes};
use tracing::debug;
use uc_cms::{Bitmap, CmsError, Intent, PixelBuffer, PixelMode, Profile, Transform};
use uc_core::Handle;

use crate::{buffer_bytes, write_bytearray};

/// Register the colour module functions.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyProfile>()?;
    m.add_class::<PyTransform>()?;
    m.add_class::<PyPixelBuffer>()?;
    m.add_function(wrap_pyfunction!(get_version, m)?)?;
    m.add_function(wrap_pyfunction!(open_profile, m)?)?;
    m.add_function(wrap_pyfunction!(open_profile_from_string, m)?)?;
    m.add_function(wrap_pyfunction!(create_rgb_profile, m)?)?;
    m.add_function(wrap_pyfunction!(create_lab_profile, m)?)?;
    m.add_function(wrap_pyfunction!(create_gray_profile, m)?)?;
    m.add_function(wrap_pyfunction!(build_transform, m)?)?;
    m.add_function(wrap_pyfunction!(build_proofing_transform, m)?)?;
    m.add_function(wrap_pyfunction!(set_alarm_codes, m)?)?;
    m.add_function(wrap_pyfunction!(transform_pixel, m)?)?;
    m.add_function(wrap_pyfunction!(transform_pixel2, m)?)?;
    m.add_function(wrap_pyfunction!(transform_bitmap, m)?)?;
    m.add_function(wrap_pyfunction!(get_profile_name, m)?)?;
    m.add_function(wrap_pyfunction!(get_profile_info, m)?)?;
    m.add_function(wrap_pyfunction!(get_profile_info_copyright, m)?)?;
    m.add_function(wrap_pyfunction!(get_pixels_from_image, m)?)?;
    m.add_function(wrap_pyfunction!(set_image_pixels, m)?)?;
    m.add_function(wrap_pyfunction!(transform_pixels, m)?)?;
    Ok(())
}

fn cms_err(err: CmsError) -> PyErr {
    match err {
        CmsError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn intent(code: u32) -> PyResult<Intent> {
    Intent::from_code(code).map_err(cms_err)
}

/// ICC profile handle.
#[pyclass(unsendable, name = "Profile")]
pub struct PyProfile {
    inner: Handle<Profile>,
}

impl PyProfile {
    fn wrap(result: Result<Profile, CmsError>) -> Option<Self> {
        match result {
            Ok(profile) => Some(Self {
                inner: Handle::new(profile),
            }),
            Err(err) => {
                debug!(%err, "profile creation failed");
                None
            }
        }
    }
}

#[pymethods]
impl PyProfile {
    /// Colour space signature name.
    #[getter]
    fn color_space(&self) -> String {
        self.inner.get().color_space()
    }

    fn __repr__(&self) -> String {
        format!("Profile({:?})", self.inner.get().name())
    }
}

/// Colour transform handle.
#[pyclass(unsendable, name = "Transform")]
pub struct PyTransform {
    inner: Handle<Transform>,
}

#[pymethods]
impl PyTransform {
    fn __repr__(&self) -> String {
        let t = self.inner.get();
        format!("Transform({} -> {})", t.in_mode(), t.out_mode())
    }
}

/// Packed pixels staged for a transform.
#[pyclass(unsendable, name = "PixelBuffer")]
pub struct PyPixelBuffer {
    inner: Handle<PixelBuffer>,
}

#[pymethods]
impl PyPixelBuffer {
    /// Width in pixels.
    #[getter]
    fn width(&self) -> usize {
        self.inner.get().width()
    }

    /// Number of rows.
    #[getter]
    fn height(&self) -> usize {
        self.inner.get().height()
    }

    /// Copy of the packed bytes.
    fn tobytes<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, self.inner.get().as_bytes())
    }

    fn __len__(&self) -> usize {
        self.inner.get().as_bytes().len()
    }
}

/// Version number of the colour engine.
#[pyfunction]
#[pyo3(name = "getVersion")]
fn get_version() -> u32 {
    uc_cms::version()
}

/// Opens an ICC profile file, `None` on failure.
#[pyfunction]
#[pyo3(name = "openProfile")]
fn open_profile(path: PathBuf) -> Option<PyProfile> {
    PyProfile::wrap(Profile::open(&path))
}

/// Parses an in-memory ICC profile, `None` on failure.
#[pyfunction]
#[pyo3(name = "openProfileFromString")]
fn open_profile_from_string(data: &Bound<'_, PyAny>) -> PyResult<Option<PyProfile>> {
    let data = buffer_bytes(data)?;
    Ok(PyProfile::wrap(Profile::from_bytes(&data)))
}

/// Built-in sRGB profile.
#[pyfunction]
#[pyo3(name = "createRGBProfile")]
fn create_rgb_profile() -> Option<PyProfile> {
    PyProfile::wrap(Ok(Profile::srgb()))
}

/// Built-in CIE Lab (D50) profile.
#[pyfunction]
#[pyo3(name = "createLabProfile")]
fn create_lab_profile() -> Option<PyProfile> {
    PyProfile::wrap(Profile::lab())
}

/// Built-in gray profile (D50, gamma 2.2).
#[pyfunction]
#[pyo3(name = "createGrayProfile")]
fn create_gray_profile() -> Option<PyProfile> {
    PyProfile::wrap(Profile::gray())
}

fn wrap_transform(result: Result<Transform, CmsError>) -> Option<PyTransform> {
    match result {
        Ok(transform) => Some(PyTransform {
            inner: Handle::new(transform),
        }),
        Err(err) => {
            debug!(%err, "transform creation failed");
            None
        }
    }
}

/// Builds a transform between two profiles, `None` on failure.
///
/// Intent and flags default to the configured values. Raises `ValueError`
/// for an unknown intent code.
#[pyfunction]
#[pyo3(
    name = "buildTransform",
    signature = (input, in_mode, output, out_mode, intent_code=None, flags=None)
)]
fn build_transform(
    input: PyRef<'_, PyProfile>,
    in_mode: &str,
    output: PyRef<'_, PyProfile>,
    out_mode: &str,
    intent_code: Option<u32>,
    flags: Option<u32>,
) -> PyResult<Option<PyTransform>> {
    let defaults = uc_core::settings::current();
    let intent = intent(intent_code.unwrap_or(defaults.cms.intent))?;
    Ok(wrap_transform(Transform::new(
        input.inner.get(),
        PixelMode::from_tag(in_mode),
        output.inner.get(),
        PixelMode::from_tag(out_mode),
        intent,
        flags.unwrap_or(defaults.cms.flags),
    )))
}

/// Builds a soft-proofing transform, `None` on failure.
#[pyfunction]
#[pyo3(
    name = "buildProofingTransform",
    signature = (
        input, in_mode, output, out_mode, proof,
        intent_code=None, proof_intent_code=1, flags=None
    )
)]
#[allow(clippy::too_many_arguments)]
fn build_proofing_transform(
    input: PyRef<'_, PyProfile>,
    in_mode: &str,
    output: PyRef<'_, PyProfile>,
    out_mode: &str,
    proof: PyRef<'_, PyProfile>,
    intent_code: Option<u32>,
    proof_intent_code: u32,
    flags: Option<u32>,
) -> PyResult<Option<PyTransform>> {
    let defaults = uc_core::settings::current();
    let intent_value = intent(intent_code.unwrap_or(defaults.cms.intent))?;
    let proof_intent = intent(proof_intent_code)?;
    Ok(wrap_transform(Transform::proofing(
        input.inner.get(),
        PixelMode::from_tag(in_mode),
        output.inner.get(),
        PixelMode::from_tag(out_mode),
        proof.inner.get(),
        intent_value,
        proof_intent,
        flags.unwrap_or(defaults.cms.flags),
    )))
}

/// Sets the out-of-gamut marker colour for gamut-check transforms.
#[pyfunction]
#[pyo3(name = "setAlarmCodes")]
fn set_alarm_codes(red: u8, green: u8, blue: u8) {
    uc_cms::set_alarm_codes(red, green, blue);
}

/// Converts one pixel of byte channels.
///
/// Channels are truncated to 8 bits on the way in.
#[pyfunction]
#[pyo3(name = "transformPixel")]
fn transform_pixel(
    transform: PyRef<'_, PyTransform>,
    c1: i64,
    c2: i64,
    c3: i64,
    c4: i64,
) -> Vec<u32> {
    let channels = [c1, c2, c3, c4].map(|c| c as u8);
    transform.inner.get().transform_pixel(channels).map(u32::from).to_vec()
}

/// Converts one pixel of unit-range channels.
#[pyfunction]
#[pyo3(name = "transformPixel2")]
fn transform_pixel2(
    transform: PyRef<'_, PyTransform>,
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
) -> (f64, f64, f64, f64) {
    let [a, b, c, d] = transform.inner.get().transform_pixel_f64([c1, c2, c3, c4]);
    (a, b, c, d)
}

/// Converts the top-left `width` x `height` area of one bitmap into another.
///
/// `src` is `bytes` or `bytearray`; `dst` is a `bytearray` updated in
/// place. Strides default to packed rows for each side's pixel mode.
#[pyfunction]
#[pyo3(
    name = "transformBitmap",
    signature = (transform, src, dst, width, height, src_stride=None, dst_stride=None)
)]
#[allow(clippy::too_many_arguments)]
fn transform_bitmap(
    transform: PyRef<'_, PyTransform>,
    src: &Bound<'_, PyAny>,
    dst: &Bound<'_, PyByteArray>,
    width: usize,
    height: usize,
    src_stride: Option<usize>,
    dst_stride: Option<usize>,
) -> PyResult<()> {
    let t = transform.inner.get();
    let src_stride = src_stride.unwrap_or(width * t.in_mode().bytes_per_pixel());
    let dst_stride = dst_stride.unwrap_or(width * t.out_mode().bytes_per_pixel());
    let src = Bitmap::from_raw(buffer_bytes(src)?, width, height, src_stride).map_err(cms_err)?;
    let mut out = Bitmap::from_raw(dst.to_vec(), width, height, dst_stride).map_err(cms_err)?;
    t.transform_bitmap(&src, &mut out, width, height).map_err(cms_err)?;
    write_bytearray(dst, out.data())
}

/// Product description of a profile.
#[pyfunction]
#[pyo3(name = "getProfileName")]
fn get_profile_name(profile: PyRef<'_, PyProfile>) -> String {
    profile.inner.get().name()
}

/// Product name of a profile, falling back to its description.
#[pyfunction]
#[pyo3(name = "getProfileInfo")]
fn get_profile_info(profile: PyRef<'_, PyProfile>) -> String {
    profile.inner.get().product()
}

/// Copyright text of a profile, empty when absent.
#[pyfunction]
#[pyo3(name = "getProfileInfoCopyright")]
fn get_profile_info_copyright(profile: PyRef<'_, PyProfile>) -> String {
    profile.inner.get().copyright()
}

/// Copies the first `height` rows of `width` pixels out of an image buffer.
#[pyfunction]
#[pyo3(
    name = "getPixelsFromImage",
    signature = (image, width, height, bytes_per_pixel, stride=None)
)]
fn get_pixels_from_image(
    image: &Bound<'_, PyAny>,
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    stride: Option<usize>,
) -> PyResult<PyPixelBuffer> {
    let image = buffer_bytes(image)?;
    let stride = stride.unwrap_or(width * bytes_per_pixel);
    let pixels = uc_cms::pixels_from_image(&image, stride, width, height, bytes_per_pixel)
        .map_err(cms_err)?;
    Ok(PyPixelBuffer {
        inner: Handle::new(pixels),
    })
}

/// Copies staged pixels back into an image `bytearray`.
#[pyfunction]
#[pyo3(
    name = "setImagePixels",
    signature = (pixels, image, width, height, bytes_per_pixel, stride=None)
)]
fn set_image_pixels(
    pixels: PyRef<'_, PyPixelBuffer>,
    image: &Bound<'_, PyByteArray>,
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    stride: Option<usize>,
) -> PyResult<()> {
    let stride = stride.unwrap_or(width * bytes_per_pixel);
    let mut target = image.to_vec();
    uc_cms::set_image_pixels(
        pixels.inner.get(),
        &mut target,
        stride,
        width,
        height,
        bytes_per_pixel,
    )
    .map_err(cms_err)?;
    write_bytearray(image, &target)
}

/// Converts the first `width` staged pixels into a new buffer.
#[pyfunction]
#[pyo3(name = "transformPixels")]
fn transform_pixels(
    transform: PyRef<'_, PyTransform>,
    pixels: PyRef<'_, PyPixelBuffer>,
    width: usize,
) -> PyResult<PyPixelBuffer> {
    let out = transform
        .inner
        .get()
        .transform_pixels(pixels.inner.get(), width)
        .map_err(cms_err)?;
    Ok(PyPixelBuffer {
        inner: Handle::new(out),
    })
}
