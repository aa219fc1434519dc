//! `_libimg`: image wands.
//!
//! Every wand call checks that the toolkit is live and that the wand was
//! created in the current toolkit generation; either failure raises
//! `RuntimeError`. Engine failures (unreadable file, unknown format) are
//! reported through the `0`/`1` or `None` result instead.

use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyRuntimeError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use tracing::{debug, warn};
use uc_core::Guarded;
use uc_img::{ImageType, ImgError, ImgResult, Toolkit, Wand};

use crate::{buffer_bytes, core_err, flag};

/// Register the image module functions.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyWand>()?;
    m.add_function(wrap_pyfunction!(init_magick, m)?)?;
    m.add_function(wrap_pyfunction!(terminate_magick, m)?)?;
    m.add_function(wrap_pyfunction!(new_image, m)?)?;
    m.add_function(wrap_pyfunction!(load_image, m)?)?;
    m.add_function(wrap_pyfunction!(load_image_blob, m)?)?;
    m.add_function(wrap_pyfunction!(merge_layers, m)?)?;
    m.add_function(wrap_pyfunction!(write_image, m)?)?;
    m.add_function(wrap_pyfunction!(get_image_blob, m)?)?;
    m.add_function(wrap_pyfunction!(get_number_images, m)?)?;
    m.add_function(wrap_pyfunction!(reset_iterator, m)?)?;
    m.add_function(wrap_pyfunction!(next_image, m)?)?;
    m.add_function(wrap_pyfunction!(get_image_type, m)?)?;
    m.add_function(wrap_pyfunction!(get_colorspace, m)?)?;
    m.add_function(wrap_pyfunction!(clone_image, m)?)?;
    m.add_function(wrap_pyfunction!(set_image_format, m)?)?;
    m.add_function(wrap_pyfunction!(set_image_type, m)?)?;
    m.add_function(wrap_pyfunction!(remove_alpha_channel, m)?)?;
    m.add_function(wrap_pyfunction!(get_version, m)?)?;
    Ok(())
}

fn img_err(err: ImgError) -> PyErr {
    match err {
        ImgError::Core(e) => core_err(e),
        ImgError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Splits an engine result into a `0`/`1` flag, raising only for
/// lifecycle failures.
fn outcome(op: &str, result: ImgResult<()>) -> PyResult<u8> {
    match result {
        Ok(()) => Ok(flag(true)),
        Err(ImgError::Core(e)) => Err(core_err(e)),
        Err(err) => {
            warn!(op, %err, "image operation failed");
            Ok(flag(false))
        }
    }
}

/// Image wand handle.
#[pyclass(unsendable, name = "Wand")]
pub struct PyWand {
    inner: Guarded<Wand>,
}

impl PyWand {
    fn wand(&self) -> PyResult<&Wand> {
        self.inner.get().map_err(core_err)
    }

    fn wand_mut(&mut self) -> PyResult<&mut Wand> {
        self.inner.get_mut().map_err(core_err)
    }
}

#[pymethods]
impl PyWand {
    /// Whether the wand still belongs to a live toolkit.
    #[getter]
    fn valid(&self) -> bool {
        self.inner.is_valid()
    }

    fn __len__(&self) -> PyResult<usize> {
        Ok(self.wand()?.len())
    }
}

fn adopt(wand: Wand) -> PyResult<PyWand> {
    let inner = Toolkit::global().adopt(wand).map_err(img_err)?;
    Ok(PyWand { inner })
}

/// Starts the image toolkit. Calling it again is harmless.
#[pyfunction]
fn init_magick() {
    if Toolkit::global().genesis() {
        debug!("image toolkit started");
    }
}

/// Stops the image toolkit. Wands still alive become stale.
#[pyfunction]
fn terminate_magick() {
    if Toolkit::global().terminus() {
        debug!("image toolkit stopped");
    }
}

/// Creates an empty wand.
#[pyfunction]
fn new_image() -> PyResult<PyWand> {
    adopt(Wand::new())
}

/// Appends every frame of an image file.
#[pyfunction]
fn load_image(mut wand: PyRefMut<'_, PyWand>, path: PathBuf) -> PyResult<u8> {
    let result = wand.wand_mut()?.load(&path);
    outcome("load_image", result)
}

/// Appends every frame of an in-memory image.
#[pyfunction]
fn load_image_blob(mut wand: PyRefMut<'_, PyWand>, data: &Bound<'_, PyAny>) -> PyResult<u8> {
    let data = buffer_bytes(data)?;
    let result = wand.wand_mut()?.load_blob(&data);
    outcome("load_image_blob", result)
}

/// Flattens all frames into a new single-frame wand, `None` if empty.
#[pyfunction]
fn merge_layers(mut wand: PyRefMut<'_, PyWand>) -> PyResult<Option<PyWand>> {
    match wand.wand_mut()?.merge_layers() {
        Ok(merged) => adopt(merged).map(Some),
        Err(ImgError::Core(e)) => Err(core_err(e)),
        Err(err) => {
            debug!(%err, "merge_layers produced nothing");
            Ok(None)
        }
    }
}

/// Writes the wand to a file.
#[pyfunction]
fn write_image(wand: PyRef<'_, PyWand>, path: PathBuf) -> PyResult<u8> {
    let result = wand.wand()?.write(&path);
    outcome("write_image", result)
}

/// Encodes the wand in its output format.
#[pyfunction]
fn get_image_blob<'py>(
    py: Python<'py>,
    wand: PyRef<'_, PyWand>,
) -> PyResult<Bound<'py, PyBytes>> {
    let bytes = wand.wand()?.blob().map_err(img_err)?;
    Ok(PyBytes::new(py, &bytes))
}

/// Number of frames.
#[pyfunction]
fn get_number_images(wand: PyRef<'_, PyWand>) -> PyResult<usize> {
    Ok(wand.wand()?.len())
}

/// Moves the cursor to the first frame.
#[pyfunction]
fn reset_iterator(mut wand: PyRefMut<'_, PyWand>) -> PyResult<()> {
    wand.wand_mut()?.reset_iterator();
    Ok(())
}

/// Advances the cursor; `0` when already at the last frame.
#[pyfunction]
fn next_image(mut wand: PyRefMut<'_, PyWand>) -> PyResult<u8> {
    Ok(flag(wand.wand_mut()?.next_image()))
}

/// Type name of the current frame, e.g. `"TrueColorMatteType"`.
#[pyfunction]
fn get_image_type(wand: PyRef<'_, PyWand>) -> PyResult<&'static str> {
    Ok(wand.wand()?.image_type().as_str())
}

/// Colourspace name of the current frame, e.g. `"sRGBColorspace"`.
#[pyfunction]
fn get_colorspace(wand: PyRef<'_, PyWand>) -> PyResult<&'static str> {
    Ok(wand.wand()?.colorspace().as_str())
}

/// Deep copy of a wand.
#[pyfunction]
fn clone_image(wand: PyRef<'_, PyWand>) -> PyResult<PyWand> {
    let copy = wand.wand()?.clone();
    adopt(copy)
}

/// Sets the output format from a tag such as `"PNG"`.
#[pyfunction]
fn set_image_format(mut wand: PyRefMut<'_, PyWand>, format: &str) -> PyResult<u8> {
    let result = wand.wand_mut()?.set_format(format);
    outcome("set_image_format", result)
}

/// Converts the current frame to a type given by name.
#[pyfunction]
fn set_image_type(mut wand: PyRefMut<'_, PyWand>, image_type: &str) -> PyResult<u8> {
    let result = wand.wand_mut()?.set_type(ImageType::parse(image_type));
    outcome("set_image_type", result)
}

/// Drops the alpha channel of the current frame.
#[pyfunction]
fn remove_alpha_channel(mut wand: PyRefMut<'_, PyWand>) -> PyResult<u8> {
    let result = wand.wand_mut()?.remove_alpha();
    outcome("remove_alpha_channel", result)
}

/// Toolkit version as `(description, number)`.
#[pyfunction]
fn get_version() -> (String, u32) {
    uc_img::version()
}
