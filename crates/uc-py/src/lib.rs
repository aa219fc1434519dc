//! Python extension for the uc2 native bindings.
//!
//! Exposes three submodules with the call surface the Python side expects:
//! `_cms` (colour management), `_libimg` (raster images) and `_libpango`
//! (text layout), plus [`load_settings`] at the top level.
//!
//! Handles are unsendable Python objects owning the Rust resource.
//! Functions that create a resource return `None` when the engine fails,
//! boolean operations return `0`/`1`, and violated preconditions (dead
//! toolkit, stale handle, out-of-range request) raise.

use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes};
use uc_core::{CoreError, Settings};

mod cms;
mod img;
mod text;

/// Maps lifecycle and settings failures to Python exceptions.
pub(crate) fn core_err(err: CoreError) -> PyErr {
    match err {
        CoreError::Io(e) => PyIOError::new_err(e.to_string()),
        CoreError::Settings(e) => PyValueError::new_err(e.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// `0`/`1` result of a boolean operation.
pub(crate) fn flag(ok: bool) -> u8 {
    u8::from(ok)
}

/// Copies the contents of a `bytes` or `bytearray` object.
pub(crate) fn buffer_bytes(obj: &Bound<'_, PyAny>) -> PyResult<Vec<u8>> {
    if let Ok(bytes) = obj.downcast::<PyBytes>() {
        Ok(bytes.as_bytes().to_vec())
    } else if let Ok(array) = obj.downcast::<PyByteArray>() {
        Ok(array.to_vec())
    } else {
        Err(PyTypeError::new_err("expected bytes or bytearray"))
    }
}

/// Overwrites the start of a `bytearray` with `data`.
pub(crate) fn write_bytearray(target: &Bound<'_, PyByteArray>, data: &[u8]) -> PyResult<()> {
    if target.len() < data.len() {
        return Err(PyValueError::new_err(format!(
            "target holds {} bytes, {} needed",
            target.len(),
            data.len()
        )));
    }
    // SAFETY: no Python code runs while the slice is alive, so the array
    // cannot be resized or freed underneath it.
    unsafe { target.as_bytes_mut()[..data.len()].copy_from_slice(data) };
    Ok(())
}

/// Loads settings and makes them current for the whole process.
///
/// The configured alarm codes are applied immediately.
///
/// Without a path the file named by `UC2_CONFIG` is read; when that is
/// unset the built-in defaults apply.
///
/// # Example
/// ```python
/// uc_native.load_settings("uc2.yaml")
/// ```
#[pyfunction]
#[pyo3(signature = (path=None))]
fn load_settings(path: Option<PathBuf>) -> PyResult<()> {
    let settings = Settings::lookup(path.as_deref()).map_err(core_err)?;
    let [red, green, blue] = settings.cms.alarm_codes;
    uc_cms::set_alarm_codes(red, green, blue);
    uc_core::settings::install(settings);
    Ok(())
}

/// uc_native - colour, image and text bindings for uc2
#[pymodule]
fn uc_native(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(load_settings, m)?)?;

    let cms_module = PyModule::new(m.py(), "_cms")?;
    cms::register(&cms_module)?;
    m.add_submodule(&cms_module)?;

    let img_module = PyModule::new(m.py(), "_libimg")?;
    img::register(&img_module)?;
    m.add_submodule(&img_module)?;

    let text_module = PyModule::new(m.py(), "_libpango")?;
    text::register(&text_module)?;
    m.add_submodule(&text_module)?;

    Ok(())
}
