//! `_libpango`: layouts, font descriptions and glyph geometry.

use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyTuple;
use uc_core::Handle;
use uc_text::{FontDescription, Layout, TextError};

use crate::core_err;

/// Register the text module functions.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLayout>()?;
    m.add_class::<PyFontDescription>()?;
    m.add_function(wrap_pyfunction!(get_version, m)?)?;
    m.add_function(wrap_pyfunction!(get_fontmap, m)?)?;
    m.add_function(wrap_pyfunction!(load_fonts, m)?)?;
    m.add_function(wrap_pyfunction!(create_layout, m)?)?;
    m.add_function(wrap_pyfunction!(create_font_description, m)?)?;
    m.add_function(wrap_pyfunction!(set_layout_width, m)?)?;
    m.add_function(wrap_pyfunction!(set_layout_font_description, m)?)?;
    m.add_function(wrap_pyfunction!(set_layout_justify, m)?)?;
    m.add_function(wrap_pyfunction!(set_layout_alignment, m)?)?;
    m.add_function(wrap_pyfunction!(set_layout_markup, m)?)?;
    m.add_function(wrap_pyfunction!(set_layout_text, m)?)?;
    m.add_function(wrap_pyfunction!(get_layout_pixel_size, m)?)?;
    m.add_function(wrap_pyfunction!(get_layout_line_positions, m)?)?;
    m.add_function(wrap_pyfunction!(get_layout_char_positions, m)?)?;
    m.add_function(wrap_pyfunction!(get_layout_cluster_positions, m)?)?;
    Ok(())
}

fn text_err(err: TextError) -> PyErr {
    match err {
        TextError::Core(e) => core_err(e),
        e @ TextError::PositionsOutOfRange { .. } => PyIndexError::new_err(e.to_string()),
        e @ TextError::Markup { .. } => PyValueError::new_err(e.to_string()),
        e @ TextError::FontLoad { .. } => PyIOError::new_err(e.to_string()),
        e @ TextError::FontSystemPoisoned => PyRuntimeError::new_err(e.to_string()),
    }
}

/// Paragraph layout handle.
#[pyclass(unsendable, name = "Layout")]
pub struct PyLayout {
    inner: Handle<Layout>,
}

#[pymethods]
impl PyLayout {
    /// Plain text of the layout.
    #[getter]
    fn text(&self) -> String {
        self.inner.get().text().to_string()
    }
}

/// Font description handle.
#[pyclass(unsendable, name = "FontDescription")]
pub struct PyFontDescription {
    inner: Handle<FontDescription>,
}

#[pymethods]
impl PyFontDescription {
    fn __str__(&self) -> String {
        self.inner.get().to_string()
    }

    fn __repr__(&self) -> String {
        format!("FontDescription({:?})", self.inner.get().to_string())
    }
}

/// Layout engine version string.
#[pyfunction]
fn get_version() -> String {
    uc_text::version()
}

/// Known font families as `((family, (face, ...) | None), ...)`.
#[pyfunction]
fn get_fontmap(py: Python<'_>) -> PyResult<Bound<'_, PyTuple>> {
    let map = uc_text::font_map().map_err(text_err)?;
    let mut entries = Vec::with_capacity(map.len());
    for family in map {
        let faces = family.faces.map(|faces| PyTuple::new(py, faces)).transpose()?;
        entries.push((family.name, faces));
    }
    PyTuple::new(py, entries)
}

/// Adds a font file, or every font in a directory, to the font map.
#[pyfunction]
fn load_fonts(path: PathBuf) -> PyResult<()> {
    uc_text::load_fonts(&path).map_err(text_err)
}

/// Creates an empty layout in the configured default font.
#[pyfunction]
fn create_layout() -> PyLayout {
    PyLayout {
        inner: Handle::new(Layout::new()),
    }
}

/// Parses a description such as `"DejaVu Sans Bold 12"`.
#[pyfunction]
fn create_font_description(description: &str) -> PyFontDescription {
    PyFontDescription {
        inner: Handle::new(FontDescription::parse(description)),
    }
}

/// Sets the wrap width in engine units; `-1` disables wrapping.
#[pyfunction]
fn set_layout_width(mut layout: PyRefMut<'_, PyLayout>, width: i32) {
    layout.inner.get_mut().set_width(width);
}

/// Sets the base font of a layout.
#[pyfunction]
fn set_layout_font_description(
    mut layout: PyRefMut<'_, PyLayout>,
    font: PyRef<'_, PyFontDescription>,
) {
    layout.inner.get_mut().set_font_description(font.inner.get());
}

/// Turns justification on or off.
#[pyfunction]
fn set_layout_justify(mut layout: PyRefMut<'_, PyLayout>, justify: bool) {
    layout.inner.get_mut().set_justify(justify);
}

/// Sets alignment by code: 0 left, 1 center, 2 right, 3 justified left.
///
/// Other codes leave the layout unchanged.
#[pyfunction]
fn set_layout_alignment(mut layout: PyRefMut<'_, PyLayout>, code: i32) {
    layout.inner.get_mut().set_alignment_code(code);
}

/// Replaces the layout content with parsed markup.
///
/// Raises `ValueError` for malformed markup and keeps the old content.
#[pyfunction]
fn set_layout_markup(mut layout: PyRefMut<'_, PyLayout>, markup: &str) -> PyResult<()> {
    layout.inner.get_mut().set_markup(markup).map_err(text_err)
}

/// Replaces the layout content with plain text.
#[pyfunction]
fn set_layout_text(mut layout: PyRefMut<'_, PyLayout>, text: &str) {
    layout.inner.get_mut().set_text(text);
}

/// Logical size as `(width, height)` in whole pixels.
#[pyfunction]
fn get_layout_pixel_size(mut layout: PyRefMut<'_, PyLayout>) -> PyResult<(i32, i32)> {
    layout.inner.get_mut().pixel_size().map_err(text_err)
}

/// Baseline of every line relative to the first, in pixels.
#[pyfunction]
fn get_layout_line_positions<'py>(
    py: Python<'py>,
    mut layout: PyRefMut<'_, PyLayout>,
) -> PyResult<Bound<'py, PyTuple>> {
    let lines = layout.inner.get_mut().line_positions().map_err(text_err)?;
    PyTuple::new(py, lines)
}

/// `(x, y, width, height, baseline)` for each of the first `n` characters.
#[pyfunction]
fn get_layout_char_positions<'py>(
    py: Python<'py>,
    mut layout: PyRefMut<'_, PyLayout>,
    n: usize,
) -> PyResult<Bound<'py, PyTuple>> {
    let chars = layout.inner.get_mut().char_positions(n).map_err(text_err)?;
    PyTuple::new(
        py,
        chars.into_iter().map(|c| (c.x, c.y, c.width, c.height, c.baseline)),
    )
}

type GlyphRecord = (f64, f64, f64, f64, f64, usize);
type ClusterOutput = (Vec<GlyphRecord>, Vec<(usize, usize)>, Vec<(usize, usize)>, bool, bool);

/// Glyph boxes for `n` character slots.
///
/// Returns `(glyphs, cluster_ranges, byte_ranges, mixed_directions,
/// base_is_rtl)`. Each glyph is `(x, y, width, height, baseline, index)`;
/// each range covers the slots (or bytes) one multi-character cluster
/// spans. Raises `IndexError` when `n` exceeds the character count.
#[pyfunction]
fn get_layout_cluster_positions(
    mut layout: PyRefMut<'_, PyLayout>,
    n: usize,
) -> PyResult<ClusterOutput> {
    let out = layout.inner.get_mut().cluster_positions(n).map_err(text_err)?;
    let glyphs = out
        .glyphs
        .iter()
        .map(|g| (g.x, g.y, g.width, g.height, g.baseline, g.index))
        .collect();
    let clusters = out.cluster_ranges.iter().map(|r| (r.start, r.end)).collect();
    let bytes = out.byte_ranges.iter().map(|r| (r.start, r.end)).collect();
    Ok((
        glyphs,
        clusters,
        bytes,
        out.directions.mixed,
        out.directions.base_rtl,
    ))
}
