//! The shared font system and the font map listing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use cosmic_text::{FontSystem, Stretch, Style};
use tracing::{debug, warn};

use crate::font::{FontDescription, FontStretch, FontStyle};
use crate::{TextError, TextResult};

// Global font system (expensive to create, reuse across calls)
lazy_static::lazy_static! {
    static ref FONT_SYSTEM: Mutex<FontSystem> = Mutex::new(configured_font_system());
}

fn configured_font_system() -> FontSystem {
    let mut font_system = FontSystem::new();
    let settings = uc_core::settings::current();
    for path in &settings.text.font_paths {
        if let Err(err) = load_into(&mut font_system, path) {
            warn!(%err, "skipping configured font path");
        }
    }
    debug!(faces = font_system.db().len(), "font system ready");
    font_system
}

fn load_into(font_system: &mut FontSystem, path: &Path) -> TextResult<()> {
    let db = font_system.db_mut();
    if path.is_dir() {
        db.load_fonts_dir(path);
        return Ok(());
    }
    db.load_font_file(path).map_err(|e| TextError::FontLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Locks the shared font system.
pub(crate) fn font_system() -> TextResult<MutexGuard<'static, FontSystem>> {
    FONT_SYSTEM.lock().map_err(|_| TextError::FontSystemPoisoned)
}

/// Adds a font file or every font in a directory.
pub fn load_fonts(path: impl AsRef<Path>) -> TextResult<()> {
    let path = path.as_ref();
    let mut fs = font_system()?;
    let before = fs.db().len();
    load_into(&mut fs, path)?;
    debug!(path = %path.display(), added = fs.db().len() - before, "fonts loaded");
    Ok(())
}

/// A family in the font map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamily {
    /// Family name.
    pub name: String,
    /// Face names, or `None` for families of fixed-size bitmap faces.
    pub faces: Option<Vec<String>>,
}

fn face_name(weight: u16, style: Style, stretch: Stretch) -> String {
    let mut fd = FontDescription::default();
    fd.set_weight(weight);
    fd.set_style(match style {
        Style::Normal => FontStyle::Normal,
        Style::Italic => FontStyle::Italic,
        Style::Oblique => FontStyle::Oblique,
    });
    fd.set_stretch(match stretch {
        Stretch::UltraCondensed => FontStretch::UltraCondensed,
        Stretch::ExtraCondensed => FontStretch::ExtraCondensed,
        Stretch::Condensed => FontStretch::Condensed,
        Stretch::SemiCondensed => FontStretch::SemiCondensed,
        Stretch::Normal => FontStretch::Normal,
        Stretch::SemiExpanded => FontStretch::SemiExpanded,
        Stretch::Expanded => FontStretch::Expanded,
        Stretch::ExtraExpanded => FontStretch::ExtraExpanded,
        Stretch::UltraExpanded => FontStretch::UltraExpanded,
    });
    match fd.to_string().as_str() {
        "Normal" => "Regular".to_string(),
        other => other.to_string(),
    }
}

/// Every family known to the font system with its face names, sorted.
///
/// All faces the font system loads are scalable outlines, so `faces` is
/// always present.
pub fn font_map() -> TextResult<Vec<FontFamily>> {
    let fs = font_system()?;
    let mut families: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for face in fs.db().faces() {
        let Some((name, _)) = face.families.first() else {
            continue;
        };
        families
            .entry(name.clone())
            .or_default()
            .push(face_name(face.weight.0, face.style, face.stretch));
    }
    Ok(families
        .into_iter()
        .map(|(name, mut faces)| {
            faces.sort();
            faces.dedup();
            FontFamily {
                name,
                faces: Some(faces),
            }
        })
        .collect())
}

/// Whether the font system knows a family, ignoring case.
pub(crate) fn has_family(fs: &FontSystem, name: &str) -> bool {
    fs.db().faces().any(|face| {
        face.families
            .iter()
            .any(|(family, _)| family.eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_names() {
        assert_eq!(face_name(400, Style::Normal, Stretch::Normal), "Regular");
        assert_eq!(face_name(700, Style::Italic, Stretch::Normal), "Bold Italic");
        assert_eq!(face_name(400, Style::Oblique, Stretch::Condensed), "Oblique Condensed");
    }

    #[test]
    fn test_font_map_is_sorted() {
        let map = font_map().unwrap();
        assert!(map.windows(2).all(|w| w[0].name < w[1].name));
        assert!(map.iter().all(|f| f.faces.as_ref().is_some_and(|v| !v.is_empty())));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(matches!(
            load_fonts("/nonexistent/font.ttf"),
            Err(TextError::FontLoad { .. })
        ));
    }
}
