//! Binding settings loaded from YAML.
//!
//! Lookup order: explicit path, then the `UC2_CONFIG` environment variable,
//! then built-in defaults. Every section may be omitted.
//!
//! ```yaml
//! cms:
//!   intent: 0
//!   flags: 0
//!   alarm_codes: [255, 0, 255]
//! img:
//!   blob_format: PNG
//!   jpeg_quality: 90
//! text:
//!   dpi: 96.0
//!   default_font: "Sans 12"
//!   font_paths: [/usr/share/fonts/truetype/dejavu]
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::CoreResult;

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "UC2_CONFIG";

/// All binding settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Colour engine defaults.
    pub cms: CmsSettings,
    /// Image toolkit defaults.
    pub img: ImgSettings,
    /// Text layout defaults.
    pub text: TextSettings,
}

/// Colour engine defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsSettings {
    /// Rendering intent code (0..=3).
    pub intent: u32,
    /// Transform flag bits.
    pub flags: u32,
    /// Gamut alarm colour, 8-bit RGB.
    pub alarm_codes: [u8; 3],
}

/// Image toolkit defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImgSettings {
    /// Format tag used by blob export when a wand has none.
    pub blob_format: String,
    /// JPEG encoder quality, 1..=100.
    pub jpeg_quality: u8,
}

/// Text layout defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    /// Resolution for point to pixel conversion.
    pub dpi: f64,
    /// Font description used by fresh layouts.
    pub default_font: String,
    /// Extra font files or directories to load.
    pub font_paths: Vec<PathBuf>,
}

impl Default for CmsSettings {
    fn default() -> Self {
        Self {
            intent: 0,
            flags: 0,
            alarm_codes: [255, 0, 255],
        }
    }
}

impl Default for ImgSettings {
    fn default() -> Self {
        Self {
            blob_format: "PNG".into(),
            jpeg_quality: 90,
        }
    }
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            default_font: "Sans 12".into(),
            font_paths: Vec::new(),
        }
    }
}

impl Settings {
    /// Parses settings from a YAML string.
    pub fn from_yaml(text: &str) -> CoreResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads settings from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        trace!(path = %path.display(), "Settings::load");
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Resolves settings: `path`, else `UC2_CONFIG`, else defaults.
    pub fn lookup(path: Option<&Path>) -> CoreResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(env) if !env.is_empty() => {
                debug!(var = CONFIG_ENV, "loading settings from environment");
                Self::load(PathBuf::from(env))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> CoreResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

lazy_static! {
    static ref ACTIVE: RwLock<Arc<Settings>> = RwLock::new(Arc::new(Settings::default()));
}

/// Replaces the process-wide settings.
pub fn install(settings: Settings) {
    let mut slot = ACTIVE.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Arc::new(settings);
}

/// Current process-wide settings.
pub fn current() -> Arc<Settings> {
    ACTIVE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.img.blob_format, "PNG");
        assert_eq!(s.text.dpi, 96.0);
        assert_eq!(s.text.default_font, "Sans 12");
        assert_eq!(s.cms.intent, 0);
    }

    #[test]
    fn test_partial_yaml() {
        let s = Settings::from_yaml("img:\n  jpeg_quality: 75\n").unwrap();
        assert_eq!(s.img.jpeg_quality, 75);
        assert_eq!(s.img.blob_format, "PNG");
        assert_eq!(s.text, TextSettings::default());
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_bad_yaml() {
        assert!(Settings::from_yaml("cms: [1, 2").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "text:\n  dpi: 72\n  default_font: \"Serif 10\"").unwrap();
        let s = Settings::lookup(Some(file.path())).unwrap();
        assert_eq!(s.text.dpi, 72.0);
        assert_eq!(s.text.default_font, "Serif 10");
    }

    #[test]
    fn test_round_trip_yaml() {
        let mut s = Settings::default();
        s.cms.alarm_codes = [1, 2, 3];
        let back = Settings::from_yaml(&s.to_yaml().unwrap()).unwrap();
        assert_eq!(back, s);
    }
}
