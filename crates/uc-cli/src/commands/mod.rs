//! CLI command implementations

pub mod cms;
pub mod img;
pub mod text;

use anyhow::{Context, Result};
use std::path::Path;
use uc_cms::Profile;
use uc_core::Guarded;
use uc_img::{Toolkit, Wand};

/// Opens a profile file or one of the built-in names (`srgb`, `lab`, `gray`).
pub fn open_profile(spec: &str) -> Result<Profile> {
    match spec.to_ascii_lowercase().as_str() {
        "srgb" | "rgb" => Ok(Profile::srgb()),
        "lab" => Profile::lab().context("Failed to create Lab profile"),
        "gray" | "grey" => Profile::gray().context("Failed to create gray profile"),
        _ => Profile::open(spec).with_context(|| format!("Failed to open profile: {spec}")),
    }
}

/// Starts the toolkit and loads every frame of `path` into a new wand.
pub fn load_wand(path: &Path) -> Result<Guarded<Wand>> {
    let toolkit = Toolkit::global();
    toolkit.genesis();
    let mut wand = toolkit.new_wand()?;
    wand.get_mut()?
        .load(path)
        .with_context(|| format!("Failed to load: {}", path.display()))?;
    Ok(wand)
}

/// Formats a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        assert!(open_profile("sRGB").unwrap().is_rgb());
        assert!(open_profile("gray").unwrap().is_gray());
        assert!(open_profile("/nonexistent.icc").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
