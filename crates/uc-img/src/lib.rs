//! # uc-img
//!
//! Raster image toolkit binding built on the `image` crate.
//!
//! A [`Wand`] holds an ordered list of frames with a current-image cursor,
//! mirroring the wand model callers expect: load files or blobs (GIF
//! animations expand into frames), merge layers, identify and convert
//! image types, and write everything back out.
//!
//! The toolkit has a process-wide start/stop pair ([`Toolkit::genesis`] and
//! [`Toolkit::terminus`]). Wands handed to callers are [`uc_core::Guarded`]
//! so that a wand outliving terminus is never torn down twice.
//!
//! # Example
//!
//! ```rust
//! use uc_img::Toolkit;
//!
//! let toolkit = Toolkit::isolated();
//! toolkit.genesis();
//! let wand = toolkit.new_wand().unwrap();
//! assert_eq!(wand.get().unwrap().len(), 0);
//! toolkit.terminus();
//! assert!(wand.get().is_err());
//! ```

#![warn(missing_docs)]

mod codec;
mod error;
mod kinds;
mod wand;

pub use codec::{SUPPORTED, format_from_path, format_from_tag, format_tag};
pub use error::{ImgError, ImgResult};
pub use kinds::{Colorspace, ImageType};
pub use wand::{Frame, Wand};

use uc_core::{Guarded, Subsystem};

static TOOLKIT: Subsystem = Subsystem::new("image toolkit");

/// Handle on the toolkit's process-wide lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct Toolkit {
    subsystem: &'static Subsystem,
}

impl Toolkit {
    /// The process-wide toolkit.
    pub fn global() -> Self {
        Self {
            subsystem: &TOOLKIT,
        }
    }

    /// A private lifecycle, independent of the global one.
    ///
    /// Each call leaks one small state block; meant for tests and tools
    /// that need their own start/stop cycle.
    pub fn isolated() -> Self {
        Self {
            subsystem: Box::leak(Box::new(Subsystem::new("image toolkit (isolated)"))),
        }
    }

    /// Starts the toolkit. Idempotent.
    pub fn genesis(&self) -> bool {
        self.subsystem.genesis()
    }

    /// Stops the toolkit. Idempotent.
    pub fn terminus(&self) -> bool {
        self.subsystem.terminus()
    }

    /// Whether the toolkit is started.
    pub fn is_instantiated(&self) -> bool {
        self.subsystem.is_instantiated()
    }

    /// Lifecycle state.
    pub fn subsystem(&self) -> &'static Subsystem {
        self.subsystem
    }

    /// Creates an empty guarded wand.
    pub fn new_wand(&self) -> ImgResult<Guarded<Wand>> {
        self.adopt(Wand::new())
    }

    /// Guards a wand produced by another operation (merge, clone).
    pub fn adopt(&self, wand: Wand) -> ImgResult<Guarded<Wand>> {
        Ok(self.subsystem.guard(wand)?)
    }
}

/// Toolkit version as `(description, number)`.
///
/// The number packs major, minor and patch as `0xMmp`.
pub fn version() -> (String, u32) {
    let part = |s: &str| s.parse::<u32>().unwrap_or(0);
    let major = part(env!("CARGO_PKG_VERSION_MAJOR"));
    let minor = part(env!("CARGO_PKG_VERSION_MINOR"));
    let patch = part(env!("CARGO_PKG_VERSION_PATCH"));
    let number = (major << 8) | (minor << 4) | patch;
    let text = format!(
        "uc-img {} (image 0.25; {})",
        env!("CARGO_PKG_VERSION"),
        SUPPORTED.iter().map(|f| format_tag(*f)).collect::<Vec<_>>().join(" ")
    );
    (text, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_guards_wands() {
        let toolkit = Toolkit::isolated();
        assert!(matches!(toolkit.new_wand(), Err(ImgError::Core(_))));

        assert!(toolkit.genesis());
        assert!(!toolkit.genesis());
        let wand = toolkit.new_wand().unwrap();
        assert_eq!(toolkit.subsystem().live_resources(), 1);
        drop(wand);
        assert_eq!(toolkit.subsystem().live_resources(), 0);

        let stale = toolkit.new_wand().unwrap();
        assert!(toolkit.terminus());
        assert!(!toolkit.terminus());
        assert!(!stale.is_valid());
    }

    #[test]
    fn test_version() {
        let (text, number) = version();
        assert!(text.starts_with("uc-img"));
        assert!(text.contains("PNG"));
        assert_eq!(number >> 8, 0);
        assert_eq!((number >> 4) & 0xF, 1);
    }
}
