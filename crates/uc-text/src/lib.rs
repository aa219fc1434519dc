//! # uc-text
//!
//! Text layout binding built on `cosmic-text`.
//!
//! - [`FontDescription`]: `"Family Style Size"` strings
//! - [`markup`]: the markup subset accepted by [`Layout::set_markup`]
//! - [`Layout`]: text plus wrap width, font and alignment
//! - [`Paragraph`] and [`Cursor`]: an engine-independent snapshot of the
//!   shaped text, walkable by character or by cluster
//! - [`cluster_positions`]: per-cluster glyph boxes, ligature ranges and
//!   direction flags, the data callers use to place text glyph by glyph
//!
//! # Example
//!
//! ```rust
//! use uc_text::{Alignment, ParagraphBuilder, cluster_positions};
//!
//! let para = ParagraphBuilder::new("AB")
//!     .alignment(Alignment::Center)
//!     .line(20 * 1024, 16 * 1024)
//!     .cluster(0, 1, 10 * 1024)
//!     .cluster(1, 1, 10 * 1024)
//!     .build();
//! let out = cluster_positions(&para, 2).unwrap();
//! assert_eq!(out.glyphs[0].x, -10.0);
//! assert!(out.cluster_ranges.is_empty());
//! ```

#![warn(missing_docs)]

mod error;
mod extract;
mod font;
mod fonts;
mod layout;
pub mod markup;
mod paragraph;
mod shaping;
mod units;

pub use error::{TextError, TextResult};
pub use extract::{
    ByteRange, CharPosition, ClusterPositions, ClusterRange, DirectionFlags, GlyphPosition,
    base_is_rtl, char_positions, cluster_positions, line_positions, pixel_size,
};
pub use font::{FontDescription, FontSize, FontStretch, FontStyle, WEIGHT_NORMAL};
pub use fonts::{FontFamily, font_map, load_fonts};
pub use layout::Layout;
pub use paragraph::{CharSlot, ClusterSlot, Cursor, LineInfo, Paragraph, ParagraphBuilder, Rect};
pub use units::{Alignment, SCALE, to_pixels, to_units};

/// Layout engine version string.
pub fn version() -> String {
    format!("uc-text {} (cosmic-text 0.14)", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(version().starts_with("uc-text 0.1"));
    }
}
