//! Paragraph layouts.
//!
//! A [`Layout`] holds text (plain or from markup), a font description, a
//! wrap width and alignment. Geometry queries shape the text on first use
//! and keep the resulting [`Paragraph`] until a setter changes something.

use tracing::{debug, trace};
use uc_core::NativeResource;

use crate::extract::{self, CharPosition, ClusterPositions};
use crate::font::FontDescription;
use crate::fonts::font_system;
use crate::markup::{self, StyledText};
use crate::paragraph::Paragraph;
use crate::shaping::{ShapeRequest, shape};
use crate::units::Alignment;
use crate::TextResult;

/// A paragraph of text with its layout parameters.
#[derive(Debug, Clone)]
pub struct Layout {
    styled: StyledText,
    font: FontDescription,
    width: i32,
    alignment: Alignment,
    justify: bool,
    paragraph: Option<Paragraph>,
}

impl NativeResource for Layout {
    const KIND: &'static str = "PangoLayout";
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    /// Empty, unwrapped, left-aligned layout in the configured default font.
    pub fn new() -> Self {
        let settings = uc_core::settings::current();
        Self {
            styled: StyledText::default(),
            font: FontDescription::parse(&settings.text.default_font),
            width: -1,
            alignment: Alignment::Left,
            justify: false,
            paragraph: None,
        }
    }

    fn invalidate(&mut self) {
        self.paragraph = None;
    }

    /// Plain text of the layout.
    pub fn text(&self) -> &str {
        &self.styled.text
    }

    /// Replaces the content with unstyled text.
    pub fn set_text(&mut self, text: &str) {
        trace!(len = text.len(), "set_text");
        self.styled = StyledText::plain(text);
        self.invalidate();
    }

    /// Replaces the content with parsed markup.
    ///
    /// On error the previous content is kept.
    pub fn set_markup(&mut self, markup: &str) -> TextResult<()> {
        let styled = markup::parse(markup)?;
        trace!(len = styled.text.len(), spans = styled.spans.len(), "set_markup");
        self.styled = styled;
        self.invalidate();
        Ok(())
    }

    /// Styled content.
    pub fn styled(&self) -> &StyledText {
        &self.styled
    }

    /// Wrap width in engine units, `-1` when unwrapped.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Sets the wrap width in engine units; any negative value disables
    /// wrapping.
    pub fn set_width(&mut self, width: i32) {
        self.width = if width < 0 { -1 } else { width };
        self.invalidate();
    }

    /// Base font.
    pub fn font_description(&self) -> &FontDescription {
        &self.font
    }

    /// Sets the base font.
    ///
    /// Fields the description leaves unset keep the configured default.
    pub fn set_font_description(&mut self, fd: &FontDescription) {
        let settings = uc_core::settings::current();
        let mut font = FontDescription::parse(&settings.text.default_font);
        font.merge(fd);
        self.font = font;
        self.invalidate();
    }

    /// Line alignment.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Sets the line alignment.
    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
        self.invalidate();
    }

    /// Whether lines are justified.
    pub fn justify(&self) -> bool {
        self.justify
    }

    /// Sets justification.
    pub fn set_justify(&mut self, justify: bool) {
        self.justify = justify;
        self.invalidate();
    }

    /// Applies an alignment code (see [`Alignment::from_code`]).
    ///
    /// Returns `false` and changes nothing for unknown codes.
    pub fn set_alignment_code(&mut self, code: i32) -> bool {
        match Alignment::from_code(code) {
            Some((alignment, justify)) => {
                self.alignment = alignment;
                self.justify = justify;
                self.invalidate();
                true
            }
            None => {
                debug!(code, "ignoring unknown alignment code");
                false
            }
        }
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.styled.text.chars().count()
    }

    /// Shaped paragraph, computed on first use.
    pub fn paragraph(&mut self) -> TextResult<&Paragraph> {
        let para = match self.paragraph.take() {
            Some(para) => para,
            None => {
                let dpi = uc_core::settings::current().text.dpi;
                let req = ShapeRequest {
                    styled: &self.styled,
                    font: &self.font,
                    dpi,
                    width: (self.width >= 0).then_some(self.width),
                    alignment: self.alignment,
                    justify: self.justify,
                };
                let mut fs = font_system()?;
                shape(&mut fs, &req)
            }
        };
        let para: &Paragraph = self.paragraph.insert(para);
        Ok(para)
    }

    /// Logical size in whole pixels.
    pub fn pixel_size(&mut self) -> TextResult<(i32, i32)> {
        Ok(extract::pixel_size(self.paragraph()?))
    }

    /// Baseline of each line relative to the first.
    pub fn line_positions(&mut self) -> TextResult<Vec<f64>> {
        Ok(extract::line_positions(self.paragraph()?))
    }

    /// Positions of the first `n` characters.
    pub fn char_positions(&mut self, n: usize) -> TextResult<Vec<CharPosition>> {
        extract::char_positions(self.paragraph()?, n)
    }

    /// Glyph records, cluster ranges and direction flags for `n` slots.
    pub fn cluster_positions(&mut self, n: usize) -> TextResult<ClusterPositions> {
        extract::cluster_positions(self.paragraph()?, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextError;

    #[test]
    fn test_defaults() {
        let layout = Layout::new();
        assert_eq!(layout.width(), -1);
        assert_eq!(layout.alignment(), Alignment::Left);
        assert!(!layout.justify());
        assert_eq!(layout.text(), "");
    }

    #[test]
    fn test_alignment_codes() {
        let mut layout = Layout::new();
        assert!(layout.set_alignment_code(3));
        assert_eq!(layout.alignment(), Alignment::Left);
        assert!(layout.justify());
        assert!(layout.set_alignment_code(1));
        assert_eq!(layout.alignment(), Alignment::Center);
        assert!(!layout.justify());
        assert!(!layout.set_alignment_code(9));
        assert_eq!(layout.alignment(), Alignment::Center);
    }

    #[test]
    fn test_bad_markup_keeps_text() {
        let mut layout = Layout::new();
        layout.set_markup("<b>bold</b> text").unwrap();
        assert_eq!(layout.text(), "bold text");
        assert!(matches!(layout.set_markup("<b>oops"), Err(TextError::Markup { .. })));
        assert_eq!(layout.text(), "bold text");
    }

    #[test]
    fn test_font_description_fills_defaults() {
        let mut layout = Layout::new();
        layout.set_font_description(&FontDescription::parse("Serif Bold"));
        let fd = layout.font_description();
        assert_eq!(fd.families(), ["Serif"]);
        assert_eq!(fd.weight(), 700);
        assert!(fd.size().is_some());
    }

    #[test]
    fn test_wrapped_text_is_not_mixed() {
        for align in [0, 2] {
            let mut layout = Layout::new();
            layout.set_text("aaaa bbbb cccc dddd");
            layout.set_width(40 * 1024);
            layout.set_alignment_code(align);
            let n = layout.char_count();
            assert!(layout.line_positions().unwrap().len() > 1);

            let out = layout.cluster_positions(n).unwrap();
            let indices: Vec<usize> = out.glyphs.iter().map(|g| g.index).collect();
            assert!(indices.windows(2).all(|w| w[0] <= w[1]), "{indices:?}");
            assert!(!out.directions.mixed);
            assert!(!out.directions.base_rtl);
            // Baselines only move down the page.
            assert!(out.glyphs.windows(2).all(|w| w[0].baseline >= w[1].baseline));
        }
    }

    #[test]
    fn test_geometry_queries() {
        let mut layout = Layout::new();
        layout.set_text("Hello\nworld");
        let n = layout.char_count();
        assert_eq!(n, 11);

        let lines = layout.line_positions().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], 0.0);

        let chars = layout.char_positions(n).unwrap();
        assert_eq!(chars.len(), n);

        let clusters = layout.cluster_positions(n).unwrap();
        assert!(clusters.glyphs.len() <= n);
        assert!(!clusters.directions.base_rtl);
        assert!(matches!(
            layout.cluster_positions(n + 1),
            Err(TextError::PositionsOutOfRange { .. })
        ));
    }

    #[test]
    fn test_setters_reshape() {
        let mut layout = Layout::new();
        layout.set_text("abc");
        let first = layout.paragraph().unwrap().char_count();
        layout.set_text("abcdef");
        assert_eq!(layout.paragraph().unwrap().char_count(), 6);
        assert_eq!(first, 3);
    }
}
