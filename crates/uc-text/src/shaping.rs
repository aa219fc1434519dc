//! Shapes styled text with `cosmic-text` and snapshots the result as a
//! [`Paragraph`].
//!
//! Each layout run becomes one visual line. Glyphs sharing a source byte
//! range form a cluster whose width is split evenly over its characters.
//! Line terminators become zero-width character slots at the end of the
//! line they close. Characters the shaper produced no glyph for, such as
//! spaces dropped at a soft wrap, get zero-width clusters on the visual
//! line whose text they follow, so every character of the text has exactly
//! one slot and slots stay in reading order.

use cosmic_text::{
    Align, Attrs, Buffer, Color, Family, FontSystem, LayoutRun, Metrics, Shaping, Stretch, Style,
    Weight,
};
use tracing::{debug, trace};

use crate::font::{FontDescription, FontStretch, FontStyle};
use crate::fonts::has_family;
use crate::markup::StyledText;
use crate::paragraph::{CharSlot, ClusterSlot, LineInfo, Paragraph, Rect};
use crate::units::{Alignment, to_pixels, to_units};

/// Line height as a multiple of the font size.
const LINE_SPACING: f32 = 1.2;

/// Baseline position inside a line box with no glyphs.
const EMPTY_LINE_ASCENT: f32 = 0.8;

/// What to lay out and how.
pub(crate) struct ShapeRequest<'a> {
    pub styled: &'a StyledText,
    pub font: &'a FontDescription,
    pub dpi: f64,
    /// Wrap width in engine units, `None` for no wrapping.
    pub width: Option<i32>,
    pub alignment: Alignment,
    pub justify: bool,
}

fn generic_family(name: &str) -> Option<Family<'static>> {
    match name.to_ascii_lowercase().as_str() {
        "sans" | "sans-serif" => Some(Family::SansSerif),
        "serif" => Some(Family::Serif),
        "monospace" | "mono" => Some(Family::Monospace),
        "cursive" => Some(Family::Cursive),
        "fantasy" => Some(Family::Fantasy),
        _ => None,
    }
}

/// First family of the list the font system can serve.
fn pick_family<'a>(fs: &FontSystem, families: &'a [String]) -> Family<'a> {
    for name in families {
        if let Some(generic) = generic_family(name) {
            return generic;
        }
        if has_family(fs, name) {
            return Family::Name(name);
        }
    }
    Family::SansSerif
}

fn attrs_for<'a>(
    fs: &FontSystem,
    fd: &'a FontDescription,
    color: Option<[u8; 4]>,
    dpi: f64,
) -> Attrs<'a> {
    let size = fd.pixel_size(dpi, fd).max(1.0);
    let mut attrs = Attrs::new()
        .family(pick_family(fs, fd.families()))
        .weight(Weight(fd.weight()))
        .style(match fd.style() {
            FontStyle::Normal => Style::Normal,
            FontStyle::Italic => Style::Italic,
            FontStyle::Oblique => Style::Oblique,
        })
        .stretch(match fd.stretch() {
            FontStretch::UltraCondensed => Stretch::UltraCondensed,
            FontStretch::ExtraCondensed => Stretch::ExtraCondensed,
            FontStretch::Condensed => Stretch::Condensed,
            FontStretch::SemiCondensed => Stretch::SemiCondensed,
            FontStretch::Normal => Stretch::Normal,
            FontStretch::SemiExpanded => Stretch::SemiExpanded,
            FontStretch::Expanded => Stretch::Expanded,
            FontStretch::ExtraExpanded => Stretch::ExtraExpanded,
            FontStretch::UltraExpanded => Stretch::UltraExpanded,
        })
        .metrics(Metrics::new(size, size * LINE_SPACING));
    if let Some([r, g, b, a]) = color {
        attrs = attrs.color(Color::rgba(r, g, b, a));
    }
    attrs
}

/// Byte ranges of each buffer line's content and of its terminator.
fn line_spans(buffer: &Buffer, text: &str) -> Vec<(usize, usize, usize)> {
    let mut spans = Vec::with_capacity(buffer.lines.len());
    let mut pos = 0;
    for line in &buffer.lines {
        let start = pos.min(text.len());
        let content_end = (start + line.text().len()).min(text.len());
        let rest = &text[content_end..];
        let terminator = if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') || rest.starts_with('\r') {
            1
        } else {
            0
        };
        pos = content_end + terminator;
        spans.push((start, content_end, pos));
    }
    spans
}

/// Glyphs of one source byte range, in line-local pixels.
struct RawCluster {
    x: f32,
    right: f32,
    start: usize,
    end: usize,
    rtl: bool,
}

struct VisualLine {
    top: f32,
    baseline: f32,
    height: f32,
    width: f32,
    rtl: bool,
    clusters: Vec<RawCluster>,
}

impl VisualLine {
    fn from_run(run: &LayoutRun<'_>, line_start: usize) -> Self {
        let mut clusters: Vec<RawCluster> = Vec::new();
        for glyph in run.glyphs {
            let (start, end) = (line_start + glyph.start, line_start + glyph.end);
            match clusters.last_mut() {
                Some(c) if c.start == start && c.end == end => {
                    c.x = c.x.min(glyph.x);
                    c.right = c.right.max(glyph.x + glyph.w);
                }
                _ => clusters.push(RawCluster {
                    x: glyph.x,
                    right: glyph.x + glyph.w,
                    start,
                    end,
                    rtl: glyph.level.is_rtl(),
                }),
            }
        }
        clusters.sort_by(|a, b| a.x.total_cmp(&b.x));

        // Lines start at 0; alignment is applied afterwards.
        let left = clusters.first().map_or(0.0, |c| c.x);
        let right = clusters.iter().map(|c| c.right).fold(left, f32::max);
        for c in &mut clusters {
            c.x -= left;
            c.right -= left;
        }

        Self {
            top: run.line_top,
            baseline: run.line_y,
            height: run.line_height,
            width: right - left,
            rtl: run.rtl,
            clusters,
        }
    }

    /// Lowest source byte shaped onto this line.
    fn first_byte(&self) -> Option<usize> {
        self.clusters.iter().map(|c| c.start).min()
    }

    fn empty(top: f32, height: f32) -> Self {
        Self {
            top,
            baseline: top + height * EMPTY_LINE_ASCENT,
            height,
            width: 0.0,
            rtl: false,
            clusters: Vec::new(),
        }
    }
}

/// Accumulates slots line by line.
struct SlotWriter<'t> {
    text: &'t str,
    covered: Vec<bool>,
    lines: Vec<LineInfo>,
    chars: Vec<CharSlot>,
    clusters: Vec<ClusterSlot>,
}

impl SlotWriter<'_> {
    fn push_cluster(&mut self, line: usize, x: i32, width: i32, bytes: &[usize]) {
        let info = self.lines[line];
        let cluster = self.clusters.len();
        let count = bytes.len() as i32;
        let share = width / count.max(1);
        let mut pen = x;
        for (k, &index) in bytes.iter().enumerate() {
            let w = if k as i32 == count - 1 {
                width - share * (count - 1)
            } else {
                share
            };
            self.chars.push(CharSlot {
                extents: Rect::new(pen, info.top, w, info.height),
                index,
                line,
                cluster: Some(cluster),
            });
            pen += w;
        }
        self.clusters.push(ClusterSlot {
            extents: Rect::new(x, info.top, width, info.height),
            first_char: self.chars.len() - bytes.len(),
            char_count: bytes.len(),
        });
    }

    /// Character starts in `start..end` not yet given a slot.
    fn take_uncovered(&mut self, start: usize, end: usize) -> Vec<usize> {
        let text = self.text;
        let picked: Vec<usize> = text
            .get(start..end)
            .unwrap_or("")
            .char_indices()
            .map(|(i, _)| start + i)
            .filter(|&i| !self.covered[i])
            .collect();
        for &i in &picked {
            self.covered[i] = true;
        }
        picked
    }

    /// Writes one visual line covering the source bytes `span.0..span.1`.
    fn write_line(&mut self, visual: &VisualLine, offset: i32, span: (usize, usize)) {
        let line = self.lines.len();
        self.lines.push(LineInfo {
            top: to_units(visual.top),
            baseline: to_units(visual.baseline),
            height: to_units(visual.height),
            x: offset,
            width: to_units(visual.width),
        });
        let first = visual.first_byte().unwrap_or(span.1).clamp(span.0, span.1);
        for index in self.take_uncovered(span.0, first) {
            self.push_cluster(line, offset, 0, &[index]);
        }
        for raw in &visual.clusters {
            let mut bytes = self.take_uncovered(raw.start, raw.end);
            if bytes.is_empty() {
                continue;
            }
            if raw.rtl {
                bytes.reverse();
            }
            let x = offset + to_units(raw.x);
            self.push_cluster(line, x, to_units(raw.right - raw.x), &bytes);
        }
        let edge = offset + to_units(visual.width);
        for index in self.take_uncovered(span.0, span.1) {
            self.push_cluster(line, edge, 0, &[index]);
        }
    }

    /// Closes a buffer line: anything still uncovered as zero-width
    /// clusters, then the terminator as bare character slots.
    fn close_line(&mut self, content: (usize, usize), terminator_end: usize) {
        let Some(line) = self.lines.len().checked_sub(1) else {
            return;
        };
        let info = self.lines[line];
        let edge = info.x + info.width;
        for index in self.take_uncovered(content.0, content.1) {
            self.push_cluster(line, edge, 0, &[index]);
        }
        for index in self.take_uncovered(content.1, terminator_end) {
            self.chars.push(CharSlot {
                extents: Rect::new(edge, info.top, 0, info.height),
                index,
                line,
                cluster: None,
            });
        }
    }
}

/// Shapes `req` and snapshots the laid-out paragraph.
pub(crate) fn shape(fs: &mut FontSystem, req: &ShapeRequest<'_>) -> Paragraph {
    let text = req.styled.text.as_str();
    let base_px = req.font.pixel_size(req.dpi, req.font).max(1.0);
    let line_height = base_px * LINE_SPACING;
    let wrap = req.width.map(|w| to_pixels(w) as f32);

    let mut buffer = Buffer::new(fs, Metrics::new(base_px, line_height));
    buffer.set_size(fs, wrap, None);

    let resolved: Vec<FontDescription> = req
        .styled
        .spans
        .iter()
        .map(|s| s.style.resolve(req.font))
        .collect();
    let spans: Vec<(&str, Attrs<'_>)> = req
        .styled
        .spans
        .iter()
        .zip(&resolved)
        .map(|(span, fd)| {
            let slice = text.get(span.range.clone()).unwrap_or("");
            (slice, attrs_for(fs, fd, span.style.color, req.dpi))
        })
        .collect();
    let default_attrs = attrs_for(fs, req.font, None, req.dpi);
    let align = if req.justify {
        Align::Justified
    } else {
        Align::Left
    };
    buffer.set_rich_text(fs, spans, &default_attrs, Shaping::Advanced, Some(align));
    buffer.shape_until_scroll(fs, false);

    let spans_by_line = line_spans(&buffer, text);
    let mut visual: Vec<Vec<VisualLine>> = (0..spans_by_line.len()).map(|_| Vec::new()).collect();
    for run in buffer.layout_runs() {
        let start = spans_by_line.get(run.line_i).map_or(0, |s| s.0);
        if let Some(slot) = visual.get_mut(run.line_i) {
            slot.push(VisualLine::from_run(&run, start));
        }
    }

    // Every buffer line gets at least one visual line.
    let mut bottom = 0.0f32;
    for lines in &mut visual {
        match lines.last() {
            Some(last) => bottom = last.top + last.height,
            None => {
                lines.push(VisualLine::empty(bottom, line_height));
                bottom += line_height;
            }
        }
    }

    let available = match wrap {
        Some(w) => to_units(w),
        None => visual
            .iter()
            .flatten()
            .map(|l| to_units(l.width))
            .max()
            .unwrap_or(0),
    };

    let mut writer = SlotWriter {
        text,
        covered: vec![false; text.len()],
        lines: Vec::new(),
        chars: Vec::with_capacity(text.len()),
        clusters: Vec::new(),
    };
    for (lines, &(start, content_end, terminator_end)) in visual.iter().zip(&spans_by_line) {
        // Each visual line owns the bytes up to the next line's first glyph.
        let firsts: Vec<Option<usize>> = lines.iter().map(VisualLine::first_byte).collect();
        let mut lo = start;
        for (i, line) in lines.iter().enumerate() {
            let hi = firsts[i + 1..]
                .iter()
                .flatten()
                .next()
                .copied()
                .unwrap_or(content_end)
                .clamp(lo, content_end.max(lo));
            let offset = req
                .alignment
                .resolve(line.rtl)
                .offset(available, to_units(line.width));
            writer.write_line(line, offset, (lo, hi));
            lo = hi;
        }
        writer.close_line((start, content_end), terminator_end);
    }
    // Anything the buffer did not account for trails the last line.
    let tail = spans_by_line.last().map_or(0, |s| s.2);
    writer.close_line((tail, text.len()), text.len());

    debug!(
        lines = writer.lines.len(),
        chars = writer.chars.len(),
        clusters = writer.clusters.len(),
        "paragraph shaped"
    );
    trace!(text, "shaped text");
    Paragraph::from_parts(
        text.to_string(),
        writer.lines,
        writer.chars,
        writer.clusters,
        req.alignment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::font_system;

    fn shape_plain(text: &str, width: Option<i32>, alignment: Alignment) -> Paragraph {
        let styled = StyledText::plain(text);
        let font = FontDescription::parse("Sans 12");
        let req = ShapeRequest {
            styled: &styled,
            font: &font,
            dpi: 96.0,
            width,
            alignment,
            justify: false,
        };
        let mut fs = font_system().unwrap();
        shape(&mut fs, &req)
    }

    #[test]
    fn test_every_char_has_one_slot() {
        for text in ["", "AB", "ab\ncd", "a\r\nb", "\n\n", "office ffi", "שלום abc"] {
            let para = shape_plain(text, None, Alignment::Left);
            assert_eq!(para.char_count(), text.chars().count(), "{text:?}");
            let mut indices: Vec<usize> = para.chars().iter().map(|c| c.index).collect();
            indices.sort_unstable();
            let expected: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
            assert_eq!(indices, expected, "{text:?}");
        }
    }

    #[test]
    fn test_hard_breaks_make_lines() {
        let para = shape_plain("a\nb\nc", None, Alignment::Left);
        assert_eq!(para.lines().len(), 3);
        let terminators = para.chars().iter().filter(|c| c.cluster.is_none()).count();
        assert_eq!(terminators, 2);
        assert!(para.lines().windows(2).all(|w| w[0].baseline < w[1].baseline));
    }

    #[test]
    fn test_soft_wrap_keeps_reading_order() {
        let text = "aaaa bbbb cccc dddd";
        let para = shape_plain(text, Some(40 * 1024), Alignment::Left);
        assert!(para.lines().len() > 1);
        assert_eq!(para.char_count(), text.chars().count());

        let indices: Vec<usize> = para.chars().iter().map(|c| c.index).collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]), "{indices:?}");
        assert!(para.chars().windows(2).all(|w| w[0].line <= w[1].line));
    }

    #[test]
    fn test_line_spans() {
        let mut fs = font_system().unwrap();
        let mut buffer = Buffer::new(&mut fs, Metrics::new(12.0, 14.0));
        buffer.set_text(&mut fs, "ab\r\ncd\ne", &Attrs::new(), Shaping::Advanced);
        assert_eq!(line_spans(&buffer, "ab\r\ncd\ne"), vec![(0, 2, 4), (4, 6, 7), (7, 8, 8)]);
    }

    #[test]
    fn test_generic_families() {
        assert_eq!(generic_family("Sans"), Some(Family::SansSerif));
        assert_eq!(generic_family("monospace"), Some(Family::Monospace));
        assert_eq!(generic_family("DejaVu Sans"), None);
    }
}
