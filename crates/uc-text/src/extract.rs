//! Per-character positions and cluster grouping of a laid-out paragraph.
//!
//! Outputs are `f64` pixels on a paragraph-wide axis: `x` is shifted by
//! the alignment offset `dx` so that centred and right-aligned text hangs
//! around 0, and `y`/`baseline` are flipped around the first line's
//! baseline `dy`.
//!
//! [`cluster_positions`] walks two cursors over the paragraph, one by
//! character and one by cluster. One glyph record is emitted per cluster;
//! clusters wider than their first character (ligatures) also produce a
//! [`ClusterRange`] naming the character slots they cover. Line
//! terminators only the character cursor stops on are drained as records
//! of their own, so both cursors stay on the same line.

use tracing::trace;
use unicode_bidi::{Direction, get_base_direction_full};

use crate::paragraph::{Cursor, Paragraph, Rect};
use crate::units::{SCALE, to_pixels};
use crate::{TextError, TextResult};

/// Position of one emitted glyph record, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPosition {
    /// Left edge.
    pub x: f64,
    /// Top edge relative to the first baseline.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Baseline of the record's line relative to the first baseline.
    pub baseline: f64,
    /// Byte index into the paragraph text.
    pub index: usize,
}

/// Character position without a byte index, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharPosition {
    /// Left edge.
    pub x: f64,
    /// Top edge relative to the first baseline.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Baseline of the character's line relative to the first baseline.
    pub baseline: f64,
}

/// Output slots covered by a multi-character cluster, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterRange {
    /// First slot.
    pub start: usize,
    /// One past the last slot.
    pub end: usize,
}

/// Byte indices of a multi-character cluster's first and last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Byte index of the first character.
    pub start: usize,
    /// Byte index of the last character.
    pub end: usize,
}

/// Direction findings of an extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionFlags {
    /// Emitted byte indices both rose and fell.
    pub mixed: bool,
    /// The first strong character of the text is right-to-left.
    pub base_rtl: bool,
}

/// Everything [`cluster_positions`] produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterPositions {
    /// One record per cluster or drained character.
    pub glyphs: Vec<GlyphPosition>,
    /// Slot ranges of multi-character clusters.
    pub cluster_ranges: Vec<ClusterRange>,
    /// Byte ranges matching `cluster_ranges`.
    pub byte_ranges: Vec<ByteRange>,
    /// Direction findings.
    pub directions: DirectionFlags,
}

/// Whether the first strong character of `text` is right-to-left.
pub fn base_is_rtl(text: &str) -> bool {
    matches!(get_base_direction_full(text), Direction::Rtl)
}

/// Pixel offsets mapping engine coordinates onto the output axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    dx: f64,
    dy: f64,
}

impl Frame {
    fn of(para: &Paragraph) -> Self {
        let baseline = para.lines().first().map_or(0, |l| l.baseline);
        Self {
            dx: -para.alignment().shift() * to_pixels(para.width()),
            dy: to_pixels(baseline),
        }
    }

    fn glyph(&self, rect: Rect, baseline: i32, index: usize) -> GlyphPosition {
        GlyphPosition {
            x: to_pixels(rect.x) + self.dx,
            y: -to_pixels(rect.y) + self.dy,
            width: to_pixels(rect.width),
            height: to_pixels(rect.height),
            baseline: -to_pixels(baseline) + self.dy,
            index,
        }
    }
}

/// Byte-index direction tracking across emitted records.
#[derive(Debug, Default)]
struct DirectionScan {
    prev: Option<usize>,
    rising: bool,
    falling: bool,
}

impl DirectionScan {
    fn note(&mut self, index: usize) {
        if let Some(prev) = self.prev {
            if index > prev {
                self.rising = true;
            } else if index < prev {
                self.falling = true;
            }
        }
        self.prev = Some(index);
    }

    fn mixed(&self) -> bool {
        self.rising && self.falling
    }
}

/// The shared output index.
///
/// Every record and every character a cluster swallows takes exactly one
/// slot; the index only ever grows.
#[derive(Debug)]
struct Slots {
    next: usize,
    limit: usize,
}

impl Slots {
    fn exhausted(&self) -> bool {
        self.next >= self.limit
    }

    fn take(&mut self) -> usize {
        let slot = self.next;
        self.next += 1;
        debug_assert!(self.next > slot);
        slot
    }
}

fn check_limit(para: &Paragraph, n: usize) -> TextResult<()> {
    if n > para.char_count() {
        return Err(TextError::PositionsOutOfRange {
            requested: n,
            available: para.char_count(),
        });
    }
    Ok(())
}

struct Extractor<'a> {
    frame: Frame,
    chars: Cursor<'a>,
    clusters: Cursor<'a>,
    slots: Slots,
    scan: DirectionScan,
    out: ClusterPositions,
}

impl<'a> Extractor<'a> {
    fn new(para: &'a Paragraph, n: usize) -> Self {
        Self {
            frame: Frame::of(para),
            chars: para.cursor(),
            clusters: para.cursor(),
            slots: Slots { next: 0, limit: n },
            scan: DirectionScan::default(),
            out: ClusterPositions::default(),
        }
    }

    fn emit(&mut self, rect: Rect, baseline: i32, index: usize) {
        self.out.glyphs.push(self.frame.glyph(rect, baseline, index));
        self.scan.note(index);
    }

    /// Catches the character cursor up to the cluster cursor's line.
    fn drain(&mut self) {
        while !self.slots.exhausted()
            && !self.chars.is_end()
            && self.chars.baseline() != self.clusters.baseline()
        {
            self.slots.take();
            let (rect, baseline, index) = (
                self.chars.char_extents(),
                self.chars.baseline(),
                self.chars.index(),
            );
            self.emit(rect, baseline, index);
            self.chars.next_char();
        }
    }

    /// Emits the current cluster and swallows the characters it covers.
    fn cluster(&mut self) {
        let slot = self.slots.take();
        let char_rect = self.chars.char_extents();
        let cluster_rect = self.clusters.cluster_extents();
        let start_index = self.chars.index();
        self.emit(cluster_rect, self.clusters.baseline(), start_index);

        if cluster_rect.width > char_rect.width {
            let mut covered = char_rect.width;
            let mut last = slot;
            while covered < cluster_rect.width && self.chars.next_char() {
                covered += self.chars.char_extents().width;
                last = self.slots.take();
            }
            self.out.cluster_ranges.push(ClusterRange {
                start: slot,
                end: last + 1,
            });
            self.out.byte_ranges.push(ByteRange {
                start: start_index,
                end: self.chars.index(),
            });
        }

        self.chars.next_char();
        self.clusters.next_cluster();
    }

    fn run(mut self) -> ClusterPositions {
        while !self.slots.exhausted() {
            self.drain();
            if self.slots.exhausted() || self.chars.is_end() {
                break;
            }
            self.cluster();
        }
        self.out.directions.mixed = self.scan.mixed();
        self.out
    }
}

/// Extracts glyph records, cluster ranges and direction flags.
///
/// `n` is the slot limit, normally the paragraph's character count. A
/// limit larger than that is rejected with
/// [`TextError::PositionsOutOfRange`].
pub fn cluster_positions(para: &Paragraph, n: usize) -> TextResult<ClusterPositions> {
    check_limit(para, n)?;
    let mut out = Extractor::new(para, n).run();
    out.directions.base_rtl = base_is_rtl(para.text());
    trace!(
        n,
        glyphs = out.glyphs.len(),
        clusters = out.cluster_ranges.len(),
        mixed = out.directions.mixed,
        "cluster positions"
    );
    Ok(out)
}

/// Position of each of the first `n` character slots.
pub fn char_positions(para: &Paragraph, n: usize) -> TextResult<Vec<CharPosition>> {
    check_limit(para, n)?;
    let frame = Frame::of(para);
    let mut cursor = para.cursor();
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let g = frame.glyph(cursor.char_extents(), cursor.baseline(), cursor.index());
        out.push(CharPosition {
            x: g.x,
            y: g.y,
            width: g.width,
            height: g.height,
            baseline: g.baseline,
        });
        cursor.next_char();
    }
    Ok(out)
}

/// Baseline of every line relative to the first one.
pub fn line_positions(para: &Paragraph) -> Vec<f64> {
    let frame = Frame::of(para);
    para.lines()
        .iter()
        .map(|l| -to_pixels(l.baseline) + frame.dy)
        .collect()
}

/// Logical size in whole pixels, rounded outward.
pub fn pixel_size(para: &Paragraph) -> (i32, i32) {
    let ceil = |units: i32| (units + SCALE - 1).div_euclid(SCALE);
    (ceil(para.width()), ceil(para.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paragraph::ParagraphBuilder;
    use crate::units::Alignment;
    use approx::assert_relative_eq;

    const U: i32 = 1024;

    fn ab(alignment: Alignment) -> Paragraph {
        ParagraphBuilder::new("AB")
            .alignment(alignment)
            .line(20 * U, 16 * U)
            .cluster(0, 1, 10 * U)
            .cluster(1, 1, 12 * U)
            .build()
    }

    #[test]
    fn test_two_plain_chars() {
        let out = cluster_positions(&ab(Alignment::Left), 2).unwrap();
        assert_eq!(out.glyphs.len(), 2);
        assert!(out.cluster_ranges.is_empty());
        assert!(out.byte_ranges.is_empty());
        assert!(!out.directions.mixed);
        assert!(!out.directions.base_rtl);

        let g = out.glyphs[1];
        assert_relative_eq!(g.x, 10.0);
        assert_relative_eq!(g.y, 16.0);
        assert_relative_eq!(g.width, 12.0);
        assert_relative_eq!(g.height, 20.0);
        assert_relative_eq!(g.baseline, 0.0);
        assert_eq!(g.index, 1);
    }

    #[test]
    fn test_single_char_clusters_keep_cluster_width() {
        let para = ab(Alignment::Left);
        let out = cluster_positions(&para, 2).unwrap();
        for (glyph, cluster) in out.glyphs.iter().zip(para.clusters()) {
            assert_relative_eq!(glyph.width, to_pixels(cluster.extents.width));
        }
    }

    #[test]
    fn test_ligature_cluster() {
        let para = ParagraphBuilder::new("ffi")
            .line(20 * U, 16 * U)
            .cluster(0, 3, 18 * U)
            .build();
        let out = cluster_positions(&para, 3).unwrap();
        assert_eq!(out.glyphs.len(), 1);
        assert_relative_eq!(out.glyphs[0].width, 18.0);
        assert_eq!(out.cluster_ranges, vec![ClusterRange { start: 0, end: 3 }]);
        assert_eq!(out.byte_ranges, vec![ByteRange { start: 0, end: 2 }]);
    }

    #[test]
    fn test_cluster_range_covers_cluster_width() {
        let para = ParagraphBuilder::new("xffly")
            .line(20 * U, 16 * U)
            .cluster(0, 1, 7 * U)
            .cluster(1, 3, 20 * U)
            .cluster(4, 1, 7 * U)
            .build();
        let out = cluster_positions(&para, 5).unwrap();
        assert_eq!(out.glyphs.len(), 3);
        assert_eq!(out.cluster_ranges, vec![ClusterRange { start: 1, end: 4 }]);
        assert_eq!(out.byte_ranges, vec![ByteRange { start: 1, end: 3 }]);
        assert_eq!(out.glyphs[2].index, 4);

        let range = out.cluster_ranges[0];
        let covered: i32 = para.chars()[range.start..range.end]
            .iter()
            .map(|c| c.extents.width)
            .sum();
        assert!(covered >= para.clusters()[1].extents.width);
    }

    #[test]
    fn test_two_lines_drain_terminator() {
        let para = ParagraphBuilder::new("ab\nc")
            .line(20 * U, 16 * U)
            .cluster(0, 1, 10 * U)
            .cluster(1, 1, 10 * U)
            .terminator(2)
            .line(24 * U, 18 * U)
            .cluster(3, 1, 10 * U)
            .build();
        let out = cluster_positions(&para, 4).unwrap();
        let indices: Vec<usize> = out.glyphs.iter().map(|g| g.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(out.cluster_ranges.is_empty());

        // Line 2 baseline sits 20 + 18 - 16 = 22 px below line 1.
        assert_relative_eq!(out.glyphs[0].baseline, 0.0);
        assert_relative_eq!(out.glyphs[3].baseline, -22.0);
        assert_relative_eq!(out.glyphs[2].width, 0.0);
    }

    #[test]
    fn test_two_lines_without_terminator() {
        let para = ParagraphBuilder::new("abc")
            .line(20 * U, 16 * U)
            .cluster(0, 1, 10 * U)
            .cluster(1, 1, 10 * U)
            .line(20 * U, 16 * U)
            .cluster(2, 1, 10 * U)
            .build();
        let out = cluster_positions(&para, 3).unwrap();
        assert_eq!(out.glyphs.len(), 3);
        assert_relative_eq!(out.glyphs[1].baseline - out.glyphs[2].baseline, 20.0);
        assert!(out.cluster_ranges.is_empty());
    }

    #[test]
    fn test_alignment_shifts_x() {
        let left = cluster_positions(&ab(Alignment::Left), 2).unwrap();
        let center = cluster_positions(&ab(Alignment::Center), 2).unwrap();
        let right = cluster_positions(&ab(Alignment::Right), 2).unwrap();
        for i in 0..2 {
            assert_relative_eq!(center.glyphs[i].x, left.glyphs[i].x - 11.0);
            assert_relative_eq!(right.glyphs[i].x, left.glyphs[i].x - 22.0);
        }
    }

    #[test]
    fn test_rtl_run() {
        // "שלום" laid out right to left: visual order is the reverse.
        let text = "שלום";
        let para = ParagraphBuilder::new(text)
            .line(20 * U, 16 * U)
            .rtl_cluster(6, 1, 8 * U)
            .rtl_cluster(4, 1, 8 * U)
            .rtl_cluster(2, 1, 8 * U)
            .rtl_cluster(0, 1, 8 * U)
            .build();
        let out = cluster_positions(&para, 4).unwrap();
        assert!(out.directions.base_rtl);
        assert!(!out.directions.mixed);
    }

    #[test]
    fn test_mixed_directions() {
        // "ab" then a Hebrew run "אב" shown right to left.
        let para = ParagraphBuilder::new("abאב")
            .line(20 * U, 16 * U)
            .cluster(0, 1, 8 * U)
            .cluster(1, 1, 8 * U)
            .rtl_cluster(4, 1, 8 * U)
            .rtl_cluster(2, 1, 8 * U)
            .build();
        let out = cluster_positions(&para, 4).unwrap();
        assert!(out.directions.mixed);
        assert!(!out.directions.base_rtl);
    }

    #[test]
    fn test_limit_checks() {
        let para = ab(Alignment::Left);
        assert!(matches!(
            cluster_positions(&para, 3),
            Err(TextError::PositionsOutOfRange { requested: 3, available: 2 })
        ));
        assert!(char_positions(&para, 3).is_err());
        assert_eq!(cluster_positions(&para, 1).unwrap().glyphs.len(), 1);
        assert!(cluster_positions(&para, 0).unwrap().glyphs.is_empty());
    }

    #[test]
    fn test_char_positions() {
        let para = ParagraphBuilder::new("ffi")
            .line(20 * U, 16 * U)
            .cluster(0, 3, 18 * U)
            .build();
        let chars = char_positions(&para, 3).unwrap();
        assert_eq!(chars.len(), 3);
        assert_relative_eq!(chars[0].width, 6.0);
        assert_relative_eq!(chars[2].x, 12.0);
        assert_relative_eq!(chars[2].y, 16.0);
    }

    #[test]
    fn test_line_positions_and_size() {
        let para = ParagraphBuilder::new("ab")
            .line(20 * U, 16 * U)
            .cluster(0, 1, 10 * U + 1)
            .line(20 * U, 16 * U)
            .cluster(1, 1, 4 * U)
            .build();
        let lines = line_positions(&para);
        assert_eq!(lines.len(), 2);
        assert_relative_eq!(lines[0], 0.0);
        assert_relative_eq!(lines[1], -20.0);
        assert_eq!(pixel_size(&para), (11, 40));
    }

    #[test]
    fn test_base_direction() {
        assert!(!base_is_rtl("abc"));
        assert!(base_is_rtl("123 שלום abc"));
        assert!(base_is_rtl("مرحبا"));
        assert!(!base_is_rtl("123"));
        assert!(!base_is_rtl(""));
        // The scan crosses paragraph breaks.
        assert!(base_is_rtl("123\nשלום"));
        assert!(!base_is_rtl("12\nabc שלום"));
    }
}
