//! Laid-out paragraph snapshot and the cursor that walks it.
//!
//! A [`Paragraph`] is what the cluster extractor reads. It is built from a
//! shaped `cosmic-text` buffer, or by hand with [`ParagraphBuilder`] when
//! exact geometry matters (tests, tools).
//!
//! Geometry is in engine units ([`SCALE`](crate::SCALE) per pixel) with y
//! growing downward from the paragraph top. Characters are stored line by
//! line in visual order, left to right, so byte indices decrease across
//! right-to-left runs.

use crate::units::Alignment;

/// Axis-aligned rectangle in engine units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// One visual line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineInfo {
    /// Top of the line box.
    pub top: i32,
    /// Baseline position.
    pub baseline: i32,
    /// Line box height.
    pub height: i32,
    /// Alignment offset of the line start.
    pub x: i32,
    /// Logical width of the line.
    pub width: i32,
}

/// One character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSlot {
    /// Logical extents.
    pub extents: Rect,
    /// Byte index of the character in the paragraph text.
    pub index: usize,
    /// Owning line.
    pub line: usize,
    /// Owning cluster; `None` for line terminators.
    pub cluster: Option<usize>,
}

/// A group of characters shaped as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterSlot {
    /// Logical extents.
    pub extents: Rect,
    /// Position of the cluster's leftmost character slot.
    pub first_char: usize,
    /// Number of character slots in the cluster.
    pub char_count: usize,
}

/// Snapshot of a shaped, positioned paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    text: String,
    lines: Vec<LineInfo>,
    chars: Vec<CharSlot>,
    clusters: Vec<ClusterSlot>,
    alignment: Alignment,
}

impl Paragraph {
    /// Assembles a paragraph from parts that are already consistent.
    ///
    /// A paragraph always has at least one line.
    pub(crate) fn from_parts(
        text: String,
        mut lines: Vec<LineInfo>,
        chars: Vec<CharSlot>,
        clusters: Vec<ClusterSlot>,
        alignment: Alignment,
    ) -> Self {
        if lines.is_empty() {
            lines.push(LineInfo::default());
        }
        Self {
            text,
            lines,
            chars,
            clusters,
            alignment,
        }
    }

    /// Paragraph text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Visual lines, top to bottom.
    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    /// Character slots in visual order.
    pub fn chars(&self) -> &[CharSlot] {
        &self.chars
    }

    /// Clusters in visual order.
    pub fn clusters(&self) -> &[ClusterSlot] {
        &self.clusters
    }

    /// Alignment the lines were positioned with.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Number of character slots.
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    /// Logical width: from the leftmost line start to the rightmost line end.
    pub fn width(&self) -> i32 {
        let left = self.lines.iter().map(|l| l.x).min().unwrap_or(0);
        let right = self.lines.iter().map(|l| l.x + l.width).max().unwrap_or(0);
        right - left
    }

    /// Logical height: from the first line top to the last line bottom.
    pub fn height(&self) -> i32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => last.top + last.height - first.top,
            _ => 0,
        }
    }

    /// Cursor at the first character.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor { para: self, pos: 0 }
    }
}

/// Walks a [`Paragraph`] by character or by cluster.
///
/// Both kinds of step share one position. `next_char` visits every slot,
/// line terminators included; `next_cluster` moves to the first slot of
/// the next cluster and never stops on a terminator. Past the last slot
/// the cursor sits at the end of the last line.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    para: &'a Paragraph,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Whether the cursor is past the last character.
    pub fn is_end(&self) -> bool {
        self.pos >= self.para.chars.len()
    }

    /// Slot position.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn slot(&self) -> Option<&'a CharSlot> {
        self.para.chars.get(self.pos)
    }

    /// Moves to the next character. Returns `false` once at the end.
    pub fn next_char(&mut self) -> bool {
        if self.is_end() {
            return false;
        }
        self.pos += 1;
        !self.is_end()
    }

    /// Moves to the next cluster. Returns `false` once at the end.
    pub fn next_cluster(&mut self) -> bool {
        if self.is_end() {
            return false;
        }
        let current = self.slot().and_then(|s| s.cluster);
        self.pos += 1;
        while let Some(slot) = self.slot() {
            match slot.cluster {
                Some(c) if Some(c) != current => break,
                _ => self.pos += 1,
            }
        }
        !self.is_end()
    }

    /// Line of the current position.
    pub fn line(&self) -> usize {
        self.slot()
            .map_or(self.para.lines.len().saturating_sub(1), |s| s.line)
    }

    fn line_info(&self) -> LineInfo {
        self.para
            .lines
            .get(self.line())
            .copied()
            .unwrap_or_default()
    }

    /// Baseline of the current line.
    pub fn baseline(&self) -> i32 {
        self.line_info().baseline
    }

    /// Byte index of the current character, or the text length at the end.
    pub fn index(&self) -> usize {
        self.slot().map_or(self.para.text.len(), |s| s.index)
    }

    /// Extents of the current character.
    pub fn char_extents(&self) -> Rect {
        match self.slot() {
            Some(slot) => slot.extents,
            None => {
                let line = self.line_info();
                Rect::new(line.x + line.width, line.top, 0, line.height)
            }
        }
    }

    /// Extents of the cluster holding the current character.
    ///
    /// On a line terminator this is the terminator's own extents.
    pub fn cluster_extents(&self) -> Rect {
        self.slot()
            .and_then(|s| s.cluster)
            .and_then(|c| self.para.clusters.get(c))
            .map_or_else(|| self.char_extents(), |c| c.extents)
    }
}

struct PendingLine {
    height: i32,
    ascent: i32,
    pen: i32,
    first_char: usize,
    first_cluster: usize,
}

/// Builds a [`Paragraph`] with explicit geometry.
///
/// Lines stack downward; clusters are placed left to right on the current
/// line, their width split evenly across their characters.
///
/// ```rust
/// use uc_text::ParagraphBuilder;
///
/// // "ffi" as one ligature followed by "x".
/// let para = ParagraphBuilder::new("ffix")
///     .line(16 * 1024, 12 * 1024)
///     .cluster(0, 3, 21 * 1024)
///     .cluster(3, 1, 7 * 1024)
///     .build();
/// assert_eq!(para.char_count(), 4);
/// assert_eq!(para.clusters().len(), 2);
/// ```
pub struct ParagraphBuilder {
    text: String,
    alignment: Alignment,
    lines: Vec<PendingLine>,
    chars: Vec<CharSlot>,
    clusters: Vec<ClusterSlot>,
}

impl ParagraphBuilder {
    /// Starts a paragraph over `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alignment: Alignment::Left,
            lines: Vec::new(),
            chars: Vec::new(),
            clusters: Vec::new(),
        }
    }

    /// Sets the alignment applied when the paragraph is built.
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Starts a new line of the given height with its baseline `ascent`
    /// below its top.
    pub fn line(mut self, height: i32, ascent: i32) -> Self {
        self.lines.push(PendingLine {
            height,
            ascent,
            pen: 0,
            first_char: self.chars.len(),
            first_cluster: self.clusters.len(),
        });
        self
    }

    fn ensure_line(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(PendingLine {
                height: 0,
                ascent: 0,
                pen: 0,
                first_char: 0,
                first_cluster: 0,
            });
        }
    }

    fn top_of(&self, line: usize) -> i32 {
        self.lines[..line].iter().map(|l| l.height).sum()
    }

    /// Places a cluster of `chars` characters starting at byte `index`.
    ///
    /// Characters are laid out in logical order, or reversed when `rtl`.
    fn place(mut self, index: usize, chars: usize, width: i32, rtl: bool) -> Self {
        self.ensure_line();
        let line_no = self.lines.len() - 1;
        let top = self.top_of(line_no);
        let line = &self.lines[line_no];
        let (height, pen) = (line.height, line.pen);

        let mut indices: Vec<usize> = self
            .text
            .get(index..)
            .unwrap_or("")
            .char_indices()
            .take(chars.max(1))
            .map(|(i, _)| index + i)
            .collect();
        if indices.is_empty() {
            indices.push(index);
        }
        if rtl {
            indices.reverse();
        }

        let cluster = self.clusters.len();
        let count = indices.len() as i32;
        let share = width / count;
        let mut x = pen;
        for (k, byte) in indices.iter().enumerate() {
            let w = if k as i32 == count - 1 {
                width - share * (count - 1)
            } else {
                share
            };
            self.chars.push(CharSlot {
                extents: Rect::new(x, top, w, height),
                index: *byte,
                line: line_no,
                cluster: Some(cluster),
            });
            x += w;
        }
        self.clusters.push(ClusterSlot {
            extents: Rect::new(pen, top, width, height),
            first_char: self.chars.len() - indices.len(),
            char_count: indices.len(),
        });
        self.lines[line_no].pen = pen + width;
        self
    }

    /// Adds a left-to-right cluster.
    pub fn cluster(self, index: usize, chars: usize, width: i32) -> Self {
        self.place(index, chars, width, false)
    }

    /// Adds a right-to-left cluster; its characters run right to left.
    pub fn rtl_cluster(self, index: usize, chars: usize, width: i32) -> Self {
        self.place(index, chars, width, true)
    }

    /// Adds a zero-width line terminator at byte `index`.
    pub fn terminator(mut self, index: usize) -> Self {
        self.ensure_line();
        let line_no = self.lines.len() - 1;
        let top = self.top_of(line_no);
        let line = &self.lines[line_no];
        self.chars.push(CharSlot {
            extents: Rect::new(line.pen, top, 0, line.height),
            index,
            line: line_no,
            cluster: None,
        });
        self
    }

    /// Applies alignment and produces the paragraph.
    pub fn build(mut self) -> Paragraph {
        self.ensure_line();
        let available = self.lines.iter().map(|l| l.pen).max().unwrap_or(0);
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut top = 0;

        for (n, pending) in self.lines.iter().enumerate() {
            let offset = self.alignment.offset(available, pending.pen);
            let char_end = self
                .lines
                .get(n + 1)
                .map_or(self.chars.len(), |l| l.first_char);
            let cluster_end = self
                .lines
                .get(n + 1)
                .map_or(self.clusters.len(), |l| l.first_cluster);
            for slot in &mut self.chars[pending.first_char..char_end] {
                slot.extents.x += offset;
            }
            for cluster in &mut self.clusters[pending.first_cluster..cluster_end] {
                cluster.extents.x += offset;
            }
            lines.push(LineInfo {
                top,
                baseline: top + pending.ascent,
                height: pending.height,
                x: offset,
                width: pending.pen,
            });
            top += pending.height;
        }

        Paragraph::from_parts(self.text, lines, self.chars, self.clusters, self.alignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const U: i32 = 1024;

    fn two_lines() -> Paragraph {
        // "ab\nc": terminator after "ab".
        ParagraphBuilder::new("ab\nc")
            .line(20 * U, 15 * U)
            .cluster(0, 1, 8 * U)
            .cluster(1, 1, 8 * U)
            .terminator(2)
            .line(20 * U, 15 * U)
            .cluster(3, 1, 8 * U)
            .build()
    }

    #[test]
    fn test_builder_geometry() {
        let para = two_lines();
        assert_eq!(para.char_count(), 4);
        assert_eq!(para.lines().len(), 2);
        assert_eq!(para.lines()[1].top, 20 * U);
        assert_eq!(para.lines()[1].baseline, 35 * U);
        assert_eq!(para.chars()[1].extents, Rect::new(8 * U, 0, 8 * U, 20 * U));
        assert_eq!(para.chars()[2].cluster, None);
        assert_eq!(para.width(), 16 * U);
        assert_eq!(para.height(), 40 * U);
    }

    #[test]
    fn test_char_walk_visits_terminators() {
        let para = two_lines();
        let mut cursor = para.cursor();
        let mut indices = vec![cursor.index()];
        while cursor.next_char() {
            indices.push(cursor.index());
        }
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(cursor.is_end());
        assert_eq!(cursor.index(), 4);
        assert!(!cursor.next_char());
    }

    #[test]
    fn test_cluster_walk_skips_terminators() {
        let para = two_lines();
        let mut cursor = para.cursor();
        let mut baselines = vec![cursor.baseline()];
        while cursor.next_cluster() {
            baselines.push(cursor.baseline());
        }
        assert_eq!(baselines, vec![15 * U, 15 * U, 35 * U]);
    }

    #[test]
    fn test_ligature_split() {
        let para = ParagraphBuilder::new("ffi")
            .line(10 * U, 8 * U)
            .cluster(0, 3, 10 * U)
            .build();
        let widths: Vec<i32> = para.chars().iter().map(|c| c.extents.width).collect();
        assert_eq!(widths, vec![3413, 3413, 3414]);
        assert_eq!(widths.iter().sum::<i32>(), 10 * U);

        let mut cursor = para.cursor();
        assert_eq!(cursor.cluster_extents().width, 10 * U);
        assert!(!cursor.next_cluster());
    }

    #[test]
    fn test_rtl_cluster_order() {
        let para = ParagraphBuilder::new("אב")
            .line(10 * U, 8 * U)
            .rtl_cluster(2, 1, 5 * U)
            .rtl_cluster(0, 1, 5 * U)
            .build();
        let indices: Vec<usize> = para.chars().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2, 0]);
    }

    #[test]
    fn test_alignment_offsets() {
        let para = ParagraphBuilder::new("abc")
            .alignment(Alignment::Right)
            .line(10 * U, 8 * U)
            .cluster(0, 1, 10 * U)
            .cluster(1, 1, 10 * U)
            .line(10 * U, 8 * U)
            .cluster(2, 1, 10 * U)
            .build();
        assert_eq!(para.lines()[1].x, 10 * U);
        assert_eq!(para.chars()[2].extents.x, 10 * U);
        assert_eq!(para.width(), 20 * U);
    }

    #[test]
    fn test_end_extents() {
        let para = ParagraphBuilder::new("").build();
        let cursor = para.cursor();
        assert!(cursor.is_end());
        assert_eq!(cursor.char_extents(), Rect::default());
        assert_eq!(cursor.cluster_extents(), Rect::default());
        assert_eq!(cursor.baseline(), 0);
    }
}
