//! Fixed-point engine units and paragraph alignment.
//!
//! Geometry inside a [`Paragraph`](crate::Paragraph) is stored as integers
//! in 1/[`SCALE`] pixel steps. Everything handed back to callers is `f64`
//! pixels.

/// Engine units per pixel.
pub const SCALE: i32 = 1024;

/// Converts pixels to engine units, rounding to the nearest unit.
#[inline]
pub fn to_units(px: f32) -> i32 {
    (px * SCALE as f32).round() as i32
}

/// Converts engine units to pixels.
#[inline]
pub fn to_pixels(units: i32) -> f64 {
    units as f64 / SCALE as f64
}

/// Horizontal alignment of paragraph lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Lines start at the left edge.
    #[default]
    Left,
    /// Lines are centred.
    Center,
    /// Lines end at the right edge.
    Right,
}

impl Alignment {
    /// Decodes a caller alignment code into `(alignment, justify)`.
    ///
    /// | code | alignment | justify |
    /// |------|-----------|---------|
    /// | 0    | left      | false   |
    /// | 1    | center    | false   |
    /// | 2    | right     | false   |
    /// | 3    | left      | true    |
    ///
    /// Any other code yields `None` and callers leave the layout unchanged.
    pub fn from_code(code: i32) -> Option<(Alignment, bool)> {
        match code {
            0 => Some((Alignment::Left, false)),
            1 => Some((Alignment::Center, false)),
            2 => Some((Alignment::Right, false)),
            3 => Some((Alignment::Left, true)),
            _ => None,
        }
    }

    /// Share of the paragraph width that output x coordinates are shifted
    /// left by: 0, 0.5 or 1.
    pub fn shift(self) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => 0.5,
            Alignment::Right => 1.0,
        }
    }

    /// Mirrors left and right for right-to-left paragraphs.
    pub(crate) fn resolve(self, rtl: bool) -> Self {
        match (self, rtl) {
            (Alignment::Left, true) => Alignment::Right,
            (Alignment::Right, true) => Alignment::Left,
            (other, _) => other,
        }
    }

    /// Offset of a line of width `line` inside a box of width `available`.
    pub(crate) fn offset(self, available: i32, line: i32) -> i32 {
        let slack = (available - line).max(0);
        match self {
            Alignment::Left => 0,
            Alignment::Center => slack / 2,
            Alignment::Right => slack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_codes() {
        assert_eq!(Alignment::from_code(0), Some((Alignment::Left, false)));
        assert_eq!(Alignment::from_code(1), Some((Alignment::Center, false)));
        assert_eq!(Alignment::from_code(2), Some((Alignment::Right, false)));
        assert_eq!(Alignment::from_code(3), Some((Alignment::Left, true)));
        assert_eq!(Alignment::from_code(4), None);
        assert_eq!(Alignment::from_code(-1), None);
    }

    #[test]
    fn test_units() {
        assert_eq!(to_units(1.0), SCALE);
        assert_eq!(to_units(0.5), 512);
        assert_relative_eq!(to_pixels(1536), 1.5);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(Alignment::Left.offset(100, 40), 0);
        assert_eq!(Alignment::Center.offset(100, 40), 30);
        assert_eq!(Alignment::Right.offset(100, 40), 60);
        assert_eq!(Alignment::Right.offset(10, 40), 0);
        assert_eq!(Alignment::Left.resolve(true), Alignment::Right);
        assert_eq!(Alignment::Center.resolve(true), Alignment::Center);
    }
}
