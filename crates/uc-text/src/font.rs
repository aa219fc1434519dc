//! Font descriptions in the `"[FAMILY-LIST] [STYLE-OPTIONS] [SIZE]"` form.
//!
//! ```rust
//! use uc_text::{FontDescription, FontSize};
//!
//! let fd = FontDescription::parse("DejaVu Sans, Sans Bold Italic 12");
//! assert_eq!(fd.families(), ["DejaVu Sans", "Sans"]);
//! assert_eq!(fd.weight(), 700);
//! assert_eq!(fd.size(), Some(FontSize::Points(12.0)));
//! assert_eq!(fd.to_string(), "DejaVu Sans,Sans Bold Italic 12");
//! ```
//!
//! Parsing never fails: words that are not style options or a trailing
//! size are taken as part of the family list.

use std::fmt;

use uc_core::NativeResource;

const WEIGHTS: [(&str, u16); 21] = [
    ("Thin", 100),
    ("Ultra-Light", 200),
    ("Ultralight", 200),
    ("Extra-Light", 200),
    ("Light", 300),
    ("Semi-Light", 350),
    ("Demi-Light", 350),
    ("Book", 380),
    ("Regular", 400),
    ("Medium", 500),
    ("Semi-Bold", 600),
    ("Semibold", 600),
    ("Demi-Bold", 600),
    ("Demibold", 600),
    ("Bold", 700),
    ("Ultra-Bold", 800),
    ("Extra-Bold", 800),
    ("Heavy", 900),
    ("Black", 900),
    ("Ultra-Heavy", 1000),
    ("Extra-Heavy", 1000),
];

/// Normal weight.
pub const WEIGHT_NORMAL: u16 = 400;

/// Slant of a face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Slanted with cursive forms.
    Italic,
    /// Mechanically slanted.
    Oblique,
}

/// Width class of a face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl FontStretch {
    const NAMES: [(FontStretch, &'static str); 8] = [
        (FontStretch::UltraCondensed, "Ultra-Condensed"),
        (FontStretch::ExtraCondensed, "Extra-Condensed"),
        (FontStretch::Condensed, "Condensed"),
        (FontStretch::SemiCondensed, "Semi-Condensed"),
        (FontStretch::SemiExpanded, "Semi-Expanded"),
        (FontStretch::Expanded, "Expanded"),
        (FontStretch::ExtraExpanded, "Extra-Expanded"),
        (FontStretch::UltraExpanded, "Ultra-Expanded"),
    ];

    /// Looks up a stretch by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("Normal") {
            return Some(FontStretch::Normal);
        }
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(s, _)| *s)
    }
}

/// Looks up a weight by name, ignoring case.
pub(crate) fn weight_from_name(name: &str) -> Option<u16> {
    WEIGHTS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, w)| *w)
}

/// Requested font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    /// Typographic points, converted with the configured DPI.
    Points(f64),
    /// Device pixels.
    Pixels(f64),
}

impl FontSize {
    /// Size in pixels at `dpi`.
    pub fn to_pixels(self, dpi: f64) -> f64 {
        match self {
            FontSize::Points(pt) => pt * dpi / 72.0,
            FontSize::Pixels(px) => px,
        }
    }

    /// Multiplies the size, keeping its unit.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            FontSize::Points(pt) => FontSize::Points(pt * factor),
            FontSize::Pixels(px) => FontSize::Pixels(px * factor),
        }
    }

    fn parse(word: &str) -> Option<Self> {
        let (number, pixels) = match word.strip_suffix("px") {
            Some(n) => (n, true),
            None => (word, false),
        };
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(if pixels {
            FontSize::Pixels(value)
        } else {
            FontSize::Points(value)
        })
    }
}

/// Family list, style options and size of a requested font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    families: Vec<String>,
    weight: u16,
    style: FontStyle,
    stretch: FontStretch,
    small_caps: bool,
    size: Option<FontSize>,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            families: Vec::new(),
            weight: WEIGHT_NORMAL,
            style: FontStyle::Normal,
            stretch: FontStretch::Normal,
            small_caps: false,
            size: None,
        }
    }
}

impl NativeResource for FontDescription {
    const KIND: &'static str = "PangoFontDescription";
}

impl FontDescription {
    /// Parses a description string.
    pub fn parse(text: &str) -> Self {
        let mut fd = FontDescription::default();
        let mut words: Vec<&str> = text.split_whitespace().collect();

        if let Some(size) = words.last().and_then(|w| FontSize::parse(w)) {
            fd.size = Some(size);
            words.pop();
        }
        while let Some(word) = words.last() {
            if !fd.apply_style_word(word) {
                break;
            }
            words.pop();
        }

        fd.families = words
            .join(" ")
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();
        fd
    }

    fn apply_style_word(&mut self, word: &str) -> bool {
        if word.eq_ignore_ascii_case("Normal") {
            return true;
        }
        if let Some(w) = weight_from_name(word) {
            self.weight = w;
            return true;
        }
        if word.eq_ignore_ascii_case("Italic") {
            self.style = FontStyle::Italic;
            return true;
        }
        if word.eq_ignore_ascii_case("Oblique") {
            self.style = FontStyle::Oblique;
            return true;
        }
        if word.eq_ignore_ascii_case("Roman") {
            self.style = FontStyle::Normal;
            return true;
        }
        if word.eq_ignore_ascii_case("Small-Caps") {
            self.small_caps = true;
            return true;
        }
        if let Some(s) = FontStretch::from_name(word) {
            self.stretch = s;
            return true;
        }
        false
    }

    /// Family names in preference order.
    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Replaces the family list with one family.
    pub fn set_family(&mut self, family: impl Into<String>) {
        self.families = vec![family.into()];
    }

    /// Replaces the family list.
    pub fn set_families(&mut self, families: Vec<String>) {
        self.families = families;
    }

    /// Numeric weight (400 normal, 700 bold).
    pub fn weight(&self) -> u16 {
        self.weight
    }

    /// Sets the numeric weight, clamped to 1..=1000.
    pub fn set_weight(&mut self, weight: u16) {
        self.weight = weight.clamp(1, 1000);
    }

    /// Slant.
    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// Sets the slant.
    pub fn set_style(&mut self, style: FontStyle) {
        self.style = style;
    }

    /// Width class.
    pub fn stretch(&self) -> FontStretch {
        self.stretch
    }

    /// Sets the width class.
    pub fn set_stretch(&mut self, stretch: FontStretch) {
        self.stretch = stretch;
    }

    /// Whether small capitals were requested.
    pub fn small_caps(&self) -> bool {
        self.small_caps
    }

    /// Requested size, if any.
    pub fn size(&self) -> Option<FontSize> {
        self.size
    }

    /// Sets the size.
    pub fn set_size(&mut self, size: FontSize) {
        self.size = Some(size);
    }

    /// Size in pixels at `dpi`, falling back to `fallback` when unset.
    pub fn pixel_size(&self, dpi: f64, fallback: &FontDescription) -> f32 {
        self.size
            .or(fallback.size)
            .map_or(12.0 * dpi / 72.0, |s| s.to_pixels(dpi)) as f32
    }

    /// Overlays the fields `other` sets on top of this description.
    ///
    /// Families and size are taken when `other` has them; style options
    /// when they differ from normal.
    pub fn merge(&mut self, other: &FontDescription) {
        if !other.families.is_empty() {
            self.families = other.families.clone();
        }
        if other.weight != WEIGHT_NORMAL {
            self.weight = other.weight;
        }
        if other.style != FontStyle::Normal {
            self.style = other.style;
        }
        if other.stretch != FontStretch::Normal {
            self.stretch = other.stretch;
        }
        self.small_caps |= other.small_caps;
        if other.size.is_some() {
            self.size = other.size;
        }
    }

    fn weight_name(&self) -> Option<&'static str> {
        if self.weight == WEIGHT_NORMAL {
            return None;
        }
        // First spelling of the closest weight is the canonical one.
        WEIGHTS
            .iter()
            .min_by_key(|(_, w)| w.abs_diff(self.weight))
            .map(|(n, _)| *n)
    }
}

fn is_reserved_word(word: &str) -> bool {
    FontSize::parse(word).is_some() || FontDescription::default().apply_style_word(word)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let text = format!("{value:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl fmt::Display for FontDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<String> = Vec::new();

        if !self.families.is_empty() {
            let mut list = self.families.join(",");
            // A family ending in a style word would be re-read as a style.
            if list.split_whitespace().last().is_some_and(is_reserved_word) {
                list.push(',');
            }
            words.push(list);
        }
        if let Some(name) = self.weight_name() {
            words.push(name.to_string());
        }
        match self.style {
            FontStyle::Normal => {}
            FontStyle::Italic => words.push("Italic".into()),
            FontStyle::Oblique => words.push("Oblique".into()),
        }
        if let Some((_, name)) = FontStretch::NAMES.iter().find(|(s, _)| *s == self.stretch) {
            words.push((*name).into());
        }
        if self.small_caps {
            words.push("Small-Caps".into());
        }
        if words.is_empty() {
            words.push("Normal".into());
        }
        match self.size {
            Some(FontSize::Points(pt)) => words.push(format_number(pt)),
            Some(FontSize::Pixels(px)) => words.push(format!("{}px", format_number(px))),
            None => {}
        }
        f.write_str(&words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_full() {
        let fd = FontDescription::parse("DejaVu Sans, Sans Bold Italic Condensed 12.5");
        assert_eq!(fd.families(), ["DejaVu Sans", "Sans"]);
        assert_eq!(fd.weight(), 700);
        assert_eq!(fd.style(), FontStyle::Italic);
        assert_eq!(fd.stretch(), FontStretch::Condensed);
        assert_eq!(fd.size(), Some(FontSize::Points(12.5)));
    }

    #[test]
    fn test_parse_pixels_and_case() {
        let fd = FontDescription::parse("Monospace bold 10px");
        assert_eq!(fd.families(), ["Monospace"]);
        assert_eq!(fd.weight(), 700);
        assert_eq!(fd.size(), Some(FontSize::Pixels(10.0)));
    }

    #[test]
    fn test_parse_family_only() {
        let fd = FontDescription::parse("Serif");
        assert_eq!(fd.families(), ["Serif"]);
        assert_eq!(fd.size(), None);
        assert_eq!(FontDescription::parse("").families().len(), 0);
    }

    #[test]
    fn test_style_word_inside_family() {
        // "Bold" before the comma belongs to the family list.
        let fd = FontDescription::parse("Foo Bold, 10");
        assert_eq!(fd.families(), ["Foo Bold"]);
        assert_eq!(fd.weight(), WEIGHT_NORMAL);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(FontDescription::parse("Sans 12").to_string(), "Sans 12");
        assert_eq!(
            FontDescription::parse("sans  semibold   italic 9.5").to_string(),
            "sans Semi-Bold Italic 9.5"
        );
        assert_eq!(FontDescription::parse("Mono 10px").to_string(), "Mono 10px");
        assert_eq!(FontDescription::parse("12").to_string(), "Normal 12");
        assert_eq!(FontDescription::parse("Foo Bold, 10").to_string(), "Foo Bold, 10");
    }

    #[test]
    fn test_pixel_size() {
        let fallback = FontDescription::parse("Sans 12");
        assert_relative_eq!(FontDescription::parse("Sans 12").pixel_size(96.0, &fallback), 16.0);
        assert_relative_eq!(FontDescription::parse("Sans 20px").pixel_size(96.0, &fallback), 20.0);
        assert_relative_eq!(FontDescription::parse("Sans").pixel_size(72.0, &fallback), 12.0);
    }

    #[test]
    fn test_merge() {
        let mut base = FontDescription::parse("Sans 12");
        base.merge(&FontDescription::parse("Bold"));
        assert_eq!(base.families(), ["Sans"]);
        assert_eq!(base.weight(), 700);
        base.merge(&FontDescription::parse("Serif 8"));
        assert_eq!(base.families(), ["Serif"]);
        assert_eq!(base.size(), Some(FontSize::Points(8.0)));
        assert_eq!(base.weight(), 700);
    }
}
