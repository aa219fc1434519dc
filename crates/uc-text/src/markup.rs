//! Markup subset parser.
//!
//! Turns `<b>bold</b> and <span font="Serif 8">small</span>` into plain
//! text plus styled byte ranges. Supported tags: `b i s u tt big small
//! sub sup span` and an optional `markup` root. Entities and numeric
//! character references are resolved.

use std::ops::Range;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

use crate::font::{FontDescription, FontSize, FontStretch, FontStyle, WEIGHT_NORMAL, weight_from_name};
use crate::{TextError, TextResult};

/// Size step of `<big>`, `<small>` and the relative size keywords.
const SCALE_STEP: f64 = 1.2;

/// Style overrides in effect for a run of text.
///
/// `None` fields inherit from the enclosing element and finally from the
/// layout's font description.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanStyle {
    /// Family list.
    pub families: Option<Vec<String>>,
    /// Absolute size.
    pub size: Option<FontSize>,
    /// Numeric weight.
    pub weight: Option<u16>,
    /// Slant.
    pub style: Option<FontStyle>,
    /// Width class.
    pub stretch: Option<FontStretch>,
    /// Size multiplier from `<big>`, `<small>` and keywords.
    pub scale: f64,
    /// Foreground colour as RGBA.
    pub color: Option<[u8; 4]>,
    /// Underlined.
    pub underline: bool,
    /// Struck through.
    pub strikethrough: bool,
}

impl Default for SpanStyle {
    fn default() -> Self {
        Self {
            families: None,
            size: None,
            weight: None,
            style: None,
            stretch: None,
            scale: 1.0,
            color: None,
            underline: false,
            strikethrough: false,
        }
    }
}

impl SpanStyle {
    /// Final font for this run on top of `base`.
    pub fn resolve(&self, base: &FontDescription) -> FontDescription {
        let mut fd = base.clone();
        if let Some(families) = &self.families {
            fd.set_families(families.clone());
        }
        if let Some(weight) = self.weight {
            fd.set_weight(weight);
        }
        if let Some(style) = self.style {
            fd.set_style(style);
        }
        if let Some(stretch) = self.stretch {
            fd.set_stretch(stretch);
        }
        if let Some(size) = self.size.or(base.size()) {
            fd.set_size(size.scaled(self.scale));
        } else if self.scale != 1.0 {
            fd.set_size(FontSize::Points(12.0 * self.scale));
        }
        fd
    }

    fn apply_font(&mut self, fd: &FontDescription) {
        if !fd.families().is_empty() {
            self.families = Some(fd.families().to_vec());
        }
        if fd.weight() != WEIGHT_NORMAL {
            self.weight = Some(fd.weight());
        }
        if fd.style() != FontStyle::Normal {
            self.style = Some(fd.style());
        }
        if fd.stretch() != FontStretch::Normal {
            self.stretch = Some(fd.stretch());
        }
        if let Some(size) = fd.size() {
            self.size = Some(size);
            self.scale = 1.0;
        }
    }
}

/// A styled byte range of [`StyledText::text`].
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    /// Byte range in the plain text.
    pub range: Range<usize>,
    /// Style of the range.
    pub style: SpanStyle,
}

/// Plain text with styled ranges covering all of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledText {
    /// Text with tags removed and entities resolved.
    pub text: String,
    /// Consecutive, non-overlapping ranges in text order.
    pub spans: Vec<StyledSpan>,
}

impl StyledText {
    /// Unstyled text as a single span.
    pub fn plain(text: &str) -> Self {
        let mut out = StyledText::default();
        out.push(text, &SpanStyle::default());
        out
    }

    fn push(&mut self, text: &str, style: &SpanStyle) {
        if text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(text);
        let end = self.text.len();
        match self.spans.last_mut() {
            Some(last) if last.style == *style && last.range.end == start => last.range.end = end,
            _ => self.spans.push(StyledSpan {
                range: start..end,
                style: style.clone(),
            }),
        }
    }
}

/// Parses markup into styled text.
pub fn parse(markup: &str) -> TextResult<StyledText> {
    let mut reader = Reader::from_str(markup);
    let mut stack: Vec<(String, SpanStyle)> = Vec::new();
    let mut out = StyledText::default();

    loop {
        let offset = reader.buffer_position() as usize;
        let current = stack.last().map(|(_, s)| s.clone()).unwrap_or_default();
        let event = reader
            .read_event()
            .map_err(|e| TextError::markup(reader.error_position() as usize, e.to_string()))?;

        match event {
            Event::Start(e) => {
                let name = tag_name(&e);
                let style = apply_tag(&name, &e, current, offset)?;
                stack.push((name, style));
            }
            Event::Empty(e) => {
                apply_tag(&tag_name(&e), &e, current, offset)?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match stack.pop() {
                    Some((open, _)) if open == name => {}
                    _ => return Err(TextError::markup(offset, format!("unexpected </{name}>"))),
                }
            }
            Event::Text(t) => {
                let text = t
                    .decode()
                    .map_err(|e| TextError::markup(offset, e.to_string()))?;
                out.push(&text, &current);
            }
            Event::CData(c) => {
                out.push(&String::from_utf8_lossy(&c), &current);
            }
            Event::GeneralRef(r) => {
                let ch = match r.resolve_char_ref() {
                    Ok(Some(ch)) => ch,
                    Ok(None) => named_entity(&String::from_utf8_lossy(&r)).ok_or_else(|| {
                        TextError::markup(offset, format!("unknown entity &{};", String::from_utf8_lossy(&r)))
                    })?,
                    Err(e) => return Err(TextError::markup(offset, e.to_string())),
                };
                out.push(ch.encode_utf8(&mut [0; 4]), &current);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((open, _)) = stack.last() {
        return Err(TextError::markup(markup.len(), format!("unclosed <{open}>")));
    }
    trace!(len = out.text.len(), spans = out.spans.len(), "markup parsed");
    Ok(out)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

fn apply_tag(
    name: &str,
    e: &BytesStart<'_>,
    mut style: SpanStyle,
    offset: usize,
) -> TextResult<SpanStyle> {
    match name {
        "markup" => {}
        "b" => style.weight = Some(700),
        "i" => style.style = Some(FontStyle::Italic),
        "s" => style.strikethrough = true,
        "u" => style.underline = true,
        "tt" => style.families = Some(vec!["Monospace".into()]),
        "big" => style.scale *= SCALE_STEP,
        "small" | "sub" | "sup" => style.scale /= SCALE_STEP,
        "span" => {
            for attr in e.attributes() {
                let attr = attr.map_err(|err| TextError::markup(offset, err.to_string()))?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let raw = String::from_utf8_lossy(&attr.value).into_owned();
                let value = quick_xml::escape::unescape(&raw)
                    .map_err(|err| TextError::markup(offset, err.to_string()))?;
                apply_attribute(&mut style, &key, &value)
                    .map_err(|message| TextError::markup(offset, message))?;
            }
        }
        other => return Err(TextError::markup(offset, format!("unknown tag <{other}>"))),
    }
    Ok(style)
}

fn apply_attribute(style: &mut SpanStyle, key: &str, value: &str) -> Result<(), String> {
    let bad = || format!("invalid value {value:?} for {key}");
    match key {
        "font" | "font_desc" => style.apply_font(&FontDescription::parse(value)),
        "font_family" | "face" => {
            let fd = FontDescription::parse(&format!("{value},"));
            style.families = Some(fd.families().to_vec());
        }
        "size" | "font_size" => apply_size(style, value).ok_or_else(bad)?,
        "weight" | "font_weight" => {
            let weight = match value.parse::<u16>() {
                Ok(w) => w,
                Err(_) if value.eq_ignore_ascii_case("normal") => WEIGHT_NORMAL,
                Err(_) => weight_from_name(value)
                    .or_else(|| weight_from_name(&value.replace("ultra", "ultra-")))
                    .ok_or_else(bad)?,
            };
            style.weight = Some(weight.clamp(1, 1000));
        }
        "style" | "font_style" => {
            style.style = Some(match value.to_ascii_lowercase().as_str() {
                "normal" => FontStyle::Normal,
                "italic" => FontStyle::Italic,
                "oblique" => FontStyle::Oblique,
                _ => return Err(bad()),
            })
        }
        "stretch" | "font_stretch" => {
            style.stretch = Some(FontStretch::from_name(value).ok_or_else(bad)?);
        }
        "foreground" | "fgcolor" | "color" => style.color = Some(parse_color(value).ok_or_else(bad)?),
        "underline" => style.underline = value != "none",
        "strikethrough" => {
            style.strikethrough = match value {
                "true" => true,
                "false" => false,
                _ => return Err(bad()),
            }
        }
        _ => return Err(format!("unknown attribute {key}")),
    }
    Ok(())
}

fn apply_size(style: &mut SpanStyle, value: &str) -> Option<()> {
    let keyword_scale = |steps: i32| SCALE_STEP.powi(steps);
    match value {
        "xx-small" => style.scale = keyword_scale(-3),
        "x-small" => style.scale = keyword_scale(-2),
        "small" => style.scale = keyword_scale(-1),
        "medium" => style.scale = 1.0,
        "large" => style.scale = keyword_scale(1),
        "x-large" => style.scale = keyword_scale(2),
        "xx-large" => style.scale = keyword_scale(3),
        "smaller" => style.scale /= SCALE_STEP,
        "larger" => style.scale *= SCALE_STEP,
        _ => {
            let size = if let Some(pct) = value.strip_suffix('%') {
                style.scale *= pct.parse::<f64>().ok()? / 100.0;
                return Some(());
            } else if let Some(pt) = value.strip_suffix("pt") {
                FontSize::Points(pt.parse().ok()?)
            } else if let Some(px) = value.strip_suffix("px") {
                FontSize::Pixels(px.parse().ok()?)
            } else {
                // Bare numbers are 1024ths of a point.
                FontSize::Points(value.parse::<f64>().ok()? / 1024.0)
            };
            style.size = Some(size);
            style.scale = 1.0;
        }
    }
    Some(())
}

fn parse_color(value: &str) -> Option<[u8; 4]> {
    let named = match value.to_ascii_lowercase().as_str() {
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "lime" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "cyan" => Some([0, 255, 255, 255]),
        "magenta" => Some([255, 0, 255, 255]),
        "gray" | "grey" => Some([190, 190, 190, 255]),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    let hex = value.strip_prefix('#')?;
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some([digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 255]),
        6 => Some([pair(0)?, pair(2)?, pair(4)?, 255]),
        8 => Some([pair(0)?, pair(2)?, pair(4)?, pair(6)?]),
        _ => None,
    }
}
