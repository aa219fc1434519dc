//! Text layout commands.

use crate::{TextClustersArgs, TextFontsArgs};
use anyhow::{Context, Result, bail};
use tracing::{debug, trace};
use uc_text::{FontDescription, Layout, to_units};

/// Text of a cluster whose byte range ends at the start of its last char.
fn cluster_text(text: &str, start: usize, last: usize) -> &str {
    let stop = text
        .get(last..)
        .and_then(|rest| rest.chars().next())
        .map_or(last, |c| last + c.len_utf8());
    text.get(start..stop).unwrap_or("")
}

/// Lays out text and prints size, baselines and cluster geometry.
pub fn run_clusters(args: TextClustersArgs, verbose: bool) -> Result<()> {
    trace!(len = args.text.len(), markup = args.markup, "text::run_clusters");
    let mut layout = Layout::new();
    if let Some(desc) = &args.font {
        layout.set_font_description(&FontDescription::parse(desc));
    }
    if let Some(width) = args.width {
        layout.set_width(to_units(width));
    }
    if !layout.set_alignment_code(args.align) {
        bail!("unknown alignment code {} (expected 0..=3)", args.align);
    }
    if args.markup {
        layout.set_markup(&args.text).context("Invalid markup")?;
    } else {
        layout.set_text(&args.text);
    }

    let n = layout.char_count();
    let (w, h) = layout.pixel_size()?;
    let lines = layout.line_positions()?;
    let out = layout.cluster_positions(n)?;
    debug!(chars = n, glyphs = out.glyphs.len(), "layout extracted");

    if verbose {
        println!("Font:       {}", layout.font_description());
    }
    println!("Size:       {w}x{h}");
    println!("Characters: {n}");
    println!(
        "Baselines:  {}",
        lines.iter().map(|b| format!("{b:.2}")).collect::<Vec<_>>().join(" ")
    );
    println!(
        "Direction:  {}{}",
        if out.directions.base_rtl { "rtl" } else { "ltr" },
        if out.directions.mixed { " (mixed)" } else { "" }
    );

    println!("Glyphs:");
    for (i, g) in out.glyphs.iter().enumerate() {
        println!(
            "  {i:>3} x={:8.2} y={:8.2} w={:7.2} h={:7.2} base={:8.2} byte={}",
            g.x, g.y, g.width, g.height, g.baseline, g.index
        );
    }
    if !out.cluster_ranges.is_empty() {
        println!("Clusters:");
        for (slots, bytes) in out.cluster_ranges.iter().zip(&out.byte_ranges) {
            let text = cluster_text(layout.text(), bytes.start, bytes.end);
            println!(
                "  slots {}..{} bytes {}..{} {text:?}",
                slots.start, slots.end, bytes.start, bytes.end
            );
        }
    }

    if args.chars {
        println!("Chars:");
        for (i, c) in layout.char_positions(n)?.iter().enumerate() {
            println!(
                "  {i:>3} x={:8.2} y={:8.2} w={:7.2} h={:7.2} base={:8.2}",
                c.x, c.y, c.width, c.height, c.baseline
            );
        }
    }
    Ok(())
}

/// Lists font families with their faces.
pub fn run_fonts(args: TextFontsArgs, verbose: bool) -> Result<()> {
    trace!(filter = ?args.filter, "text::run_fonts");
    for path in &args.load {
        uc_text::load_fonts(path)
            .with_context(|| format!("Failed to load fonts: {}", path.display()))?;
    }

    let needle = args.filter.as_deref().map(str::to_lowercase);
    let families = uc_text::font_map()?;
    let mut shown = 0usize;
    for family in &families {
        if needle
            .as_deref()
            .is_some_and(|n| !family.name.to_lowercase().contains(n))
        {
            continue;
        }
        shown += 1;
        match &family.faces {
            Some(faces) if verbose => println!("{}: {}", family.name, faces.join(", ")),
            _ => println!("{}", family.name),
        }
    }
    if verbose {
        println!("{shown} of {} families", families.len());
    }
    Ok(())
}
