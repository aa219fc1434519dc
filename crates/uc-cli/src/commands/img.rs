//! Image wand commands.

use crate::{ImgConvertArgs, ImgInfoArgs};
use anyhow::{Context, Result};
use std::fs;
use tracing::{debug, info, trace};
use uc_img::{ImageType, Toolkit, format_from_path, format_tag};

/// Prints frame count, and size, type and colourspace of every frame.
pub fn run_info(args: ImgInfoArgs, verbose: bool) -> Result<()> {
    trace!(count = args.input.len(), "img::run_info");
    for path in &args.input {
        let file_size = fs::metadata(path)
            .with_context(|| format!("Failed to stat: {}", path.display()))?
            .len();
        let guarded = super::load_wand(path)?;
        let wand = guarded.get()?;

        println!("{}", path.display());
        println!("  File size:  {}", super::format_size(file_size));
        if let Some(format) = format_from_path(path) {
            println!("  Format:     {}", format_tag(format));
        }
        println!("  Frames:     {}", wand.len());
        for (i, frame) in wand.frames().iter().enumerate() {
            println!(
                "  [{i}] {}x{}  {}  {}",
                frame.image.width(),
                frame.image.height(),
                frame.image_type().as_str(),
                frame.colorspace().as_str()
            );
            if verbose && (frame.left, frame.top) != (0, 0) {
                println!("      page offset {},{}", frame.left, frame.top);
            }
        }

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

/// Loads, optionally flattens and retypes, then writes an image.
pub fn run_convert(args: ImgConvertArgs, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "img::run_convert");
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        flatten = args.flatten,
        "Converting image"
    );

    let mut guarded = super::load_wand(&args.input)?;
    if args.flatten {
        let merged = guarded.get_mut()?.merge_layers().context("Failed to merge layers")?;
        debug!(frames = guarded.get()?.len(), "layers merged");
        guarded = Toolkit::global().adopt(merged)?;
    }

    let wand = guarded.get_mut()?;
    if let Some(tag) = &args.format {
        wand.set_format(tag)?;
    }
    if let Some(name) = &args.image_type {
        let ty = ImageType::parse(name);
        if verbose {
            println!("  Type: {} -> {}", wand.image_type().as_str(), ty.as_str());
        }
        wand.set_type(ty)?;
    }
    if args.no_alpha {
        wand.remove_alpha()?;
    }

    wand.write(&args.output)
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;

    if verbose {
        println!(
            "{} -> {} ({} frame(s))",
            args.input.display(),
            args.output.display(),
            wand.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use tempfile::tempdir;
    use uc_img::{Frame, Wand};

    #[test]
    fn test_convert_flattens_and_retypes() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");

        let mut wand = Wand::new();
        wand.push(Frame::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            3,
            2,
            Rgba([90, 90, 90, 200]),
        ))));
        wand.write(&input).unwrap();

        let args = ImgConvertArgs {
            input: input.clone(),
            output: output.clone(),
            flatten: true,
            image_type: Some("GrayscaleType".into()),
            no_alpha: true,
            format: None,
        };
        run_convert(args, false).unwrap();
        run_info(ImgInfoArgs { input: vec![output.clone()] }, true).unwrap();

        let back = super::super::load_wand(&output).unwrap();
        let back = back.get().unwrap();
        assert_eq!(back.len(), 1);
        let frame = back.current().unwrap();
        assert_eq!((frame.image.width(), frame.image.height()), (3, 2));
        assert_eq!(back.colorspace().as_str(), "GRAYColorspace");
        assert!(!frame.image.color().has_alpha());
    }

    #[test]
    fn test_convert_missing_input() {
        let dir = tempdir().unwrap();
        let args = ImgConvertArgs {
            input: dir.path().join("missing.png"),
            output: dir.path().join("out.png"),
            flatten: false,
            image_type: None,
            no_alpha: false,
            format: None,
        };
        assert!(run_convert(args, false).is_err());
        assert!(!dir.path().join("out.png").exists());
    }
}
