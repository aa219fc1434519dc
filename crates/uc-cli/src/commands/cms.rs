//! Colour profile commands.

use crate::{CmsInfoArgs, CmsPixelArgs};
use anyhow::{Context, Result, bail};
use tracing::{debug, trace};
use uc_cms::{Intent, PixelMode, Profile, Transform};

/// Prints name, model, manufacturer, copyright and colour space of each
/// profile.
pub fn run_info(args: CmsInfoArgs, verbose: bool) -> Result<()> {
    trace!(count = args.profiles.len(), "cms::run_info");
    for spec in &args.profiles {
        let profile = super::open_profile(spec)?;
        println!("{spec}");
        println!("  Name:         {}", profile.name());
        println!("  Product:      {}", profile.product());
        println!("  Manufacturer: {}", profile.manufacturer());
        println!("  Copyright:    {}", profile.copyright());
        println!("  Colour space: {}", profile.color_space());
        if verbose {
            let size = profile.to_bytes().map(|b| b.len() as u64).unwrap_or(0);
            println!("  ICC size:     {}", super::format_size(size));
        }
        if args.profiles.len() > 1 {
            println!();
        }
    }
    Ok(())
}

/// Pixel mode matching a profile's colour space.
fn natural_mode(profile: &Profile) -> PixelMode {
    if profile.is_cmyk() {
        PixelMode::Cmyk
    } else if profile.is_gray() {
        PixelMode::Gray8
    } else if profile.is_lab() {
        PixelMode::Lab
    } else {
        PixelMode::Rgba
    }
}

/// Converts one pixel and prints the output channels.
pub fn run_pixel(args: CmsPixelArgs, verbose: bool) -> Result<()> {
    trace!(from = %args.from, to = %args.to, "cms::run_pixel");
    let [c1, c2, c3, c4] = <[f64; 4]>::try_from(args.channels.as_slice())
        .map_err(|_| anyhow::anyhow!("expected four channel values"))?;

    let input = super::open_profile(&args.from)?;
    let output = super::open_profile(&args.to)?;
    let in_mode = PixelMode::from_tag(&args.in_mode);
    let out_mode = match &args.out_mode {
        Some(tag) => PixelMode::from_tag(tag),
        None => natural_mode(&output),
    };
    let settings = uc_core::settings::current();
    let intent = Intent::from_code(args.intent.unwrap_or(settings.cms.intent))?;
    debug!(%in_mode, %out_mode, ?intent, "building transform");

    let transform = Transform::new(&input, in_mode, &output, out_mode, intent, settings.cms.flags)
        .context("Failed to build transform")?;

    if verbose {
        println!("{} ({in_mode}) -> {} ({out_mode})", input.name(), output.name());
    }

    if args.float {
        if [c1, c2, c3, c4].iter().any(|c| !(0.0..=1.0).contains(c)) {
            bail!("float channels must lie in 0..=1");
        }
        let out = transform.transform_pixel_f64([c1, c2, c3, c4]);
        println!("{:.4} {:.4} {:.4} {:.4}", out[0], out[1], out[2], out[3]);
    } else {
        // Truncated to 8 bits like the binding does.
        let channels = [c1, c2, c3, c4].map(|c| c as i64 as u8);
        let out = transform.transform_pixel(channels);
        println!("{} {} {} {}", out[0], out[1], out[2], out[3]);
    }
    Ok(())
}
