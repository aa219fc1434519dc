//! uc2 - command line front end for the native bindings
//!
//! Inspects colour profiles, converts images and dumps text layout geometry
//! using the same engines the Python extension exposes.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "uc2")]
#[command(author, version, about = "Colour, image and text binding tools")]
#[command(long_about = "
Command line access to the uc2 colour, image and text bindings.

Examples:
  uc2 cms info profile.icc                   # Profile name, model, copyright
  uc2 cms pixel --to lab 255 0 0 0           # Convert one sRGB pixel to Lab
  uc2 img info animation.gif                 # Frames, types and colourspaces
  uc2 img convert layers.gif flat.png --flatten
  uc2 text clusters 'Hello world' --font 'Serif 14' --align 1
  uc2 text fonts                             # Families and faces
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (YAML); defaults to $UC2_CONFIG
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Colour profiles and transforms
    Cms(CmsArgs),

    /// Image wands
    Img(ImgArgs),

    /// Text layout
    Text(TextArgs),
}

#[derive(Args)]
struct CmsArgs {
    #[command(subcommand)]
    command: CmsCommand,
}

#[derive(Subcommand)]
enum CmsCommand {
    /// Show profile information
    Info(CmsInfoArgs),

    /// Convert one pixel between profiles
    Pixel(CmsPixelArgs),
}

#[derive(Args)]
struct CmsInfoArgs {
    /// Profile file, or one of the built-ins: srgb, lab, gray
    #[arg(required = true)]
    profiles: Vec<String>,
}

#[derive(Args)]
struct CmsPixelArgs {
    /// Source profile (file or built-in)
    #[arg(long, default_value = "srgb")]
    from: String,

    /// Target profile (file or built-in)
    #[arg(long, default_value = "srgb")]
    to: String,

    /// Input pixel mode tag (RGBA, CMYK, L, LAB, ...)
    #[arg(long, default_value = "RGBA")]
    in_mode: String,

    /// Output pixel mode tag; defaults to the target profile's natural mode
    #[arg(long)]
    out_mode: Option<String>,

    /// Rendering intent 0..=3; defaults to the configured intent
    #[arg(short, long)]
    intent: Option<u32>,

    /// Float channels in 0..=1 instead of bytes
    #[arg(long)]
    float: bool,

    /// Four channel values
    #[arg(num_args = 4, required = true, allow_negative_numbers = true)]
    channels: Vec<f64>,
}

#[derive(Args)]
struct ImgArgs {
    #[command(subcommand)]
    command: ImgCommand,
}

#[derive(Subcommand)]
enum ImgCommand {
    /// Show frames, types and colourspaces
    Info(ImgInfoArgs),

    /// Convert an image to another format
    #[command(visible_alias = "c")]
    Convert(ImgConvertArgs),
}

#[derive(Args)]
struct ImgInfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,
}

#[derive(Args)]
struct ImgConvertArgs {
    /// Input image
    input: PathBuf,

    /// Output image; the extension picks the format
    output: PathBuf,

    /// Merge all frames into one before writing
    #[arg(long)]
    flatten: bool,

    /// Convert to an image type, e.g. GrayscaleType
    #[arg(short = 't', long = "type")]
    image_type: Option<String>,

    /// Drop the alpha channel
    #[arg(long)]
    no_alpha: bool,

    /// Output format tag when the extension names none
    #[arg(short, long)]
    format: Option<String>,
}

#[derive(Args)]
struct TextArgs {
    #[command(subcommand)]
    command: TextCommand,
}

#[derive(Subcommand)]
enum TextCommand {
    /// Lay out text and print per-cluster glyph boxes
    Clusters(TextClustersArgs),

    /// List font families and faces
    Fonts(TextFontsArgs),
}

#[derive(Args)]
struct TextClustersArgs {
    /// Text to lay out
    text: String,

    /// Treat TEXT as markup
    #[arg(short, long)]
    markup: bool,

    /// Font description, e.g. "DejaVu Sans Bold 12"
    #[arg(short, long)]
    font: Option<String>,

    /// Wrap width in pixels
    #[arg(short, long)]
    width: Option<f32>,

    /// Alignment code: 0 left, 1 center, 2 right, 3 justified
    #[arg(short, long, default_value = "0")]
    align: i32,

    /// Also print per-character boxes
    #[arg(long)]
    chars: bool,
}

#[derive(Args)]
struct TextFontsArgs {
    /// Only families whose name contains this text (case-insensitive)
    filter: Option<String>,

    /// Extra font file or directory to load first
    #[arg(long)]
    load: Vec<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&std::path::Path>) -> Result<()> {
    let settings = uc_core::Settings::lookup(path).with_context(|| match path {
        Some(path) => format!("Failed to load settings: {}", path.display()),
        None => "Failed to load settings".to_string(),
    })?;
    let [red, green, blue] = settings.cms.alarm_codes;
    uc_cms::set_alarm_codes(red, green, blue);
    uc_core::settings::install(settings);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Cms(args) => match args.command {
            CmsCommand::Info(args) => commands::cms::run_info(args, cli.verbose),
            CmsCommand::Pixel(args) => commands::cms::run_pixel(args, cli.verbose),
        },
        Commands::Img(args) => match args.command {
            ImgCommand::Info(args) => commands::img::run_info(args, cli.verbose),
            ImgCommand::Convert(args) => commands::img::run_convert(args, cli.verbose),
        },
        Commands::Text(args) => match args.command {
            TextCommand::Clusters(args) => commands::text::run_clusters(args, cli.verbose),
            TextCommand::Fonts(args) => commands::text::run_fonts(args, cli.verbose),
        },
    }
}
