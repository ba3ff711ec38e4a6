use clap::{Parser, Subcommand};
use image_facade::config::{self, EngineConfig, EngineKind};
use image_facade::imaging::{
    Color, Dimension, Image, ImageFormat, ResizeFlags, operations, parse_resize_flags,
};
use image_facade::output::{self, Identity};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Where and how to write the result.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Output file, or `-` for stdout
    output: PathBuf,

    /// Output format; defaults to the output file's extension
    #[arg(long)]
    format: Option<ImageFormat>,

    /// JPEG quality 0-100 (default 85) or PNG compression 0-9 (default 9)
    #[arg(long)]
    quality: Option<i32>,
}

#[derive(Parser)]
#[command(name = "image-facade")]
#[command(about = "Resize, crop, sharpen and composite JPEG, PNG and GIF images")]
#[command(long_about = "\
Resize, crop, sharpen and composite JPEG, PNG and GIF images

Every command runs on the engine chosen in the config file (or --engine):

  metadata-aware   keeps the ICC profile; keeps EXIF/XMP/IPTC in JPEG output
                   when preserve_metadata_on_save is on (default engine)
  raster           plain pixels, all metadata dropped

Dimensions accept pixels (120) or percentages (50%). A negative width or
height mirrors the image on that axis.

Resize flags (combine with |): fit, shrink-only, stretch, fill, exact

Run 'image-facade gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured engine
    #[arg(long, global = true)]
    engine: Option<EngineKind>,

    /// Log geometry and engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print size and format of an image
    Identify {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resize to a bounding box
    Resize {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
        /// Target width (pixels or percent)
        #[arg(long, allow_hyphen_values = true)]
        width: Option<Dimension>,
        /// Target height (pixels or percent)
        #[arg(long, allow_hyphen_values = true)]
        height: Option<Dimension>,
        /// Resize mode, e.g. `fit`, `fill`, `exact`, `fit|shrink-only`
        #[arg(long, default_value = "fit", value_parser = parse_resize_flags)]
        flags: ResizeFlags,
    },
    /// Cut out a window
    Crop {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
        #[arg(long, allow_hyphen_values = true)]
        left: Dimension,
        #[arg(long, allow_hyphen_values = true)]
        top: Dimension,
        #[arg(long)]
        width: Dimension,
        #[arg(long)]
        height: Dimension,
    },
    /// Apply the engine's sharpening filter
    Sharpen {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Draw one image on top of another
    Place {
        base: PathBuf,
        overlay: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
        /// Offset from the left edge; percentages are of the free space
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        left: Dimension,
        /// Offset from the top edge; percentages are of the free space
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        top: Dimension,
        /// Opacity 0-100
        #[arg(long, default_value_t = 100)]
        opacity: i32,
    },
    /// Create a solid canvas
    Blank {
        #[command(flatten)]
        out: OutputArgs,
        #[arg(long)]
        width: i64,
        #[arg(long)]
        height: i64,
        /// Fill colour as r,g,b or r,g,b,alpha (alpha 0 opaque .. 127 transparent)
        #[arg(long)]
        color: Option<Color>,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine_config = resolve_engine_config(cli.config.as_deref(), cli.engine)?;

    match cli.command {
        Command::Identify { input, json } => {
            let image = Image::open(&input, &engine_config)?;
            let identity = Identity::of(&image);
            if json {
                println!("{}", output::format_identify_json(&identity)?);
            } else {
                println!("{}", output::format_identify(&identity));
            }
        }
        Command::Resize {
            input,
            out,
            width,
            height,
            flags,
        } => {
            let mut image = Image::open(&input, &engine_config)?;
            image.resize(width, height, flags)?;
            write_output(&image, &out)?;
        }
        Command::Crop {
            input,
            out,
            left,
            top,
            width,
            height,
        } => {
            let mut image = Image::open(&input, &engine_config)?;
            image.crop(left, top, width, height)?;
            write_output(&image, &out)?;
        }
        Command::Sharpen { input, out } => {
            let mut image = Image::open(&input, &engine_config)?;
            image.sharpen()?;
            write_output(&image, &out)?;
        }
        Command::Place {
            base,
            overlay,
            out,
            left,
            top,
            opacity,
        } => {
            let mut image = Image::open(&base, &engine_config)?;
            let overlay = Image::open(&overlay, &engine_config)?;
            image.place(&overlay, left, top, opacity)?;
            write_output(&image, &out)?;
        }
        Command::Blank {
            out,
            width,
            height,
            color,
        } => {
            let image = Image::blank(width, height, color, &engine_config)?;
            write_output(&image, &out)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (or defaults), then the `--engine` override.
fn resolve_engine_config(
    path: Option<&Path>,
    engine: Option<EngineKind>,
) -> Result<EngineConfig, config::ConfigError> {
    let mut engine_config = match path {
        Some(path) => config::load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(engine) = engine {
        engine_config.engine = engine;
        engine_config.validate()?;
    }
    Ok(engine_config)
}

/// Save to the output path, or stream to stdout for `-`.
fn write_output(image: &Image, out: &OutputArgs) -> Result<(), Box<dyn Error>> {
    if out.output == Path::new("-") {
        let format = out.format.ok_or("writing to stdout requires --format")?;
        let mut stdout = std::io::stdout().lock();
        image.send(&mut stdout, format, out.quality)?;
        stdout.flush()?;
    } else {
        let format = operations::resolve_format(&out.output, out.format)?;
        image.save(&out.output, out.quality, Some(format))?;
        eprintln!("{}", output::format_written(&out.output, image, format));
    }
    Ok(())
}
