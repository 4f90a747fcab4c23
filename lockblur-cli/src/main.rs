//! lockblur CLI - blur an image the way a lock screen blurs its background
//!
//! Decodes an image, blurs it in one of the surface pixel formats, and writes
//! the result.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use image::GenericImageView;
use lockblur::{
    blur_with, BlurParams, FastPathPolicy, Img, PixelFormat, StrategyKind, Surface, RGBA8,
};
use serde::Serialize;

/// Separable Gaussian blur for lock screen backgrounds
///
/// Blurs INPUT in place as a packed-pixel surface and writes OUTPUT. The
/// output format follows the OUTPUT file extension.
#[derive(Parser, Debug)]
#[command(name = "lockblur")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Blur a screenshot:
        lockblur screen.png blurred.png

    Stronger blur with the portable scalar path:
        lockblur --radius 8 --strategy scalar screen.png blurred.png

    Blur only the alpha channel:
        lockblur --pixel-format a8 mask.png mask-blurred.png

    Output JSON for scripting:
        lockblur --json screen.png blurred.png

EXIT CODES:
    0 - Success
    1 - Blur skipped (surface could not be blurred)
    2 - Error (file not found, invalid image, etc.)")]
struct Cli {
    /// Image to blur
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the blurred image
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Blur radius
    ///
    /// Width of the blurred edge band for the scalar strategy, spread of the
    /// approximated Gaussian for the vectorized one.
    #[arg(short, long, default_value = "5", value_name = "N")]
    radius: usize,

    /// Convolution strategy
    #[arg(long, value_enum, default_value = "auto")]
    strategy: StrategyArg,

    /// Which pixels the scalar strategy convolves
    #[arg(long, value_enum, default_value = "edge-band")]
    fast_path: FastPathArg,

    /// Surface pixel format to blur in
    #[arg(long, value_enum, default_value = "argb32")]
    pixel_format: PixelFormatArg,

    /// Output a JSON report
    #[arg(long)]
    json: bool,

    /// Quiet mode - no report on stdout
    #[arg(long, short = 's')]
    quiet: bool,

    /// Log engine decisions to stderr
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Vectorized if the CPU target has a vector unit, else scalar
    Auto,
    /// Portable 17-tap Gaussian
    Scalar,
    /// SIMD repeated box blur
    Vectorized,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => StrategyKind::Auto,
            StrategyArg::Scalar => StrategyKind::Scalar,
            StrategyArg::Vectorized => StrategyKind::Vectorized,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FastPathArg {
    /// Only blur the band within RADIUS of each edge
    EdgeBand,
    /// Blur every pixel
    Never,
}

impl From<FastPathArg> for FastPathPolicy {
    fn from(arg: FastPathArg) -> Self {
        match arg {
            FastPathArg::EdgeBand => FastPathPolicy::EdgeBand,
            FastPathArg::Never => FastPathPolicy::Never,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PixelFormatArg {
    /// Alpha, red, green, blue
    Argb32,
    /// Opaque red, green, blue
    Rgb24,
    /// Alpha only (image luminance is used as alpha)
    A8,
}

impl From<PixelFormatArg> for PixelFormat {
    fn from(arg: PixelFormatArg) -> Self {
        match arg {
            PixelFormatArg::Argb32 => PixelFormat::Argb32,
            PixelFormatArg::Rgb24 => PixelFormat::Rgb24,
            PixelFormatArg::A8 => PixelFormat::A8,
        }
    }
}

#[derive(Serialize)]
struct JsonOutput {
    input: String,
    output: String,
    width: usize,
    height: usize,
    pixel_format: &'static str,
    strategy: &'static str,
    radius: usize,
    elapsed_ms: f64,
    changed: bool,
}

/// Minimal stderr logger for `--verbose`.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            log::Level::Error => "error".red().bold(),
            log::Level::Warn => "warning".yellow().bold(),
            log::Level::Info => "info".green(),
            log::Level::Debug => "debug".blue(),
            log::Level::Trace => "trace".dimmed(),
        };
        eprintln!("{level}: {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up color output
    setup_colors(&cli);
    setup_logging(&cli);

    run(&cli)
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn setup_logging(cli: &Cli) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if cli.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Warn
        });
    }
}

fn run(cli: &Cli) -> ExitCode {
    let format = PixelFormat::from(cli.pixel_format);
    let mut surface = match load_surface(&cli.input, format) {
        Ok(surface) => surface,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let params = BlurParams::new()
        .with_strategy(cli.strategy.into())
        .with_fast_path(cli.fast_path.into());
    let strategy = match params.strategy().resolve() {
        StrategyKind::Vectorized => "vectorized",
        _ => "scalar",
    };

    let before = surface.words().to_vec();
    let start = Instant::now();
    let result = blur_with(&mut surface, cli.radius, &params);
    let elapsed = start.elapsed();

    if let Err(e) = result {
        eprintln!("{}: blur skipped: {}", "warning".yellow().bold(), e);
        return ExitCode::from(1);
    }
    log::debug!("blurred in {:.3} ms", elapsed.as_secs_f64() * 1000.0);

    if let Err(e) = save_surface(&surface, &cli.output) {
        eprintln!("{}: {}", "error".red().bold(), e);
        return ExitCode::from(2);
    }

    let changed = surface.words() != before.as_slice();
    if cli.quiet {
        return ExitCode::SUCCESS;
    }

    if cli.json {
        let output = JsonOutput {
            input: cli.input.display().to_string(),
            output: cli.output.display().to_string(),
            width: surface.width(),
            height: surface.height(),
            pixel_format: format.name(),
            strategy,
            radius: cli.radius,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            changed,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{}: failed to serialize JSON: {}", "error".red().bold(), e);
                return ExitCode::from(2);
            }
        }
    } else {
        println!(
            "Blurred {}x{} {} with {} (radius {}) in {:.2} ms -> {}",
            surface.width(),
            surface.height(),
            format,
            strategy.bold(),
            cli.radius,
            elapsed.as_secs_f64() * 1000.0,
            cli.output.display()
        );
    }

    ExitCode::SUCCESS
}

fn load_surface(path: &Path, format: PixelFormat) -> Result<Surface, String> {
    let img = image::open(path)
        .map_err(|e| format!("failed to load '{}': {}", path.display(), e))?;
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);

    let surface = match format {
        PixelFormat::A8 => {
            let gray = img.to_luma8().into_raw();
            Surface::from_gray8(Img::new(gray, width, height).as_ref())
        }
        _ => {
            let pixels: Vec<RGBA8> = img
                .to_rgba8()
                .pixels()
                .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
                .collect();
            let img = Img::new(pixels, width, height);
            if format == PixelFormat::Rgb24 {
                Surface::from_rgba8_opaque(img.as_ref())
            } else {
                Surface::from_rgba8(img.as_ref())
            }
        }
    };
    log::debug!(
        "loaded '{}' as {}x{} {} surface, stride {}",
        path.display(),
        width,
        height,
        surface.format(),
        surface.stride()
    );
    Ok(surface)
}

fn save_surface(surface: &Surface, path: &Path) -> Result<(), String> {
    let (width, height) = (surface.width() as u32, surface.height() as u32);
    let (data, color) = match surface.format() {
        PixelFormat::A8 => (surface.to_alpha8().into_buf(), image::ColorType::L8),
        PixelFormat::Rgb24 => {
            let data: Vec<u8> = surface
                .to_rgba8()
                .into_buf()
                .into_iter()
                .flat_map(|p| [p.r, p.g, p.b])
                .collect();
            (data, image::ColorType::Rgb8)
        }
        _ => {
            let data: Vec<u8> = surface
                .to_rgba8()
                .into_buf()
                .into_iter()
                .flat_map(|p| [p.r, p.g, p.b, p.a])
                .collect();
            (data, image::ColorType::Rgba8)
        }
    };

    image::save_buffer(path, &data, width, height, color)
        .map_err(|e| format!("failed to save '{}': {}", path.display(), e))
}
