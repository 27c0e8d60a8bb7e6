//! shapetally: count and annotate geometric shapes in an image.
//!
//! Runs the detection pipeline on one image file, writes the annotated
//! JPEG into the output directory and prints the JSON result payload on
//! stdout. Logs go to stderr and follow `RUST_LOG` (default `info`).
//!
//! # Usage
//!
//! ```text
//! shapetally [OPTIONS] <IMAGE>
//! ```
//!
//! Environment: `OPENAI_API_KEY` enables the optional description;
//! `SHAPETALLY_OUTPUT_DIR`, `SHAPETALLY_DESCRIBE_MODEL`,
//! `SHAPETALLY_DESCRIBE_ENDPOINT` and `SHAPETALLY_DESCRIBE_TIMEOUT_SECS`
//! adjust defaults. Flags take precedence over the environment.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use shapetally_io::{ServiceConfig, ShapeService};
use shapetally_pipeline::{Clock, Locale, PipelineConfig};
use tracing_subscriber::EnvFilter;

/// Exit code for problems with the request itself (unreadable file).
const EXIT_CLIENT_ERROR: u8 = 2;

/// Count triangles, squares, rectangles, pentagons and circles in an image.
///
/// Prints a JSON payload with the count table, the path of the annotated
/// JPEG and, when a description service is configured, a free-text
/// description.
#[derive(Parser)]
#[command(name = "shapetally", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image: PathBuf,

    /// Directory for the annotated JPEG [default: $SHAPETALLY_OUTPUT_DIR or static/uploads].
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File name of the annotated JPEG.
    #[arg(long, default_value = ServiceConfig::DEFAULT_ARTIFACT_NAME)]
    artifact_name: String,

    /// Label and table language.
    #[arg(long, value_enum, default_value_t = Lang::En)]
    locale: Lang,

    /// Gaussian blur sigma [default: fixed 3x3 kernel].
    ///
    /// Must be finite and positive.
    #[arg(long, value_parser = parse_sigma)]
    blur_sigma: Option<f32>,

    /// Hysteresis low threshold.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// Hysteresis high threshold.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// Polygon tolerance as a fraction of the contour perimeter.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_APPROXIMATION_FACTOR)]
    approximation_factor: f64,

    /// JPEG quality of the annotated image (1-100).
    #[arg(
        long,
        default_value_t = shapetally_export::DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100),
    )]
    jpeg_quality: u8,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Skip the description service even if `OPENAI_API_KEY` is set.
    #[arg(long)]
    no_describe: bool,

    /// Print per-stage timings on stderr.
    #[arg(long)]
    timings: bool,
}

/// Label language selection.
#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    /// English.
    En,
    /// Romanian.
    Ro,
}

impl From<Lang> for Locale {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::En => Self::English,
            Lang::Ro => Self::Romanian,
        }
    }
}

/// Accept only finite, positive sigmas.
fn parse_sigma(raw: &str) -> Result<f32, String> {
    let sigma: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if sigma.is_finite() && sigma > 0.0 {
        Ok(sigma)
    } else {
        Err(format!("sigma must be finite and > 0, got {raw}"))
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn pipeline_config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        blur_sigma: cli.blur_sigma,
        canny_low: cli.canny_low,
        canny_high: cli.canny_high,
        approximation_factor: cli.approximation_factor,
        locale: cli.locale.into(),
        ..PipelineConfig::default()
    })
}

/// Merge environment defaults with CLI flags.
fn service_config_from_cli(cli: &Cli) -> Result<ServiceConfig, String> {
    let mut config = ServiceConfig::from_env().map_err(|e| format!("Configuration error: {e}"))?;
    config.pipeline = pipeline_config_from_cli(cli)?;
    if let Some(ref dir) = cli.output_dir {
        config.output_dir.clone_from(dir);
    }
    config.artifact_name.clone_from(&cli.artifact_name);
    config.jpeg_quality = cli.jpeg_quality;
    if cli.no_describe {
        config.description = None;
    }
    Ok(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match service_config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image.display());
            return ExitCode::from(EXIT_CLIENT_ERROR);
        }
    };

    tracing::info!(
        image = %cli.image.display(),
        bytes = image_bytes.len(),
        describe = config.description.is_some(),
        "analyzing"
    );

    let service = ShapeService::from_config(config);
    let outcome = if cli.timings {
        service
            .analyze_with_diagnostics(&image_bytes, &StdClock)
            .map(|(report, diagnostics)| {
                eprintln!("{}", diagnostics.report());
                report
            })
    } else {
        service.analyze(&image_bytes)
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match report.payload.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing result: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shapetally").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_build_pipeline_config() {
        let cli = parse(&["img.png", "--canny-low", "10", "--locale", "ro"]);
        let config = pipeline_config_from_cli(&cli).unwrap();
        assert!((config.canny_low - 10.0).abs() < f32::EPSILON);
        assert_eq!(config.locale, Locale::Romanian);
        assert_eq!(config.brightness_threshold, PipelineConfig::DEFAULT_BRIGHTNESS_THRESHOLD);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "img.png",
            "--canny-low",
            "10",
            "--config-json",
            r#"{"canny_low": 42.0}"#,
        ]);
        let config = pipeline_config_from_cli(&cli).unwrap();
        assert!((config.canny_low - 42.0).abs() < f32::EPSILON);
        assert!((config.canny_high - PipelineConfig::DEFAULT_CANNY_HIGH).abs() < f32::EPSILON);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["img.png", "--config-json", "{"]);
        assert!(pipeline_config_from_cli(&cli).is_err());
    }

    #[test]
    fn jpeg_quality_is_range_checked() {
        let result = Cli::try_parse_from(["shapetally", "img.png", "--jpeg-quality", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn blur_sigma_defaults_to_fixed_kernel() {
        let config = pipeline_config_from_cli(&parse(&["img.png"])).unwrap();
        assert_eq!(config.blur_sigma, None);
        let config = pipeline_config_from_cli(&parse(&["img.png", "--blur-sigma", "1.5"])).unwrap();
        assert_eq!(config.blur_sigma, Some(1.5));
    }

    #[test]
    fn non_finite_blur_sigma_is_rejected() {
        for bad in ["NaN", "inf", "0", "-2"] {
            let result = Cli::try_parse_from(["shapetally", "img.png", "--blur-sigma", bad]);
            assert!(result.is_err(), "accepted {bad}");
        }
    }
}
