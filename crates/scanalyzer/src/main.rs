//! Quantify leaf, bacterial signal, and chlorotic areas from a leaf scan
//! and a matching film scan laid out on a fixed sample grid.
//!
//! Writes `<prefix>_data.csv` with one record per grid cell, plus
//! annotated collages of both scans for visual review.

mod logging;
mod plot;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use scanalyzer_pipeline::{AnalysisConfig, GridGeometry, Hsv, HsvRange};

use crate::plot::PlotHook;
use crate::run::{Inputs, Outputs, RunError};

#[derive(Parser)]
#[command(name = "scanalyzer", version)]
struct Cli {
    /// Scan of the leaves.
    #[arg(long)]
    leaves: PathBuf,

    /// Scan of the film showing bacterial presence.
    #[arg(long)]
    film: PathBuf,

    /// Sample sheet (CSV).
    #[arg(long)]
    samples: PathBuf,

    /// Prefix for the output files.
    #[arg(long)]
    prefix: String,

    /// Run the plotting script on the record CSV after a successful run.
    #[arg(long)]
    autoplot: bool,

    /// Interpreter used by `--autoplot`.
    #[arg(long, default_value = PlotHook::DEFAULT_PROGRAM)]
    plotter: String,

    /// Script passed to the interpreter by `--autoplot`.
    #[arg(long, default_value = PlotHook::DEFAULT_SCRIPT)]
    plot_script: PathBuf,

    /// Worker threads for per-cell analysis (default: one per core).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    jobs: Option<usize>,

    /// Log per-cell measurements.
    #[arg(short, long)]
    verbose: bool,

    /// Outer-axis cell step in pixels (image rows).
    #[arg(long, default_value_t = GridGeometry::DEFAULT_DX)]
    dx: u32,

    /// Inner-axis cell step in pixels (image columns).
    #[arg(long, default_value_t = GridGeometry::DEFAULT_DY)]
    dy: u32,

    /// Cells along the outer axis.
    #[arg(long, default_value_t = GridGeometry::DEFAULT_N1)]
    n1: u32,

    /// Cells along the inner axis.
    #[arg(long, default_value_t = GridGeometry::DEFAULT_N2)]
    n2: u32,

    /// Highest saturation still counted as pale background.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_LEAF_BAND.upper.s)]
    background_max_saturation: u8,

    /// Lower chlorosis bound as "H,S,V" (hue 0-179).
    #[arg(long, value_name = "H,S,V", value_parser = parse_hsv)]
    chlorosis_lower: Option<Hsv>,

    /// Upper chlorosis bound as "H,S,V" (hue 0-179).
    #[arg(long, value_name = "H,S,V", value_parser = parse_hsv)]
    chlorosis_upper: Option<Hsv>,

    /// Inverted film intensity above which an in-leaf pixel is signal.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_SIGNAL_THRESHOLD)]
    signal_threshold: u8,

    /// Leaves at or under this many pixels get no signal or chlorosis values.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_MIN_LEAF_AREA)]
    min_leaf_area: u64,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, all grid and threshold flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Parse `"H,S,V"` into an [`Hsv`].
fn parse_hsv(text: &str) -> Result<Hsv, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let &[h, s, v] = parts.as_slice() else {
        return Err(format!("expected 'H,S,V', got: '{text}'"));
    };
    let channel = |name: &str, part: &str| {
        part.parse::<u8>()
            .map_err(|e| format!("invalid {name} '{part}': {e}"))
    };
    Ok(Hsv::new(
        channel("hue", h)?,
        channel("saturation", s)?,
        channel("value", v)?,
    ))
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, RunError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json)
            .map_err(|e| RunError::Config(format!("Error parsing --config-json: {e}")));
    }

    let default_chlorosis = AnalysisConfig::DEFAULT_CHLOROSIS_BAND;
    Ok(AnalysisConfig {
        grid: GridGeometry {
            dx: cli.dx,
            dy: cli.dy,
            n1: cli.n1,
            n2: cli.n2,
        },
        leaf_band: HsvRange {
            upper: Hsv {
                s: cli.background_max_saturation,
                ..AnalysisConfig::DEFAULT_LEAF_BAND.upper
            },
            ..AnalysisConfig::DEFAULT_LEAF_BAND
        },
        chlorosis_band: HsvRange::new(
            cli.chlorosis_lower.unwrap_or(default_chlorosis.lower),
            cli.chlorosis_upper.unwrap_or(default_chlorosis.upper),
        ),
        signal_threshold: cli.signal_threshold,
        min_leaf_area: cli.min_leaf_area,
    })
}

fn try_main(cli: &Cli) -> Result<(), RunError> {
    let config = config_from_cli(cli)?;
    config.validate()?;

    let inputs = Inputs {
        leaves: cli.leaves.clone(),
        film: cli.film.clone(),
        samples: cli.samples.clone(),
    };
    inputs.check_exist()?;
    let outputs = Outputs::from_prefix(&cli.prefix);

    let summary = match cli.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| RunError::Config(format!("cannot start {jobs} workers: {e}")))?;
            pool.install(|| run::execute(&inputs, &outputs, &config))?
        }
        None => run::execute(&inputs, &outputs, &config)?,
    };
    tracing::info!("{}", summary.report());

    if cli.autoplot {
        PlotHook {
            program: cli.plotter.clone(),
            script: cli.plot_script.clone(),
        }
        .run(&outputs.records);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match try_main(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
