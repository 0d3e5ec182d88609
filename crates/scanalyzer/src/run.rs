//! One analysis run: read inputs, analyze, write outputs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use scanalyzer_export::ExportError;
use scanalyzer_pipeline::{AnalysisConfig, Metadata, PipelineError, RgbImage, RunSummary};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A required input path does not exist.
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading an input or writing the record file failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The pipeline rejected its inputs.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Record serialization failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Saving a collage failed.
    #[error("failed to write {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Command-line configuration could not be used.
    #[error("{0}")]
    Config(String),
}

/// The three input files of a run.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Leaf scan.
    pub leaves: PathBuf,
    /// Film (signal) scan.
    pub film: PathBuf,
    /// Sample sheet CSV.
    pub samples: PathBuf,
}

impl Inputs {
    /// Fail on the first input that does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::FileNotFound`] naming the missing path.
    pub fn check_exist(&self) -> Result<(), RunError> {
        [&self.leaves, &self.film, &self.samples]
            .into_iter()
            .find(|p| !p.is_file())
            .map_or(Ok(()), |missing| Err(RunError::FileNotFound(missing.clone())))
    }
}

/// Output file locations derived from a user prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    /// Per-cell record CSV.
    pub records: PathBuf,
    /// Annotated leaf collage.
    pub leaves: PathBuf,
    /// Annotated film collage.
    pub film: PathBuf,
}

impl Outputs {
    /// `<prefix>_data.csv`, `<prefix>_leaves_processed.png`,
    /// `<prefix>_film_processed.png`.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            records: PathBuf::from(format!("{prefix}_data.csv")),
            leaves: PathBuf::from(format!("{prefix}_leaves_processed.png")),
            film: PathBuf::from(format!("{prefix}_film_processed.png")),
        }
    }
}

/// Run the whole analysis on the current `rayon` pool.
///
/// # Errors
///
/// Returns the first [`RunError`] encountered. Nothing is written unless
/// every input loads and the pipeline succeeds.
pub fn execute(
    inputs: &Inputs,
    outputs: &Outputs,
    config: &AnalysisConfig,
) -> Result<RunSummary, RunError> {
    let start = Instant::now();
    inputs.check_exist()?;

    let leaf_scan = load_scan(&inputs.leaves)?;
    let signal_scan = load_scan(&inputs.film)?;
    let metadata = Metadata::parse(&read(&inputs.samples)?, &config.grid)?;
    tracing::info!(
        bioassay = %metadata.header.bioassay,
        dpi = %metadata.header.dpi,
        sampled = %metadata.header.sampling_date,
        "loaded sample sheet {}",
        inputs.samples.display()
    );

    let analysis = scanalyzer_pipeline::analyze(&leaf_scan, &signal_scan, &metadata, config)?;

    let csv = scanalyzer_export::to_csv(&analysis.records)?;
    std::fs::write(&outputs.records, csv).map_err(|source| RunError::Io {
        path: outputs.records.clone(),
        source,
    })?;
    save(&analysis.leaf_collage, &outputs.leaves)?;
    save(&analysis.signal_collage, &outputs.film)?;

    tracing::info!(
        elapsed = ?start.elapsed(),
        "wrote {}, {}, {}",
        outputs.records.display(),
        outputs.leaves.display(),
        outputs.film.display()
    );
    Ok(analysis.summary)
}

fn read(path: &Path) -> Result<Vec<u8>, RunError> {
    std::fs::read(path).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_scan(path: &Path) -> Result<RgbImage, RunError> {
    let bytes = read(path)?;
    let scan = scanalyzer_pipeline::decode_scan(&bytes)?;
    tracing::info!(
        width = scan.width(),
        height = scan.height(),
        "loaded scan {}",
        path.display()
    );
    Ok(scan)
}

fn save(image: &RgbImage, path: &Path) -> Result<(), RunError> {
    image.save(path).map_err(|source| RunError::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manifest() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")
    }

    #[test]
    fn output_names_follow_prefix() {
        let outputs = Outputs::from_prefix("runs/2026-03-02");
        assert_eq!(outputs.records, PathBuf::from("runs/2026-03-02_data.csv"));
        assert_eq!(
            outputs.leaves,
            PathBuf::from("runs/2026-03-02_leaves_processed.png")
        );
        assert_eq!(
            outputs.film,
            PathBuf::from("runs/2026-03-02_film_processed.png")
        );
    }

    #[test]
    fn existing_inputs_pass() {
        let inputs = Inputs {
            leaves: manifest(),
            film: manifest(),
            samples: manifest(),
        };
        assert!(inputs.check_exist().is_ok());
    }

    #[test]
    fn first_missing_input_is_reported() {
        let missing = PathBuf::from("does/not/exist/film.jpg");
        let inputs = Inputs {
            leaves: manifest(),
            film: missing.clone(),
            samples: PathBuf::from("also/missing.csv"),
        };
        let result = inputs.check_exist();
        assert!(
            matches!(result, Err(RunError::FileNotFound(ref path)) if *path == missing),
            "{result:?}"
        );
    }

    #[test]
    fn full_run_writes_all_outputs() {
        use image::Rgb;
        use scanalyzer_pipeline::GridGeometry;

        let dir = std::env::temp_dir().join(format!("scanalyzer-run-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let leaves = RgbImage::from_fn(40, 40, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Rgb([60, 160, 60])
            } else {
                Rgb([235, 235, 225])
            }
        });
        let film = RgbImage::from_pixel(40, 40, Rgb([250, 250, 250]));
        let inputs = Inputs {
            leaves: dir.join("leaves.png"),
            film: dir.join("film.png"),
            samples: dir.join("samples.csv"),
        };
        leaves.save(&inputs.leaves).unwrap();
        film.save(&inputs.film).unwrap();
        let block = "h,1,2\n2,a,b\n1,c,d\n";
        let sheet = format!("Bioassay,B1\nDPI,2\nDate,d\n\n{}", [block; 5].join("\n"));
        std::fs::write(&inputs.samples, sheet).unwrap();

        let config = AnalysisConfig {
            grid: GridGeometry {
                dx: 20,
                dy: 20,
                n1: 2,
                n2: 2,
            },
            ..AnalysisConfig::default()
        };
        let outputs = Outputs::from_prefix(dir.join("out").to_str().unwrap());
        let summary = execute(&inputs, &outputs, &config).unwrap();
        assert_eq!(summary.cells, 4);
        assert_eq!(summary.below_minimum, 1);

        let csv = std::fs::read_to_string(&outputs.records).unwrap();
        assert_eq!(csv.lines().count(), 5);
        assert_eq!(csv.lines().nth(1), Some("1,2,c,c,c,c,c,100,NA,NA"));
        let collage = image::open(&outputs.leaves).unwrap().to_rgb8();
        assert_eq!(collage.dimensions(), (40, 40));
        assert!(outputs.film.is_file());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_input_fails_before_writing() {
        let dir = std::env::temp_dir().join("scanalyzer-missing-input");
        let outputs = Outputs::from_prefix(dir.to_str().unwrap());
        let inputs = Inputs {
            leaves: PathBuf::from("missing-leaves.jpg"),
            film: manifest(),
            samples: manifest(),
        };
        let result = execute(&inputs, &outputs, &AnalysisConfig::default());
        assert!(matches!(result, Err(RunError::FileNotFound(_))));
        assert!(!outputs.records.exists());
    }
}
