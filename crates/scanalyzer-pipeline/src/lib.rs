//! scanalyzer-pipeline: Pure leaf-scan quantification pipeline (sans-IO).
//!
//! Measures, for every cell of a fixed physical grid, the leaf area, the
//! bacterial signal area, and the chlorotic area from two pixel-aligned
//! scans:
//!
//! grid crop -> leaf segmentation -> signal and chlorosis detection ->
//! validity policy -> metadata alignment -> collage assembly.
//!
//! This crate has **no I/O dependencies** -- it operates on decoded images
//! and in-memory byte slices and returns structured data. Filesystem
//! access, output writing, and the plotting hook live in the `scanalyzer`
//! binary.

pub mod annotate;
pub mod area;
pub mod chlorosis;
pub mod collage;
pub mod color;
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod grid;
pub mod leaf;
pub mod metadata;
pub mod pipeline;
pub mod signal;
pub mod types;

use rayon::prelude::*;

pub use area::{Areas, LeafStatus};
pub use color::{Hsv, HsvRange};
pub use config::{AnalysisConfig, GridGeometry};
pub use diagnostics::RunSummary;
pub use grid::decode_scan;
pub use metadata::{Metadata, MetadataHeader};
pub use pipeline::{CellAnalysis, analyze_cell};
pub use types::{CellIndex, Dimensions, GrayImage, PipelineError, Record, RgbImage};

/// Result of analyzing a full scan pair.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// One record per cell, in outer-major grid order.
    pub records: Vec<Record>,
    /// Leaf scan reassembled from annotated crops.
    pub leaf_collage: RgbImage,
    /// Signal scan reassembled from annotated crops.
    pub signal_collage: RgbImage,
    /// Cell counts by leaf status.
    pub summary: RunSummary,
}

/// Run the full pipeline over every grid cell.
///
/// Cells are analyzed in parallel on the current `rayon` pool and
/// collected back in outer-major order, so the output is identical
/// regardless of thread count.
///
/// # Pipeline steps
///
/// 1. Validate configuration, scan sizes, and metadata shape
/// 2. Per cell: crop both scans, segment the leaf, detect signal and
///    chlorosis, apply the minimum-leaf-area policy
/// 3. Attach each cell's physical labels and metadata
/// 4. Assemble the annotated leaf and signal collages
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::GridMismatch`] if either scan is too small
/// for the grid. Scans larger than the grid, including pairs of unequal
/// size, are cropped to the grid region. Returns [`PipelineError::MetadataFormat`] if the metadata tables
/// do not match the grid. All checks happen before any cell is analyzed.
pub fn analyze(
    leaf_scan: &RgbImage,
    signal_scan: &RgbImage,
    metadata: &Metadata,
    config: &AnalysisConfig,
) -> Result<Analysis, PipelineError> {
    config.validate()?;
    grid::check_scan_pair(leaf_scan, signal_scan, &config.grid)?;
    metadata.check_grid(&config.grid)?;

    let grid = &config.grid;
    tracing::info!(
        n1 = grid.n1,
        n2 = grid.n2,
        dx = grid.dx,
        dy = grid.dy,
        "analyzing {} cells",
        grid.cell_count()
    );

    let cells: Vec<CellIndex> = grid.cells().collect();
    let analyses = cells
        .into_par_iter()
        .map(|cell| analyze_cell(leaf_scan, signal_scan, cell, config))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = RunSummary::tally(analyses.iter().map(|a| &a.areas));

    let records = analyses
        .iter()
        .map(|a| to_record(a, metadata, grid))
        .collect::<Result<Vec<_>, _>>()?;

    let (leaf_views, signal_views): (Vec<_>, Vec<_>) = analyses
        .into_iter()
        .map(|a| (a.leaf_view, a.signal_view))
        .unzip();
    let leaf_collage = collage::assemble(&leaf_views, grid)?;
    let signal_collage = collage::assemble(&signal_views, grid)?;

    tracing::info!("{}", summary.report());

    Ok(Analysis {
        records,
        leaf_collage,
        signal_collage,
        summary,
    })
}

fn to_record(
    analysis: &CellAnalysis,
    metadata: &Metadata,
    grid: &GridGeometry,
) -> Result<Record, PipelineError> {
    let meta = metadata.for_cell(analysis.cell, grid).ok_or_else(|| {
        PipelineError::MetadataFormat(format!(
            "no metadata for cell ({}, {})",
            analysis.cell.outer, analysis.cell.inner
        ))
    })?;
    Ok(Record {
        column: meta.labels.column,
        row: meta.labels.row,
        bioassay: meta.bioassay,
        dpi: meta.dpi,
        genotype: meta.genotype,
        pathogen: meta.pathogen,
        treatment: meta.treatment,
        leaf_area: analysis.areas.leaf_area,
        bacteria_area: analysis.areas.bacteria_area,
        chlorotic_area: analysis.areas.chlorotic_area,
    })
}
