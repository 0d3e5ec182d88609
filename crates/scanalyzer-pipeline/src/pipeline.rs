//! Per-cell pipeline: crop, segment, detect, measure.
//!
//! A cell's analysis reads only its own region of the two scans plus the
//! shared configuration, so cells can be processed in any order and on
//! any thread.

use image::RgbImage;

use crate::area::{self, Areas, LeafStatus};
use crate::chlorosis::detect_chlorosis;
use crate::config::AnalysisConfig;
use crate::grid;
use crate::leaf::segment_leaf;
use crate::signal::detect_signal;
use crate::types::{CellIndex, PipelineError};

/// Everything measured and drawn for one grid cell.
#[derive(Debug, Clone)]
pub struct CellAnalysis {
    /// The analyzed cell.
    pub cell: CellIndex,
    /// Reported areas after the validity policy.
    pub areas: Areas,
    /// Leaf-scan crop annotated with leaf and chlorosis boundaries.
    pub leaf_view: RgbImage,
    /// Signal-scan crop annotated with leaf and signal boundaries.
    pub signal_view: RgbImage,
}

/// Analyze one cell of a leaf/signal scan pair.
///
/// Never fails on what the cell contains: a missing leaf, signal, or
/// chlorosis is reported through [`Areas`]. Annotated crops are produced
/// for every cell, including those whose measurements are withheld.
///
/// # Errors
///
/// Returns [`PipelineError::GridMismatch`] if either scan does not
/// contain the cell.
pub fn analyze_cell(
    leaf_scan: &RgbImage,
    signal_scan: &RgbImage,
    cell: CellIndex,
    config: &AnalysisConfig,
) -> Result<CellAnalysis, PipelineError> {
    let leaf_crop = grid::crop(leaf_scan, cell, &config.grid)?;
    let signal_crop = grid::crop(signal_scan, cell, &config.grid)?;

    let leaf_mask = segment_leaf(&leaf_crop, &config.leaf_band);
    let signal = detect_signal(&signal_crop, &leaf_mask, config.signal_threshold);
    let chlorosis = detect_chlorosis(&leaf_crop, &leaf_mask, &config.chlorosis_band);

    let areas = area::aggregate(
        area::pixel_area(&leaf_mask),
        area::pixel_area(&signal.mask),
        chlorosis.area,
        config.min_leaf_area,
    );

    match areas.status {
        LeafStatus::Empty => tracing::warn!(
            outer = cell.outer,
            inner = cell.inner,
            "no leaf region found"
        ),
        LeafStatus::BelowMinimum | LeafStatus::Valid => tracing::debug!(
            outer = cell.outer,
            inner = cell.inner,
            leaf_area = areas.leaf_area,
            bacteria_area = ?areas.bacteria_area,
            chlorotic_area = ?areas.chlorotic_area,
            status = ?areas.status,
            "cell analyzed"
        ),
    }

    Ok(CellAnalysis {
        cell,
        areas,
        leaf_view: chlorosis.annotated,
        signal_view: signal.annotated,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::annotate::LEAF_OUTLINE;
    use crate::config::GridGeometry;

    const PALE: Rgb<u8> = Rgb([235, 235, 225]);
    const GREEN: Rgb<u8> = Rgb([60, 160, 60]);
    const FILM: Rgb<u8> = Rgb([250, 250, 250]);
    const INK: Rgb<u8> = Rgb([20, 20, 30]);

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            grid: GridGeometry {
                dx: 40,
                dy: 40,
                n1: 1,
                n2: 2,
            },
            ..AnalysisConfig::default()
        }
    }

    fn in_square(x: u32, y: u32, x0: u32, y0: u32, side: u32) -> bool {
        (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y)
    }

    #[test]
    fn valid_leaf_reports_all_areas() {
        // Leaf in the second cell (inner = 1, columns 40..80).
        let leaf_scan =
            RgbImage::from_fn(80, 40, |x, y| if in_square(x, y, 45, 5, 30) { GREEN } else { PALE });
        let signal_scan =
            RgbImage::from_fn(80, 40, |x, y| if in_square(x, y, 50, 10, 5) { INK } else { FILM });

        let result = analyze_cell(&leaf_scan, &signal_scan, CellIndex::new(0, 1), &config()).unwrap();
        assert_eq!(result.areas.status, LeafStatus::Valid);
        assert_eq!(result.areas.leaf_area, 900);
        assert_eq!(result.areas.bacteria_area, Some(25));
        assert_eq!(result.areas.chlorotic_area, Some(0.0));
        assert_eq!(*result.leaf_view.get_pixel(5, 20), LEAF_OUTLINE);
        assert_eq!(*result.signal_view.get_pixel(5, 20), LEAF_OUTLINE);
    }

    #[test]
    fn empty_cell_is_not_an_error() {
        let leaf_scan = RgbImage::from_pixel(80, 40, PALE);
        let signal_scan = RgbImage::from_pixel(80, 40, INK);
        let result = analyze_cell(&leaf_scan, &signal_scan, CellIndex::new(0, 0), &config()).unwrap();
        assert_eq!(result.areas.status, LeafStatus::Empty);
        assert_eq!(result.areas.leaf_area, 0);
        assert_eq!(result.areas.bacteria_area, None);
        assert_eq!(result.areas.chlorotic_area, None);
        assert_eq!((result.leaf_view.width(), result.leaf_view.height()), (40, 40));
        assert_eq!(result.signal_view, RgbImage::from_pixel(40, 40, INK));
    }

    #[test]
    fn cell_outside_scan_is_grid_mismatch() {
        let scan = RgbImage::from_pixel(60, 40, PALE);
        let result = analyze_cell(&scan, &scan, CellIndex::new(0, 1), &config());
        assert!(matches!(result, Err(PipelineError::GridMismatch { .. })));
    }
}
