//! Run configuration: grid geometry and segmentation thresholds.
//!
//! One [`AnalysisConfig`] is built at run start and borrowed by every
//! component. Nothing in the pipeline reads ambient or global settings.

use serde::{Deserialize, Serialize};

use crate::color::{Hsv, HsvRange};
use crate::types::{CellIndex, Dimensions, PipelineError};

/// Fixed-size physical sample grid.
///
/// The outer axis holds `n1` cells, each stepping `dx` pixels down the
/// scan (image rows). The inner axis holds `n2` cells, each stepping `dy`
/// pixels across the scan (image columns). One cell is therefore `dy`
/// pixels wide and `dx` pixels tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Outer-axis step in pixels.
    pub dx: u32,
    /// Inner-axis step in pixels.
    pub dy: u32,
    /// Number of cells along the outer axis.
    pub n1: u32,
    /// Number of cells along the inner axis.
    pub n2: u32,
}

impl GridGeometry {
    /// Default outer-axis step.
    pub const DEFAULT_DX: u32 = 261;
    /// Default inner-axis step.
    pub const DEFAULT_DY: u32 = 477;
    /// Default outer-axis cell count.
    pub const DEFAULT_N1: u32 = 18;
    /// Default inner-axis cell count.
    pub const DEFAULT_N2: u32 = 7;

    /// Size of one cell.
    #[must_use]
    pub const fn cell_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.dy,
            height: self.dx,
        }
    }

    /// Smallest scan that contains every cell, which is also the size of
    /// an assembled collage.
    #[must_use]
    pub const fn scan_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.n2.saturating_mul(self.dy),
            height: self.n1.saturating_mul(self.dx),
        }
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.n1 as usize * self.n2 as usize
    }

    /// All cells in outer-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + use<> {
        let n2 = self.n2;
        (0..self.n1).flat_map(move |outer| (0..n2).map(move |inner| CellIndex::new(outer, inner)))
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            dx: Self::DEFAULT_DX,
            dy: Self::DEFAULT_DY,
            n1: Self::DEFAULT_N1,
            n2: Self::DEFAULT_N2,
        }
    }
}

/// Configuration for one analysis run.
///
/// All thresholds are on the 8-bit scale described in [`crate::color`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Physical grid geometry shared by both scans and the metadata.
    pub grid: GridGeometry,

    /// Pale-background band. Pixels *outside* this box are leaf
    /// candidates.
    pub leaf_band: HsvRange,

    /// Yellow tissue band for chlorosis, applied inside the leaf.
    pub chlorosis_band: HsvRange,

    /// Inverted-intensity cut for bacterial signal. In-leaf pixels whose
    /// inverted intensity exceeds this value are signal.
    pub signal_threshold: u8,

    /// Leaves with at most this many pixels are too small to report
    /// signal or chlorosis for.
    pub min_leaf_area: u64,
}

impl AnalysisConfig {
    /// Default pale-background band: any hue and value, saturation up to 75.
    pub const DEFAULT_LEAF_BAND: HsvRange =
        HsvRange::new(Hsv::new(0, 0, 0), Hsv::new(255, 75, 255));

    /// Default chlorosis band.
    pub const DEFAULT_CHLOROSIS_BAND: HsvRange =
        HsvRange::new(Hsv::new(12, 50, 170), Hsv::new(37, 210, 255));

    /// Default bacterial signal threshold.
    pub const DEFAULT_SIGNAL_THRESHOLD: u8 = 126;

    /// Default minimum leaf area in pixels.
    pub const DEFAULT_MIN_LEAF_AREA: u64 = 400;

    /// Check invariants that the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if any grid dimension is
    /// zero or either color band has a lower bound above its upper bound.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let GridGeometry { dx, dy, n1, n2 } = self.grid;
        if dx == 0 || dy == 0 || n1 == 0 || n2 == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "grid dimensions must be non-zero (dx={dx}, dy={dy}, n1={n1}, n2={n2})"
            )));
        }
        if !self.leaf_band.is_ordered() {
            return Err(PipelineError::InvalidConfig(
                "leaf band lower bound exceeds upper bound".to_owned(),
            ));
        }
        if !self.chlorosis_band.is_ordered() {
            return Err(PipelineError::InvalidConfig(
                "chlorosis band lower bound exceeds upper bound".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grid: GridGeometry::default(),
            leaf_band: Self::DEFAULT_LEAF_BAND,
            chlorosis_band: Self::DEFAULT_CHLOROSIS_BAND,
            signal_threshold: Self::DEFAULT_SIGNAL_THRESHOLD,
            min_leaf_area: Self::DEFAULT_MIN_LEAF_AREA,
        }
    }
}
