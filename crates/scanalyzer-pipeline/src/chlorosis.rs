//! Chlorosis detection: yellowed tissue inside the leaf.
//!
//! Unlike leaf and signal areas, which count mask pixels, chlorotic area
//! is the sum of the enclosed border areas of every traced region, hole
//! borders included. The two measures differ on irregular boundaries.

use image::{GrayImage, RgbImage};

use crate::annotate::{self, CHLOROSIS_OUTLINE, CHLOROSIS_THICKNESS, LEAF_OUTLINE, LEAF_THICKNESS};
use crate::color::{self, HsvRange};
use crate::contour;

/// Output of [`detect_chlorosis`].
#[derive(Debug, Clone)]
pub struct ChlorosisDetection {
    /// Filled chlorotic regions.
    pub mask: GrayImage,
    /// Sum of traced border areas, in square pixels.
    pub area: f64,
    /// Copy of the leaf cell with leaf and chlorosis boundaries drawn.
    pub annotated: RgbImage,
}

/// Detect chlorotic tissue inside `leaf_mask`.
///
/// Pixels outside the leaf are evaluated as black and so never match a
/// band with a non-zero lower value bound. `cell` is not modified.
#[must_use = "returns the chlorosis mask, area, and annotated crop"]
pub fn detect_chlorosis(
    cell: &RgbImage,
    leaf_mask: &GrayImage,
    band: &HsvRange,
) -> ChlorosisDetection {
    let selection = color::select_in_range(cell, band, Some(leaf_mask));
    let borders = contour::trace(&selection);

    let area = borders.iter().map(|b| contour::polygon_area(&b.points)).sum();
    let mask = contour::filled_mask(cell.width(), cell.height(), &borders);

    let mut annotated = cell.clone();
    annotate::outline(
        &mut annotated,
        &contour::trace(leaf_mask),
        LEAF_OUTLINE,
        LEAF_THICKNESS,
    );
    annotate::outline(&mut annotated, &borders, CHLOROSIS_OUTLINE, CHLOROSIS_THICKNESS);

    ChlorosisDetection {
        mask,
        area,
        annotated,
    }
}
