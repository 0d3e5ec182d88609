//! Area measurement and the minimum-leaf-size reporting policy.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::color::FOREGROUND;

/// Number of foreground pixels in a binary mask.
#[must_use]
pub fn pixel_area(mask: &GrayImage) -> u64 {
    mask.pixels()
        .map(|p| u64::from(p.0[0] == FOREGROUND))
        .sum()
}

/// How a cell's leaf measured up against the reporting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafStatus {
    /// No leaf region was found at all.
    Empty,
    /// A leaf was found but is no larger than the minimum area.
    BelowMinimum,
    /// The leaf is large enough for signal and chlorosis to be reported.
    Valid,
}

/// Reported areas for one cell after the validity policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Areas {
    /// Leaf area in pixels, reported regardless of validity.
    pub leaf_area: u64,
    /// Bacterial signal area in pixels, `None` unless the leaf is valid.
    pub bacteria_area: Option<u64>,
    /// Chlorotic border area, `None` unless the leaf is valid.
    pub chlorotic_area: Option<f64>,
    /// Outcome of the validity policy.
    pub status: LeafStatus,
}

/// Apply the minimum-leaf-size policy to measured areas.
///
/// Leaves of at most `min_leaf_area` pixels keep their numeric leaf area
/// but drop the signal and chlorosis measurements.
#[must_use]
pub const fn aggregate(
    leaf_area: u64,
    bacteria_area: u64,
    chlorotic_area: f64,
    min_leaf_area: u64,
) -> Areas {
    let status = if leaf_area == 0 {
        LeafStatus::Empty
    } else if leaf_area <= min_leaf_area {
        LeafStatus::BelowMinimum
    } else {
        LeafStatus::Valid
    };
    let valid = matches!(status, LeafStatus::Valid);
    Areas {
        leaf_area,
        bacteria_area: if valid { Some(bacteria_area) } else { None },
        chlorotic_area: if valid { Some(chlorotic_area) } else { None },
        status,
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn pixel_area_counts_only_full_foreground() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(0, 0, Luma([FOREGROUND]));
        mask.put_pixel(1, 0, Luma([FOREGROUND]));
        mask.put_pixel(2, 0, Luma([7]));
        assert_eq!(pixel_area(&mask), 2);
    }

    #[test]
    fn minimum_area_itself_is_invalid() {
        let areas = aggregate(400, 120, 33.5, 400);
        assert_eq!(areas.status, LeafStatus::BelowMinimum);
        assert_eq!(areas.leaf_area, 400);
        assert_eq!(areas.bacteria_area, None);
        assert_eq!(areas.chlorotic_area, None);
    }

    #[test]
    fn above_minimum_reports_everything() {
        let areas = aggregate(401, 0, 0.0, 400);
        assert_eq!(areas.status, LeafStatus::Valid);
        assert_eq!(areas.bacteria_area, Some(0));
        assert_eq!(areas.chlorotic_area, Some(0.0));
    }

    #[test]
    fn no_leaf_is_empty_not_an_error() {
        let areas = aggregate(0, 0, 0.0, 400);
        assert_eq!(areas.status, LeafStatus::Empty);
        assert_eq!(areas.leaf_area, 0);
        assert_eq!(areas.bacteria_area, None);
    }

    #[test]
    fn zero_minimum_still_flags_empty_leaf() {
        let areas = aggregate(0, 0, 0.0, 0);
        assert_eq!(areas.status, LeafStatus::Empty);
        assert_eq!(aggregate(1, 1, 0.0, 0).status, LeafStatus::Valid);
    }
}
