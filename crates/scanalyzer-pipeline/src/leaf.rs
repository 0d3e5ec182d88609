//! Leaf segmentation within one leaf-scan cell.
//!
//! Colored plant tissue is separated from the pale scanner background by
//! saturation. Soil particles and debris also pass that test, so only the
//! single largest region is kept and its interior filled.

use image::{GrayImage, RgbImage};

use crate::color::{self, HsvRange};
use crate::contour;

/// Binary leaf mask for one cell, the same size as the cell.
///
/// Pixels outside `background` are leaf candidates. The candidate region
/// with the largest enclosed border area becomes the leaf (first traced
/// wins on ties) and is filled, holes included. A cell with no
/// candidates yields an all-zero mask.
#[must_use = "returns the leaf mask"]
pub fn segment_leaf(cell: &RgbImage, background: &HsvRange) -> GrayImage {
    let candidates = color::select_outside_range(cell, background);
    let borders = contour::trace(&candidates);
    contour::filled_mask(
        cell.width(),
        cell.height(),
        contour::largest_border(&borders),
    )
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::config::AnalysisConfig;

    const PALE: Rgb<u8> = Rgb([235, 235, 225]);
    const GREEN: Rgb<u8> = Rgb([60, 160, 60]);

    fn leaf_area(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == color::FOREGROUND).count()
    }

    fn cell_with(width: u32, height: u32, paint: &[(u32, u32, u32, u32)]) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let on = paint
                .iter()
                .any(|&(x0, y0, w, h)| (x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y));
            if on { GREEN } else { PALE }
        })
    }

    #[test]
    fn pale_cell_has_empty_mask_of_cell_size() {
        let cell = RgbImage::from_pixel(24, 16, PALE);
        let mask = segment_leaf(&cell, &AnalysisConfig::DEFAULT_LEAF_BAND);
        assert_eq!((mask.width(), mask.height()), (24, 16));
        assert_eq!(leaf_area(&mask), 0);
    }

    #[test]
    fn centred_square_is_the_leaf() {
        let cell = cell_with(20, 20, &[(5, 5, 10, 10)]);
        let mask = segment_leaf(&cell, &AnalysisConfig::DEFAULT_LEAF_BAND);
        assert_eq!(leaf_area(&mask), 100);
        assert_eq!(mask.get_pixel(5, 5).0[0], color::FOREGROUND);
        assert_eq!(mask.get_pixel(4, 5).0[0], 0);
    }

    #[test]
    fn soil_specks_are_discarded() {
        let cell = cell_with(40, 40, &[(10, 10, 20, 20), (1, 1, 3, 3), (35, 36, 2, 2)]);
        let mask = segment_leaf(&cell, &AnalysisConfig::DEFAULT_LEAF_BAND);
        assert_eq!(leaf_area(&mask), 400);
        assert_eq!(mask.get_pixel(2, 2).0[0], 0);
        assert_eq!(mask.get_pixel(36, 37).0[0], 0);
    }

    #[test]
    fn pale_lesion_inside_leaf_is_filled() {
        let mut cell = cell_with(30, 30, &[(5, 5, 20, 20)]);
        for y in 12..16 {
            for x in 12..16 {
                cell.put_pixel(x, y, PALE);
            }
        }
        let mask = segment_leaf(&cell, &AnalysisConfig::DEFAULT_LEAF_BAND);
        assert_eq!(leaf_area(&mask), 400);
        assert_eq!(mask.get_pixel(13, 13).0[0], color::FOREGROUND);
    }
}
