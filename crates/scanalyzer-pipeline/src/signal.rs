//! Bacterial signal detection in the signal-scan cell paired with a leaf.
//!
//! Bacterial growth shows up as dark marks on the film. The cell is
//! converted to greyscale and inverted so marks are bright, restricted to
//! the leaf, and thresholded.

use image::{GrayImage, Luma, RgbImage};

use crate::annotate::{self, LEAF_OUTLINE, LEAF_THICKNESS, SIGNAL_OUTLINE, SIGNAL_THICKNESS};
use crate::color::{self, FOREGROUND};
use crate::contour;

/// Output of [`detect_signal`].
#[derive(Debug, Clone)]
pub struct SignalDetection {
    /// Signal pixels, always a subset of the leaf mask.
    pub mask: GrayImage,
    /// Copy of the signal cell with leaf and signal boundaries drawn.
    pub annotated: RgbImage,
}

/// Detect bacterial signal inside `leaf_mask`.
///
/// A pixel is signal when it lies in the leaf and its inverted grey
/// intensity is strictly greater than `threshold`. `cell` itself is never
/// modified; annotation happens on a copy.
#[must_use = "returns the signal mask and annotated crop"]
pub fn detect_signal(cell: &RgbImage, leaf_mask: &GrayImage, threshold: u8) -> SignalDetection {
    let inverted = color::inverted_grey(cell);
    let mask = GrayImage::from_fn(cell.width(), cell.height(), |x, y| {
        let in_leaf = leaf_mask.get_pixel(x, y).0[0] != 0;
        let intensity = if in_leaf {
            inverted.get_pixel(x, y).0[0]
        } else {
            0
        };
        Luma([if intensity > threshold { FOREGROUND } else { 0 }])
    });

    let mut annotated = cell.clone();
    annotate::outline(
        &mut annotated,
        &contour::trace(leaf_mask),
        LEAF_OUTLINE,
        LEAF_THICKNESS,
    );
    annotate::outline(
        &mut annotated,
        &contour::trace(&mask),
        SIGNAL_OUTLINE,
        SIGNAL_THICKNESS,
    );

    SignalDetection { mask, annotated }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::config::AnalysisConfig;

    const FILM: Rgb<u8> = Rgb([250, 250, 250]);
    const INK: Rgb<u8> = Rgb([20, 20, 30]);

    fn square(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
            Luma([if inside { FOREGROUND } else { 0 }])
        })
    }

    fn area(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }

    #[test]
    fn blank_film_has_no_signal() {
        let cell = RgbImage::from_pixel(40, 40, FILM);
        let leaf = square(40, 5, 5, 30);
        let detection = detect_signal(&cell, &leaf, AnalysisConfig::DEFAULT_SIGNAL_THRESHOLD);
        assert_eq!(area(&detection.mask), 0);
        assert_eq!(
            (detection.mask.width(), detection.mask.height()),
            (40, 40)
        );
    }

    #[test]
    fn ink_outside_leaf_is_ignored() {
        let cell = RgbImage::from_fn(40, 40, |x, y| {
            if (10..20).contains(&x) && (10..20).contains(&y) || x < 3 && y < 3 {
                INK
            } else {
                FILM
            }
        });
        let leaf = square(40, 5, 5, 30);
        let detection = detect_signal(&cell, &leaf, AnalysisConfig::DEFAULT_SIGNAL_THRESHOLD);
        assert_eq!(area(&detection.mask), 100);
        assert_eq!(detection.mask.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn threshold_is_exclusive() {
        // Mid grey inverts to 127; a threshold of 127 excludes it, 126 includes it.
        let cell = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let leaf = square(10, 0, 0, 10);
        assert_eq!(area(&detect_signal(&cell, &leaf, 127).mask), 0);
        assert_eq!(area(&detect_signal(&cell, &leaf, 126).mask), 100);
    }

    #[test]
    fn empty_leaf_yields_empty_signal() {
        let cell = RgbImage::from_pixel(20, 20, INK);
        let leaf = GrayImage::new(20, 20);
        let detection = detect_signal(&cell, &leaf, AnalysisConfig::DEFAULT_SIGNAL_THRESHOLD);
        assert_eq!(area(&detection.mask), 0);
        assert_eq!(detection.annotated, cell);
    }

    #[test]
    fn annotation_draws_leaf_and_signal_without_touching_input() {
        let cell = RgbImage::from_fn(40, 40, |x, y| {
            if (15..25).contains(&x) && (15..25).contains(&y) {
                INK
            } else {
                FILM
            }
        });
        let before = cell.clone();
        let leaf = square(40, 5, 5, 30);
        let detection = detect_signal(&cell, &leaf, AnalysisConfig::DEFAULT_SIGNAL_THRESHOLD);
        assert_eq!(cell, before);
        assert_eq!(*detection.annotated.get_pixel(5, 20), LEAF_OUTLINE);
        assert_eq!(*detection.annotated.get_pixel(15, 20), SIGNAL_OUTLINE);
    }
}
