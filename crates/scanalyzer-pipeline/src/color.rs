//! Color-space conversions and band thresholding on 8-bit scans.
//!
//! Hue/saturation/value use the compact 8-bit scale common to scanner
//! tooling: hue in `0..180` (degrees halved), saturation and value in
//! `0..=255`. Thresholds in [`AnalysisConfig`](crate::config::AnalysisConfig)
//! are expressed on this scale.

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Foreground value for binary masks.
pub const FOREGROUND: u8 = 255;

/// An 8-bit hue/saturation/value triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    /// Hue, `0..180`.
    pub h: u8,
    /// Saturation, `0..=255`.
    pub s: u8,
    /// Value, `0..=255`.
    pub v: u8,
}

impl Hsv {
    /// Create a new triple.
    #[must_use]
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive hue/saturation/value box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    /// Lower bound, inclusive on every channel.
    pub lower: Hsv,
    /// Upper bound, inclusive on every channel.
    pub upper: Hsv,
}

impl HsvRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    /// Whether `hsv` lies inside the box on all three channels.
    #[must_use]
    pub const fn contains(&self, hsv: Hsv) -> bool {
        self.lower.h <= hsv.h
            && hsv.h <= self.upper.h
            && self.lower.s <= hsv.s
            && hsv.s <= self.upper.s
            && self.lower.v <= hsv.v
            && hsv.v <= self.upper.v
    }

    /// Whether every lower bound is at most its upper bound.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.lower.h <= self.upper.h && self.lower.s <= self.upper.s && self.lower.v <= self.upper.v
    }
}

/// Convert one RGB pixel to 8-bit HSV.
///
/// Hue is on the 8-bit `0..180` scale that band bounds use, not the float
/// `0..360` degrees of colour-space crates such as `palette`. Rounding
/// follows fixed-point `floor(x + 0.5)`, so negative hue
/// intermediates round toward positive infinity before wrapping.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = f32::from(max - min);

    let s = if max == 0 {
        0
    } else {
        (255.0 * diff / f32::from(max) + 0.5).floor() as u8
    };

    if max == min {
        return Hsv::new(0, s, max);
    }

    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let hue = if max == r {
        30.0 * (gf - bf) / diff
    } else if max == g {
        30.0f32.mul_add((bf - rf) / diff, 60.0)
    } else {
        30.0f32.mul_add((rf - gf) / diff, 120.0)
    };
    let mut h = (hue + 0.5).floor();
    if h < 0.0 {
        h += 180.0;
    }
    if h >= 180.0 {
        h -= 180.0;
    }

    Hsv::new(h as u8, s, max)
}

/// Luminance of one RGB pixel using `0.299 R + 0.587 G + 0.114 B`
/// in 14-bit fixed point.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn luma(Rgb([r, g, b]): Rgb<u8>) -> u8 {
    let weighted = u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868;
    ((weighted + (1 << 13)) >> 14) as u8
}

/// Binary mask of pixels whose HSV value lies inside `range`.
///
/// When `within` is given, pixels outside its foreground are evaluated
/// as black (`h = s = v = 0`), the same as masking the image before
/// thresholding.
#[must_use = "returns the binary selection mask"]
pub fn select_in_range(image: &RgbImage, range: &HsvRange, within: Option<&GrayImage>) -> GrayImage {
    let black = Hsv::new(0, 0, 0);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let masked_out = within.is_some_and(|m| m.get_pixel(x, y).0[0] == 0);
        let hsv = if masked_out {
            black
        } else {
            rgb_to_hsv(*image.get_pixel(x, y))
        };
        Luma([if range.contains(hsv) { FOREGROUND } else { 0 }])
    })
}

/// Binary mask of pixels whose HSV value lies outside `range`.
#[must_use = "returns the binary selection mask"]
pub fn select_outside_range(image: &RgbImage, range: &HsvRange) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let inside = range.contains(rgb_to_hsv(*image.get_pixel(x, y)));
        Luma([if inside { 0 } else { FOREGROUND }])
    })
}

/// Greyscale conversion followed by inversion, so dark ink becomes bright.
#[must_use = "returns the inverted greyscale image"]
pub fn inverted_grey(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([!luma(*image.get_pixel(x, y))])
    })
}
