//! Thick border outlines for visual QA of annotated crops.

use image::{Rgb, RgbImage};

use crate::contour::Border;

/// Leaf boundary color.
pub const LEAF_OUTLINE: Rgb<u8> = Rgb([255, 100, 0]);
/// Leaf boundary stroke width in pixels.
pub const LEAF_THICKNESS: u32 = 6;

/// Bacterial signal boundary color.
pub const SIGNAL_OUTLINE: Rgb<u8> = Rgb([255, 0, 150]);
/// Bacterial signal boundary stroke width in pixels.
pub const SIGNAL_THICKNESS: u32 = 4;

/// Chlorotic region boundary color.
pub const CHLOROSIS_OUTLINE: Rgb<u8> = Rgb([0, 255, 255]);
/// Chlorotic region boundary stroke width in pixels.
pub const CHLOROSIS_THICKNESS: u32 = 4;

/// Stroke every border with a disc of radius `thickness / 2` centred on each
/// border pixel, so a straight edge gets a band `2 * (thickness / 2) + 1`
/// pixels across: one wider than `thickness` when it is even. Strokes are
/// clipped to the image.
#[allow(clippy::cast_possible_wrap)]
pub fn outline(image: &mut RgbImage, borders: &[Border], color: Rgb<u8>, thickness: u32) {
    let radius = (thickness / 2) as i32;
    for border in borders {
        for p in &border.points {
            if radius == 0 {
                put_if_inside(image, p.x, p.y, color);
            } else {
                imageproc::drawing::draw_filled_circle_mut(image, (p.x, p.y), radius, color);
            }
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn put_if_inside(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}
