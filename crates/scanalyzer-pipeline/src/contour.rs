//! Region borders: tracing, geometric area, selection, and filling.
//!
//! Borders come from Suzuki-Abe border following
//! (`imageproc::contours::find_contours`), which reports both outer
//! borders and hole borders for every connected foreground region of a
//! binary mask. A border's area is the area of the polygon through its
//! pixel centres, so a filled `n x n` square has area `(n - 1)^2` while
//! covering `n^2` pixels.

use image::{GrayImage, Luma};
use imageproc::contours::Contour;
use imageproc::point::Point;

use crate::color::FOREGROUND;

/// A traced region border in pixel coordinates.
pub type Border = Contour<i32>;

/// Trace every region border (outer and hole) in a binary mask.
///
/// Any non-zero pixel counts as foreground.
#[must_use = "returns the traced borders"]
pub fn trace(mask: &GrayImage) -> Vec<Border> {
    imageproc::contours::find_contours::<i32>(mask)
}

/// Enclosed geometric area of a closed polygon (shoelace formula).
///
/// Fewer than three vertices enclose nothing.
#[must_use]
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let area = twice.unsigned_abs() as f64 / 2.0;
    area
}

/// Index of the largest area among `areas`.
///
/// Exact ties go to the earliest candidate, so the result depends only on
/// candidate order and never on sort stability. Returns `None` for no
/// candidates.
#[must_use]
pub fn largest<I>(areas: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, area) in areas.into_iter().enumerate() {
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((i, area)),
        }
    }
    best.map(|(i, _)| i)
}

/// The border enclosing the largest area, first traced on ties.
#[must_use]
pub fn largest_border(borders: &[Border]) -> Option<&Border> {
    largest(borders.iter().map(|b| polygon_area(&b.points))).map(|i| &borders[i])
}

/// Fill the interior of a border, boundary pixels included.
///
/// Degenerate borders (isolated pixels, one-pixel-wide lines) have no
/// interior and are painted point by point.
pub fn fill(mask: &mut GrayImage, points: &[Point<i32>]) {
    let mut polygon = points;
    // The polygon rasterizer rejects an explicitly closed ring.
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon = &polygon[..polygon.len() - 1];
    }

    if polygon.len() < 3 {
        for p in polygon {
            put_if_inside(mask, *p);
        }
        return;
    }
    imageproc::drawing::draw_polygon_mut(mask, polygon, Luma([FOREGROUND]));
}

/// A fresh mask with every given border filled.
#[must_use = "returns the filled mask"]
pub fn filled_mask<'a, I>(width: u32, height: u32, borders: I) -> GrayImage
where
    I: IntoIterator<Item = &'a Border>,
{
    let mut mask = GrayImage::new(width, height);
    for border in borders {
        fill(&mut mask, &border.points);
    }
    mask
}

#[allow(clippy::cast_sign_loss)]
fn put_if_inside(mask: &mut GrayImage, p: Point<i32>) {
    if p.x >= 0 && p.y >= 0 && (p.x as u32) < mask.width() && (p.y as u32) < mask.height() {
        mask.put_pixel(p.x as u32, p.y as u32, Luma([FOREGROUND]));
    }
}
