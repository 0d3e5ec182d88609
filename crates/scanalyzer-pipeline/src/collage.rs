//! Reassemble per-cell annotated crops into full-scan collages.
//!
//! Crops arrive in outer-major grid order. Each run of `n2` crops is
//! joined side by side into a strip, and the `n1` strips are stacked top
//! to bottom. The result mirrors [`grid::crop`](crate::grid::crop) exactly:
//! crop `(outer, inner)` lands at column `inner * dy`, row `outer * dx`.

use image::RgbImage;

use crate::config::GridGeometry;
use crate::types::{Dimensions, PipelineError};

/// Assemble a collage from `n1 * n2` crops of cell size.
///
/// # Errors
///
/// Returns [`PipelineError::CollageLayout`] if the crop count does not
/// match the grid or any crop is not exactly cell-sized.
pub fn assemble(crops: &[RgbImage], grid: &GridGeometry) -> Result<RgbImage, PipelineError> {
    if crops.len() != grid.cell_count() {
        return Err(PipelineError::CollageLayout(format!(
            "{} crops for a grid of {} cells",
            crops.len(),
            grid.cell_count()
        )));
    }
    let cell = grid.cell_dimensions();
    if let Some((i, crop)) = crops
        .iter()
        .enumerate()
        .find(|(_, c)| Dimensions::of(*c) != cell)
    {
        return Err(PipelineError::CollageLayout(format!(
            "crop {i} is {} but cells are {cell}",
            Dimensions::of(crop)
        )));
    }

    let strips: Vec<RgbImage> = crops.chunks(grid.n2 as usize).map(join_across).collect();
    Ok(stack_down(&strips))
}

/// Join equal-height images left to right.
fn join_across(images: &[RgbImage]) -> RgbImage {
    let width = images.iter().map(RgbImage::width).sum();
    let height = images.first().map_or(0, RgbImage::height);
    let mut strip = RgbImage::new(width, height);
    let mut x = 0i64;
    for image in images {
        image::imageops::replace(&mut strip, image, x, 0);
        x += i64::from(image.width());
    }
    strip
}

/// Stack equal-width images top to bottom.
fn stack_down(images: &[RgbImage]) -> RgbImage {
    let width = images.first().map_or(0, RgbImage::width);
    let height = images.iter().map(RgbImage::height).sum();
    let mut collage = RgbImage::new(width, height);
    let mut y = 0i64;
    for image in images {
        image::imageops::replace(&mut collage, image, 0, y);
        y += i64::from(image.height());
    }
    collage
}
