//! Scan decoding and partitioning into fixed-size grid cells.
//!
//! Cell `(outer, inner)` is the `dy x dx` (width x height) region whose
//! top-left corner is at column `inner * dy`, row `outer * dx`. Cells do
//! not overlap and are never padded or resampled.

use image::RgbImage;

use crate::config::GridGeometry;
use crate::types::{CellIndex, Dimensions, PipelineError};

/// Decode raw scan bytes (PNG, JPEG, BMP, TIFF, WebP) into 8-bit RGB.
///
/// Alpha, if present, is discarded.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_scan(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Check that a scan holds every cell of the grid.
///
/// Larger scans are accepted; the excess is never addressed.
///
/// # Errors
///
/// Returns [`PipelineError::GridMismatch`] if the scan is smaller than
/// `n2 * dy` wide or `n1 * dx` tall.
pub fn check_scan(scan: &RgbImage, grid: &GridGeometry) -> Result<(), PipelineError> {
    let scan = Dimensions::of(scan);
    let required = grid.scan_dimensions();
    if scan.covers(required) {
        Ok(())
    } else {
        Err(PipelineError::GridMismatch { scan, required })
    }
}

/// Check a leaf/signal scan pair: each must hold every cell of the grid.
///
/// The scans need not match each other. Two passes through a scanner
/// often differ by a pixel or two; the difference lies outside the
/// addressed region and is only logged.
///
/// # Errors
///
/// Returns [`PipelineError::GridMismatch`] for the first scan that is too
/// small.
pub fn check_scan_pair(
    leaf: &RgbImage,
    signal: &RgbImage,
    grid: &GridGeometry,
) -> Result<(), PipelineError> {
    check_scan(leaf, grid)?;
    check_scan(signal, grid)?;
    let (leaf_dims, signal_dims) = (Dimensions::of(leaf), Dimensions::of(signal));
    if leaf_dims != signal_dims {
        tracing::warn!(
            leaf = %leaf_dims,
            signal = %signal_dims,
            "leaf and signal scans differ in size; using the grid region of each"
        );
    }
    Ok(())
}

/// Copy out one cell of a scan.
///
/// # Errors
///
/// Returns [`PipelineError::GridMismatch`] if the addressed region does
/// not lie entirely inside the scan.
pub fn crop(scan: &RgbImage, cell: CellIndex, grid: &GridGeometry) -> Result<RgbImage, PipelineError> {
    let cell_dims = grid.cell_dimensions();
    let x = u64::from(cell.inner) * u64::from(grid.dy);
    let y = u64::from(cell.outer) * u64::from(grid.dx);
    let fits = x + u64::from(cell_dims.width) <= u64::from(scan.width())
        && y + u64::from(cell_dims.height) <= u64::from(scan.height());

    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) if fits => {
            Ok(image::imageops::crop_imm(scan, x, y, cell_dims.width, cell_dims.height).to_image())
        }
        _ => Err(PipelineError::GridMismatch {
            scan: Dimensions::of(scan),
            required: Dimensions {
                width: u32::try_from(x + u64::from(cell_dims.width)).unwrap_or(u32::MAX),
                height: u32::try_from(y + u64::from(cell_dims.height)).unwrap_or(u32::MAX),
            },
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgb;

    use super::*;

    fn grid() -> GridGeometry {
        GridGeometry {
            dx: 3,
            dy: 5,
            n1: 4,
            n2: 2,
        }
    }

    /// Scan where every pixel encodes its own coordinates.
    #[allow(clippy::cast_possible_truncation)]
    fn coordinate_scan(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn crop_has_cell_dimensions() {
        let scan = coordinate_scan(10, 12);
        let cell = crop(&scan, CellIndex::new(3, 1), &grid()).unwrap();
        assert_eq!(cell.width(), 5);
        assert_eq!(cell.height(), 3);
    }

    #[test]
    fn crop_offsets_outer_by_dx_rows_and_inner_by_dy_columns() {
        let scan = coordinate_scan(10, 12);
        let cell = crop(&scan, CellIndex::new(2, 1), &grid()).unwrap();
        assert_eq!(*cell.get_pixel(0, 0), Rgb([5, 6, 0]));
        assert_eq!(*cell.get_pixel(4, 2), Rgb([9, 8, 0]));
    }

    #[test]
    fn crop_beyond_scan_is_grid_mismatch() {
        let scan = coordinate_scan(9, 12);
        let result = crop(&scan, CellIndex::new(0, 1), &grid());
        assert!(matches!(result, Err(PipelineError::GridMismatch { .. })));
    }

    #[test]
    fn larger_scan_is_accepted() {
        let scan = coordinate_scan(15, 20);
        assert!(check_scan(&scan, &grid()).is_ok());
        let cell = crop(&scan, CellIndex::new(3, 1), &grid()).unwrap();
        assert_eq!(*cell.get_pixel(0, 0), Rgb([5, 9, 0]));
    }

    #[test]
    fn short_scan_is_rejected_at_load() {
        let scan = coordinate_scan(10, 11);
        let actual = Dimensions {
            width: 10,
            height: 11,
        };
        let needed = Dimensions {
            width: 10,
            height: 12,
        };
        let err = check_scan(&scan, &grid()).unwrap_err();
        assert!(
            matches!(
                err,
                PipelineError::GridMismatch { scan, required } if scan == actual && required == needed
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn pair_of_different_sizes_is_accepted() {
        let leaf = coordinate_scan(11, 13);
        let signal = coordinate_scan(10, 12);
        assert!(check_scan_pair(&leaf, &signal, &grid()).is_ok());
    }

    #[test]
    fn pair_with_one_short_scan_is_rejected() {
        let leaf = coordinate_scan(12, 12);
        let signal = coordinate_scan(9, 14);
        assert!(matches!(
            check_scan_pair(&leaf, &signal, &grid()),
            Err(PipelineError::GridMismatch { scan, .. }) if scan.width == 9
        ));
    }

    #[test]
    fn decode_empty_input() {
        assert!(matches!(decode_scan(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn decode_corrupt_input() {
        assert!(matches!(
            decode_scan(&[0xFF, 0x00, 0x12]),
            Err(PipelineError::ImageDecode(_))
        ));
    }

    #[test]
    fn decode_png_drops_alpha() {
        let img = image::RgbaImage::from_fn(3, 2, |_, _| image::Rgba([10, 20, 30, 40]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();

        let scan = decode_scan(&buf).unwrap();
        assert_eq!(Dimensions::of(&scan), Dimensions { width: 3, height: 2 });
        assert_eq!(*scan.get_pixel(2, 1), Rgb([10, 20, 30]));
    }
}
