//! Shared types for the scanalyzer quantification pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference masks
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference scans and
/// annotated crops without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Whether an image of these dimensions contains a region of `other`
    /// anchored at the origin.
    #[must_use]
    pub const fn covers(self, other: Self) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Zero-based position of one sample on the physical grid.
///
/// `outer` runs over the `n1` axis and `inner` over the `n2` axis of
/// [`GridGeometry`](crate::config::GridGeometry). Traversal order is
/// always outer-major: every inner position of outer `0`, then outer `1`,
/// and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellIndex {
    /// Index along the outer (`n1`, step `dx`) axis.
    pub outer: u32,
    /// Index along the inner (`n2`, step `dy`) axis.
    pub inner: u32,
}

impl CellIndex {
    /// Create a new cell index.
    #[must_use]
    pub const fn new(outer: u32, inner: u32) -> Self {
        Self { outer, inner }
    }
}

/// One output row: a grid cell's labels, metadata, and measured areas.
///
/// `bacteria_area` and `chlorotic_area` are `None` when the cell's leaf
/// did not exceed the minimum leaf area. Serializers decide how a missing
/// value is spelled on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Physical column label (1-based).
    pub column: u32,
    /// Physical row label (1-based, counted from the bottom).
    pub row: u32,
    /// Bioassay id for this cell.
    pub bioassay: String,
    /// Days post inoculation for this cell.
    pub dpi: String,
    /// Plant genotype.
    pub genotype: String,
    /// Inoculated pathogen.
    pub pathogen: String,
    /// Applied treatment.
    pub treatment: String,
    /// Leaf area in pixels. Always reported.
    pub leaf_area: u64,
    /// Bacterial signal area in pixels.
    pub bacteria_area: Option<u64>,
    /// Sum of chlorotic contour areas in square pixels.
    pub chlorotic_area: Option<f64>,
}

/// Errors that can occur while analyzing a scan pair.
///
/// Per-cell detection outcomes (no leaf, no signal, no chlorosis) are not
/// errors; they are reported through [`LeafStatus`](crate::area::LeafStatus).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode an input scan.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A scan is too small for the configured grid.
    #[error("scan is {scan} but the grid requires at least {required}")]
    GridMismatch {
        /// Actual scan dimensions.
        scan: Dimensions,
        /// Minimum dimensions implied by the grid geometry.
        required: Dimensions,
    },

    /// The metadata file does not have the expected block layout.
    #[error("malformed metadata: {0}")]
    MetadataFormat(String),

    /// Annotated crops cannot be assembled into a grid-shaped collage.
    #[error("cannot assemble collage: {0}")]
    CollageLayout(String),

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),
}
