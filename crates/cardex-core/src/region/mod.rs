//! Detected regions and their rectification into recognizer input.

mod preprocessing;
mod rectifier;

pub use preprocessing::RasterPreprocessor;
pub use rectifier::{OrderedQuad, RectifyMode, Rectifier, order_points};

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::models::FieldKind;

/// A 2D point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Four corners of a region, in any order.
pub type Quad = [Point; 4];

/// A detected area of interest tagged with a field kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Field the detector believes this region holds.
    pub kind: FieldKind,
    /// Corner points, not necessarily ordered.
    pub quad: Quad,
    /// Detection confidence score (0.0 - 1.0), when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Region {
    pub fn new(kind: FieldKind, quad: Quad) -> Self {
        Self {
            kind,
            quad,
            confidence: None,
        }
    }

    /// Build a region from raw `(x, y)` corners.
    pub fn from_corners(kind: FieldKind, corners: [(f32, f32); 4]) -> Self {
        Self::new(kind, corners.map(Point::from))
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Upright single-channel raster cut out of one region.
///
/// Lives only until the recognizer has read it.
#[derive(Debug, Clone)]
pub struct RectifiedRaster {
    /// Index of the source region in detection order.
    pub region_index: usize,
    /// Field kind of the source region.
    pub kind: FieldKind,
    /// Pixel data, at least 1x1.
    pub image: GrayImage,
}

impl RectifiedRaster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
