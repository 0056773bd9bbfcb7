//! Quadrilateral rectification.
//!
//! A detected region is an arbitrary-order quad that may be skewed by the
//! camera angle. The rectifier orders its corners, sizes an upright target
//! rectangle from the longest opposite edges and resamples the quad into it.

use image::{DynamicImage, GrayImage, Luma, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Point, Quad, RasterPreprocessor, RectifiedRaster, Region};
use crate::error::RegionError;

/// Areas at or below this (in square pixels) count as degenerate.
const MIN_AREA: f32 = 1e-3;

/// How a quad is turned into an upright raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectifyMode {
    /// Perspective-warp the quad onto a rectangle.
    #[default]
    Perspective,
    /// Crop the axis-aligned bounding rectangle of the quad.
    BoundingBox,
}

/// Quad corners in top-left, top-right, bottom-right, bottom-left order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedQuad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl OrderedQuad {
    pub fn corners(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Largest triangle spanned by any three corners. Zero exactly when
    /// the corners are collinear or coincident, whatever their order.
    pub fn area(&self) -> f32 {
        spread(&self.corners())
    }

    /// Upright target size: the longer of each pair of opposite edges,
    /// rounded, at least one pixel.
    pub fn target_size(&self) -> (u32, u32) {
        let width = self
            .top_right
            .distance(&self.top_left)
            .max(self.bottom_right.distance(&self.bottom_left));
        let height = self
            .bottom_left
            .distance(&self.top_left)
            .max(self.bottom_right.distance(&self.top_right));

        ((width.round() as u32).max(1), (height.round() as u32).max(1))
    }

    /// Copy with every corner clamped into `[0, width] x [0, height]`.
    fn clamped(&self, width: u32, height: u32) -> Self {
        let clamp = |p: Point| {
            Point::new(p.x.clamp(0.0, width as f32), p.y.clamp(0.0, height as f32))
        };
        Self {
            top_left: clamp(self.top_left),
            top_right: clamp(self.top_right),
            bottom_right: clamp(self.bottom_right),
            bottom_left: clamp(self.bottom_left),
        }
    }
}

fn triangle_area(a: Point, b: Point, c: Point) -> f32 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

fn spread(points: &[Point; 4]) -> f32 {
    let [a, b, c, d] = *points;
    triangle_area(a, b, c)
        .max(triangle_area(a, b, d))
        .max(triangle_area(a, c, d))
        .max(triangle_area(b, c, d))
}

/// Order quad corners with the sum/difference rule.
///
/// The corner with the smallest `x + y` is top-left and the one with the
/// largest is bottom-right. Of the other two, the smaller `y - x` is
/// top-right. Each corner comes from a distinct input point.
pub fn order_points(quad: &Quad) -> Result<OrderedQuad, RegionError> {
    if quad.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(RegionError::InvalidGeometry(
            "quad has non-finite coordinates".to_string(),
        ));
    }

    let sum = |i: usize| quad[i].x + quad[i].y;
    let diff = |i: usize| quad[i].y - quad[i].x;

    let mut tl = 0;
    for i in 1..4 {
        if sum(i) < sum(tl) {
            tl = i;
        }
    }

    let mut br = if tl == 0 { 1 } else { 0 };
    for i in 0..4 {
        if i != tl && sum(i) > sum(br) {
            br = i;
        }
    }

    let rest: Vec<usize> = (0..4).filter(|&i| i != tl && i != br).collect();
    let (a, b) = (rest[0], rest[1]);
    let (tr, bl) = if diff(b) < diff(a) { (b, a) } else { (a, b) };

    let ordered = OrderedQuad {
        top_left: quad[tl],
        top_right: quad[tr],
        bottom_right: quad[br],
        bottom_left: quad[bl],
    };

    if ordered.area() <= MIN_AREA {
        return Err(RegionError::InvalidGeometry(format!(
            "quad points are collinear or coincident: {:?}",
            quad
        )));
    }

    Ok(ordered)
}

/// Turns regions into recognizer-ready rasters.
#[derive(Debug, Clone)]
pub struct Rectifier {
    mode: RectifyMode,
    preprocessor: RasterPreprocessor,
}

impl Rectifier {
    pub fn new() -> Self {
        Self {
            mode: RectifyMode::default(),
            preprocessor: RasterPreprocessor::new(),
        }
    }

    pub fn with_mode(mut self, mode: RectifyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: RasterPreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Rectify one region of `image`.
    ///
    /// `index` is the region's position in detection order and is carried
    /// on the raster.
    pub fn rectify(
        &self,
        image: &DynamicImage,
        region: &Region,
        index: usize,
    ) -> Result<RectifiedRaster, RegionError> {
        self.rectify_luma(&image.to_luma8(), region, index)
    }

    /// Same as [`Rectifier::rectify`] for an image already in grayscale.
    pub fn rectify_luma(
        &self,
        gray: &GrayImage,
        region: &Region,
        index: usize,
    ) -> Result<RectifiedRaster, RegionError> {
        let ordered = order_points(&region.quad)?;
        let raster = self.rectify_gray(gray, &ordered)?;

        Ok(RectifiedRaster {
            region_index: index,
            kind: region.kind,
            image: self.preprocessor.prepare(raster),
        })
    }

    /// Rectify an already ordered quad out of a grayscale image.
    pub fn rectify_gray(
        &self,
        gray: &GrayImage,
        ordered: &OrderedQuad,
    ) -> Result<GrayImage, RegionError> {
        let (img_width, img_height) = gray.dimensions();
        if img_width == 0 || img_height == 0 {
            return Err(RegionError::UnreadableRegion("source image is empty".to_string()));
        }

        let clamped = ordered.clamped(img_width, img_height);
        if clamped.area() <= MIN_AREA {
            return Err(RegionError::UnreadableRegion(
                "region lies outside the image".to_string(),
            ));
        }

        match self.mode {
            RectifyMode::Perspective => warp_quad(gray, &clamped),
            RectifyMode::BoundingBox => Ok(crop_bounds(gray, &clamped)),
        }
    }
}

impl Default for Rectifier {
    fn default() -> Self {
        Self::new()
    }
}

fn warp_quad(gray: &GrayImage, quad: &OrderedQuad) -> Result<GrayImage, RegionError> {
    let (width, height) = quad.target_size();
    let (w, h) = (width as f32, height as f32);

    let from = quad.corners().map(|p| (p.x, p.y));
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let projection = Projection::from_control_points(from, to).ok_or_else(|| {
        RegionError::InvalidGeometry("no perspective mapping for quad".to_string())
    })?;

    trace!("Warping quad {:?} to {}x{}", from, width, height);

    let mut out = GrayImage::new(width, height);
    warp_into(gray, &projection, Interpolation::Bilinear, Luma([255]), &mut out);
    Ok(out)
}

fn crop_bounds(gray: &GrayImage, quad: &OrderedQuad) -> GrayImage {
    let (img_width, img_height) = gray.dimensions();
    let corners = quad.corners();

    let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

    let x = (min_x.floor() as u32).min(img_width - 1);
    let y = (min_y.floor() as u32).min(img_height - 1);
    let width = (max_x.ceil() as u32).saturating_sub(x).clamp(1, img_width - x);
    let height = (max_y.ceil() as u32).saturating_sub(y).clamp(1, img_height - y);

    imageops::crop_imm(gray, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKind;
    use pretty_assertions::assert_eq;

    fn quad(points: [(f32, f32); 4]) -> Quad {
        points.map(Point::from)
    }

    fn unbinarized() -> Rectifier {
        Rectifier::new().with_preprocessor(RasterPreprocessor::new().with_binarize(false))
    }

    #[test]
    fn test_order_is_input_order_independent() {
        let expected = OrderedQuad {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(10.0, 0.0),
            bottom_right: Point::new(10.0, 10.0),
            bottom_left: Point::new(0.0, 10.0),
        };

        let orders = [
            [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            [(10.0, 10.0), (0.0, 10.0), (10.0, 0.0), (0.0, 0.0)],
            [(0.0, 10.0), (10.0, 10.0), (0.0, 0.0), (10.0, 0.0)],
        ];
        for points in orders {
            assert_eq!(order_points(&quad(points)).unwrap(), expected);
        }
    }

    #[test]
    fn test_skewed_quad() {
        let ordered = order_points(&quad([(102.0, 48.0), (3.0, 40.0), (0.0, 10.0), (98.0, 2.0)])).unwrap();

        assert_eq!(ordered.top_left, Point::new(0.0, 10.0));
        assert_eq!(ordered.top_right, Point::new(98.0, 2.0));
        assert_eq!(ordered.bottom_right, Point::new(102.0, 48.0));
        assert_eq!(ordered.bottom_left, Point::new(3.0, 40.0));
    }

    #[test]
    fn test_target_size_uses_longer_edges() {
        let ordered = order_points(&quad([(0.0, 0.0), (100.0, 0.0), (90.0, 30.0), (10.0, 20.0)])).unwrap();
        let (width, height) = ordered.target_size();

        assert_eq!(width, 100);
        // |br - tr| = hypot(10, 30)
        assert_eq!(height, 32);
    }

    #[test]
    fn test_diamond_is_not_degenerate() {
        // Sum/difference ordering of a diamond crosses over itself, but the
        // points still span an area.
        let diamond = quad([(5.0, 0.0), (10.0, 5.0), (5.0, 10.0), (0.0, 5.0)]);
        assert!(order_points(&diamond).is_ok());
    }

    #[test]
    fn test_degenerate_quads() {
        let coincident = quad([(5.0, 5.0); 4]);
        assert!(matches!(order_points(&coincident), Err(RegionError::InvalidGeometry(_))));

        let collinear = quad([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert!(matches!(order_points(&collinear), Err(RegionError::InvalidGeometry(_))));

        let nan = quad([(f32::NAN, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(matches!(order_points(&nan), Err(RegionError::InvalidGeometry(_))));
    }

    #[test]
    fn test_unit_square_corners() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([90])));
        let square = quad([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);

        let ordered = order_points(&square).unwrap();
        assert_eq!(ordered.top_left, Point::new(0.0, 0.0));
        assert_eq!(ordered.bottom_right, Point::new(10.0, 10.0));

        let raster = Rectifier::new()
            .rectify(&image, &Region::new(FieldKind::IdNumber, square), 0)
            .unwrap();
        assert_eq!((raster.width(), raster.height()), (10, 10));
    }

    #[test]
    fn test_square_rectifies_to_same_size() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([128])));
        let region = Region::new(
            FieldKind::Name,
            quad([(10.0, 10.0), (0.0, 0.0), (0.0, 10.0), (10.0, 0.0)]),
        );

        let raster = Rectifier::new().rectify(&image, &region, 3).unwrap();

        assert_eq!((raster.width(), raster.height()), (10, 10));
        assert_eq!(raster.region_index, 3);
        assert_eq!(raster.kind, FieldKind::Name);
    }

    #[test]
    fn test_perspective_moves_content_upright() {
        // Left half dark, right half light, rotated quad covering both.
        let gray = GrayImage::from_fn(100, 100, |x, _| if x < 50 { Luma([0]) } else { Luma([255]) });
        let ordered = order_points(&quad([(20.0, 20.0), (80.0, 25.0), (80.0, 75.0), (20.0, 70.0)])).unwrap();

        let out = unbinarized().rectify_gray(&gray, &ordered).unwrap();

        assert_eq!(out.dimensions(), (60, 50));
        assert!(out.get_pixel(2, out.height() / 2)[0] < 50);
        assert!(out.get_pixel(out.width() - 3, out.height() / 2)[0] > 200);
    }

    #[test]
    fn test_out_of_bounds_quad() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(50, 50));
        let region = Region::new(
            FieldKind::DateOfBirth,
            quad([(100.0, 100.0), (200.0, 100.0), (200.0, 150.0), (100.0, 150.0)]),
        );

        let err = Rectifier::new().rectify(&image, &region, 0).unwrap_err();
        assert!(matches!(err, RegionError::UnreadableRegion(_)));
    }

    #[test]
    fn test_partially_outside_is_clamped() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(50, 50));
        let region = Region::new(
            FieldKind::DateOfBirth,
            quad([(-10.0, 10.0), (40.0, 10.0), (40.0, 30.0), (-10.0, 30.0)]),
        );

        let raster = Rectifier::new().rectify(&image, &region, 0).unwrap();
        assert_eq!((raster.width(), raster.height()), (40, 20));
    }

    #[test]
    fn test_bounding_box_mode() {
        let gray = GrayImage::new(60, 40);
        let ordered = order_points(&quad([(10.5, 5.0), (50.0, 8.0), (48.0, 30.2), (12.0, 28.0)])).unwrap();

        let out = Rectifier::new()
            .with_mode(RectifyMode::BoundingBox)
            .rectify_gray(&gray, &ordered)
            .unwrap();

        assert_eq!(out.dimensions(), (40, 26));
    }
}
