//! Extraction pipeline: regions in, one validated record out.
//!
//! Detection and text recognition are external collaborators injected
//! through the [`Detector`] and [`Recognizer`] traits.

mod engine;

pub use engine::{Extractor, ExtractorBuilder};

use image::DynamicImage;

use crate::error::{RegionError, Result};
use crate::models::ExtractionResult;
use crate::region::{RectifiedRaster, Region};

/// Finds field regions in a document image.
pub trait Detector: Send + Sync {
    /// Detect regions, in detection order.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>>;
}

impl<F> Detector for F
where
    F: Fn(&DynamicImage) -> Result<Vec<Region>> + Send + Sync,
{
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>> {
        self(image)
    }
}

/// Reads the text in a rectified raster.
///
/// Rasters may be binarized. Returning an empty string is allowed and means
/// nothing was read. Errors should use [`RegionError::Recognizer`]; they are
/// recorded against the region and never abort the image.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, raster: &RectifiedRaster) -> std::result::Result<String, RegionError>;
}

impl<F> Recognizer for F
where
    F: Fn(&RectifiedRaster) -> String + Send + Sync,
{
    fn recognize(&self, raster: &RectifiedRaster) -> std::result::Result<String, RegionError> {
        Ok(self(raster))
    }
}

/// Extract a record from `image` with default settings.
///
/// Fails only when the image itself is unusable; every per-region problem
/// ends up as a missing field.
pub fn extract<R>(image: &DynamicImage, regions: &[Region], recognizer: &R) -> Result<ExtractionResult>
where
    R: Recognizer + ?Sized,
{
    Extractor::new().extract(image, regions, recognizer)
}
