//! Raster preparation for the recognizer.

use image::GrayImage;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use tracing::trace;

/// Prepares rectified rasters before they are handed to the recognizer.
#[derive(Debug, Clone)]
pub struct RasterPreprocessor {
    binarize: bool,
}

impl RasterPreprocessor {
    pub fn new() -> Self {
        Self { binarize: true }
    }

    /// Set whether rasters are binarized with Otsu's threshold.
    pub fn with_binarize(mut self, binarize: bool) -> Self {
        self.binarize = binarize;
        self
    }

    pub fn prepare(&self, gray: GrayImage) -> GrayImage {
        if !self.binarize {
            return gray;
        }

        let level = otsu_level(&gray);
        trace!("Otsu level {} for {}x{} raster", level, gray.width(), gray.height());
        threshold(&gray, level, ThresholdType::Binary)
    }
}

impl Default for RasterPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn two_tone() -> GrayImage {
        GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([40]) } else { Luma([210]) })
    }

    #[test]
    fn test_binarize_two_tone() {
        let out = RasterPreprocessor::new().prepare(two_tone());

        assert_eq!(out.dimensions(), (20, 10));
        assert_eq!(out.get_pixel(2, 2)[0], 0);
        assert_eq!(out.get_pixel(15, 2)[0], 255);
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_passthrough() {
        let out = RasterPreprocessor::new().with_binarize(false).prepare(two_tone());
        assert_eq!(out.get_pixel(2, 2)[0], 40);
    }
}
