//! Region sidecar files.
//!
//! A sidecar sits next to an image as `<stem>.regions.json` and records what
//! an upstream detector and recognizer produced for it:
//!
//! ```json
//! {"regions": [{"kind": "name", "quad": [[12, 40], [220, 40], [220, 62], [12, 62]],
//!               "confidence": 0.93, "text": "RAHUL KUMAR"}]}
//! ```
//!
//! The `text` fields are replayed as recognizer output, keyed by region index.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use cardex_core::pipeline::{Detector, Recognizer};
use cardex_core::{RectifiedRaster, Region, RegionError};

/// One recorded region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarRegion {
    #[serde(flatten)]
    pub region: Region,

    /// Text the recognizer read from this region, if it was run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Recorded detection and recognition output for one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sidecar {
    pub regions: Vec<SidecarRegion>,
}

impl Sidecar {
    /// Load a sidecar file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read regions file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed regions file {}", path.display()))
    }

    /// Default sidecar location for `image`.
    pub fn path_for(image: &Path) -> PathBuf {
        let stem = image
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        image.with_file_name(format!("{}.regions.json", stem))
    }
}

impl Detector for Sidecar {
    fn detect(&self, _image: &DynamicImage) -> cardex_core::Result<Vec<Region>> {
        Ok(self.regions.iter().map(|r| r.region.clone()).collect())
    }
}

impl Recognizer for Sidecar {
    fn recognize(&self, raster: &RectifiedRaster) -> Result<String, RegionError> {
        let entry = self.regions.get(raster.region_index).ok_or_else(|| {
            RegionError::Recognizer(format!("no region {} in transcript", raster.region_index))
        })?;
        Ok(entry.text.clone().unwrap_or_default())
    }
}
