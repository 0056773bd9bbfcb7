//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use super::result::ExtractionResult;
use crate::fields::{AggregationStrategy, DateStrategy};
use crate::region::RectifyMode;

/// Main configuration for the cardex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardexConfig {
    /// Region rectification configuration.
    pub rectify: RectifyConfig,

    /// Field validation and aggregation configuration.
    pub extraction: ExtractionConfig,

    /// Worker pool configuration.
    pub pipeline: PipelineConfig,

    /// Caller-side review policy.
    pub review: ReviewPolicy,
}

impl ExtractionConfig {
    /// Inclusive range of accepted birth years, given the current year.
    pub fn year_range(&self, current_year: i32) -> (i32, i32) {
        (self.min_year, current_year.saturating_add(self.max_years_ahead))
    }

    /// Check that the year bounds admit at least one year.
    pub fn check_year_range(&self, current_year: i32) -> Result<(), String> {
        if self.max_years_ahead < 0 {
            return Err(format!(
                "max_years_ahead must not be negative, got {}",
                self.max_years_ahead
            ));
        }
        let (min_year, max_year) = self.year_range(current_year);
        if min_year > max_year {
            return Err(format!(
                "min_year {} is after the latest accepted year {}",
                min_year, max_year
            ));
        }
        Ok(())
    }
}

/// Region rectification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// How a quad is turned into an upright raster.
    pub mode: RectifyMode,

    /// Apply Otsu binarization before recognition.
    pub binarize: bool,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            mode: RectifyMode::Perspective,
            binarize: true,
        }
    }
}

/// Field validation and aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Which date match wins when several patterns match.
    pub date_strategy: DateStrategy,

    /// How name and date candidates are reduced to one value.
    pub aggregation: AggregationStrategy,

    /// Surface the first raw ID attempt (flagged unverified) when no
    /// candidate validates.
    pub id_fallback: bool,

    /// Regions with a detection confidence below this are skipped
    /// (0.0 = keep everything).
    pub min_region_confidence: f32,

    /// Earliest accepted birth year.
    pub min_year: i32,

    /// Latest accepted birth year, relative to the current year.
    pub max_years_ahead: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            date_strategy: DateStrategy::PriorityOrder,
            aggregation: AggregationStrategy::LongestValid,
            id_fallback: false,
            min_region_confidence: 0.0,
            min_year: 1900,
            max_years_ahead: 10,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Threads used for per-region processing (0 = shared global pool).
    pub worker_threads: usize,
}

/// What a caller should do with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// All four fields resolved and verified.
    Complete,
    /// Some fields unresolved, below the retry threshold.
    Incomplete,
    /// Too many fields unresolved; ask for a clearer image.
    RetryWithClearerImage,
}

/// Caller-side policy for incomplete results.
///
/// This never influences extraction itself; it only classifies a finished
/// [`ExtractionResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPolicy {
    /// Number of unresolved fields at which a clearer image is requested
    /// (0 = never).
    pub retry_threshold: usize,

    /// Persist records that are not complete.
    pub persist_incomplete: bool,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            retry_threshold: 2,
            persist_incomplete: false,
        }
    }
}

impl ReviewPolicy {
    /// Classify a result.
    pub fn verdict(&self, result: &ExtractionResult) -> Verdict {
        let unresolved = result.unresolved().len();
        if unresolved == 0 {
            Verdict::Complete
        } else if self.retry_threshold > 0 && unresolved >= self.retry_threshold {
            Verdict::RetryWithClearerImage
        } else {
            Verdict::Incomplete
        }
    }

    /// Whether a result should be handed to persistence.
    pub fn should_persist(&self, result: &ExtractionResult) -> bool {
        self.persist_incomplete || self.verdict(result) == Verdict::Complete
    }
}

impl CardexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
