//! Configured extraction engine.

use std::time::Instant;

use chrono::{Datelike, Local};
use image::{DynamicImage, GenericImageView, GrayImage};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{CardexError, RegionError, Result};
use crate::fields::{CandidateAggregator, CandidatePool, FieldValidators};
use crate::models::config::CardexConfig;
use crate::models::{ExtractionReport, ExtractionResult, FieldCandidate, FieldKind, RegionOutcome};
use crate::region::{RasterPreprocessor, Rectifier, Region};

use super::{Detector, Recognizer};

/// Extraction engine combining rectification, validation and aggregation.
pub struct Extractor {
    rectifier: Rectifier,
    validators: FieldValidators,
    aggregator: CandidateAggregator,
    min_region_confidence: f32,
    pool: Option<rayon::ThreadPool>,
}

/// Builder for Extractor.
pub struct ExtractorBuilder {
    config: CardexConfig,
    validators: Option<FieldValidators>,
}

impl ExtractorBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: CardexConfig::default(),
            validators: None,
        }
    }

    /// Set configuration.
    pub fn with_config(mut self, config: CardexConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the validators derived from the configuration.
    pub fn with_validators(mut self, validators: FieldValidators) -> Self {
        self.validators = Some(validators);
        self
    }

    /// Build the extractor.
    ///
    /// A dedicated worker pool is created when `pipeline.worker_threads`
    /// is non-zero.
    pub fn build(self) -> Result<Extractor> {
        let config = self.config;

        let pool = match config.pipeline.worker_threads {
            0 => None,
            threads => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("cardex-worker-{}", i))
                    .build()
                    .map_err(|e| CardexError::Config(format!("worker pool: {}", e)))?,
            ),
        };

        let min_region_confidence = config.extraction.min_region_confidence;
        if !(0.0..=1.0).contains(&min_region_confidence) {
            return Err(CardexError::Config(format!(
                "min_region_confidence must be within 0.0..=1.0, got {}",
                min_region_confidence
            )));
        }

        config
            .extraction
            .check_year_range(Local::now().year())
            .map_err(CardexError::Config)?;

        let rectifier = Rectifier::new()
            .with_mode(config.rectify.mode)
            .with_preprocessor(RasterPreprocessor::new().with_binarize(config.rectify.binarize));

        let validators = self
            .validators
            .unwrap_or_else(|| FieldValidators::from_config(&config.extraction));

        let aggregator = CandidateAggregator::new()
            .with_strategy(config.extraction.aggregation)
            .with_id_fallback(config.extraction.id_fallback);

        Ok(Extractor {
            rectifier,
            validators,
            aggregator,
            min_region_confidence,
            pool,
        })
    }
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Extractor with default settings on rayon's global pool.
    pub fn new() -> Self {
        Self {
            rectifier: Rectifier::new(),
            validators: FieldValidators::new(),
            aggregator: CandidateAggregator::new(),
            min_region_confidence: 0.0,
            pool: None,
        }
    }

    /// Create a new builder.
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    /// Build an extractor straight from configuration.
    pub fn from_config(config: CardexConfig) -> Result<Self> {
        ExtractorBuilder::new().with_config(config).build()
    }

    /// Extract a record from `image` given its detected regions.
    pub fn extract<R>(
        &self,
        image: &DynamicImage,
        regions: &[Region],
        recognizer: &R,
    ) -> Result<ExtractionResult>
    where
        R: Recognizer + ?Sized,
    {
        self.extract_report(image, regions, recognizer)
            .map(|report| report.result)
    }

    /// Extract a record and keep the per-region outcomes.
    ///
    /// Outcomes are ordered by region index regardless of which worker
    /// finished first.
    pub fn extract_report<R>(
        &self,
        image: &DynamicImage,
        regions: &[Region],
        recognizer: &R,
    ) -> Result<ExtractionReport>
    where
        R: Recognizer + ?Sized,
    {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CardexError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        if regions.is_empty() {
            info!("No regions in {}x{} image, all fields missing", width, height);
            return Ok(ExtractionReport {
                result: ExtractionResult::all_missing(),
                outcomes: Vec::new(),
            });
        }

        debug!("Processing {} regions in {}x{} image", regions.len(), width, height);

        let gray = image.to_luma8();
        let read_all = || {
            regions
                .par_iter()
                .enumerate()
                .map(|(index, region)| self.process_region(&gray, index, region, recognizer))
                .collect::<Vec<_>>()
        };
        let mut outcomes = match &self.pool {
            Some(pool) => pool.install(read_all),
            None => read_all(),
        };
        outcomes.sort_by_key(|outcome| outcome.index);

        let pool: CandidatePool = outcomes
            .iter()
            .filter_map(|outcome| outcome.candidate.clone())
            .collect();
        let result = self.aggregator.aggregate(&pool);

        info!(
            "Extracted {}/{} fields from {} regions in {:?}",
            FieldKind::ALL.len() - result.missing().len(),
            FieldKind::ALL.len(),
            regions.len(),
            start.elapsed()
        );

        Ok(ExtractionReport { result, outcomes })
    }

    /// Detect regions with `detector`, then extract.
    ///
    /// Detector failures are fatal for the image.
    pub fn extract_detected<D, R>(
        &self,
        image: &DynamicImage,
        detector: &D,
        recognizer: &R,
    ) -> Result<ExtractionReport>
    where
        D: Detector + ?Sized,
        R: Recognizer + ?Sized,
    {
        let regions = detector.detect(image).map_err(|e| match e {
            CardexError::Detection(_) => e,
            other => CardexError::Detection(other.to_string()),
        })?;
        debug!("Detector returned {} regions", regions.len());
        self.extract_report(image, &regions, recognizer)
    }

    /// Extract several images, keeping each result next to its key.
    ///
    /// Images are independent: a failure on one does not affect the others.
    pub fn extract_batch<K, I, R>(&self, images: I, recognizer: &R) -> Vec<(K, Result<ExtractionResult>)>
    where
        I: IntoIterator<Item = (K, DynamicImage, Vec<Region>)>,
        R: Recognizer + ?Sized,
    {
        images
            .into_iter()
            .map(|(key, image, regions)| {
                let result = self.extract(&image, &regions, recognizer);
                (key, result)
            })
            .collect()
    }

    fn process_region<R>(
        &self,
        gray: &GrayImage,
        index: usize,
        region: &Region,
        recognizer: &R,
    ) -> RegionOutcome
    where
        R: Recognizer + ?Sized,
    {
        match self.read_region(gray, index, region, recognizer) {
            Ok(candidate) if candidate.valid => {
                debug!("Region {} ({}): {:?}", index, region.kind, candidate.value);
                RegionOutcome::accepted(index, candidate)
            }
            Ok(candidate) => {
                debug!(
                    "Region {} ({}): text {:?} failed validation",
                    index, region.kind, candidate.value
                );
                RegionOutcome {
                    index,
                    kind: region.kind,
                    error: Some(RegionError::ValidationFailed {
                        field: region.kind.key().to_string(),
                        text: candidate.value.clone(),
                    }),
                    candidate: Some(candidate),
                }
            }
            Err(e) => {
                debug!("Region {} ({}) skipped: {}", index, region.kind, e);
                RegionOutcome::failed(index, region.kind, e)
            }
        }
    }

    fn read_region<R>(
        &self,
        gray: &GrayImage,
        index: usize,
        region: &Region,
        recognizer: &R,
    ) -> std::result::Result<FieldCandidate, RegionError>
    where
        R: Recognizer + ?Sized,
    {
        if let Some(confidence) = region.confidence {
            if confidence < self.min_region_confidence {
                return Err(RegionError::LowConfidence {
                    confidence,
                    threshold: self.min_region_confidence,
                });
            }
        }

        let raster = self.rectifier.rectify_luma(gray, region, index)?;
        let text = recognizer.recognize(&raster)?;
        if text.trim().is_empty() {
            return Err(RegionError::NoTextRecognized);
        }

        Ok(self.validators.candidate(region.kind, &text))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
