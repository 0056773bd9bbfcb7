//! Core library for identity card field extraction.
//!
//! This crate provides:
//! - Quadrilateral rectification of detected regions
//! - Field validation with OCR confusion correction (dates, ID numbers, names)
//! - Candidate aggregation into one record per image
//! - A configurable extraction pipeline with injected detector and recognizer

pub mod error;
pub mod fields;
pub mod models;
pub mod pipeline;
pub mod region;

pub use error::{CardexError, RegionError, Result};
pub use fields::{
    AggregationStrategy, CandidateAggregator, CandidatePool, DateStrategy, FieldValidator,
    FieldValidators,
};
pub use models::{
    CardexConfig, ExtractionReport, ExtractionResult, FieldCandidate, FieldKind, RegionOutcome,
    ReviewPolicy, Verdict,
};
pub use pipeline::{Detector, Extractor, ExtractorBuilder, Recognizer, extract};
pub use region::{Point, Quad, RectifiedRaster, Rectifier, RectifyMode, Region};
