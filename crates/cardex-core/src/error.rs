//! Error types for the cardex-core library.

use thiserror::Error;

/// Main error type for the cardex library.
///
/// Only failures that make a whole image unusable end up here. Problems with
/// a single region are reported as [`RegionError`] and absorbed by the
/// pipeline.
#[derive(Error, Debug)]
pub enum CardexError {
    /// The source image cannot produce any region.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The region detector failed.
    #[error("detection failed: {0}")]
    Detection(String),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors confined to a single region.
///
/// Each of these means "no valid candidate contributed" for the region's
/// field kind. None of them aborts the image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// Non-finite, collinear or coincident quad points.
    #[error("invalid region geometry: {0}")]
    InvalidGeometry(String),

    /// The region could not be cropped or resampled from the image.
    #[error("unreadable region: {0}")]
    UnreadableRegion(String),

    /// The region was dropped because its detection confidence is too low.
    #[error("region confidence {confidence:.3} below {threshold:.3}")]
    LowConfidence { confidence: f32, threshold: f32 },

    /// The recognizer returned an error.
    #[error("recognizer failed: {0}")]
    Recognizer(String),

    /// The recognizer produced no text.
    #[error("no text recognized")]
    NoTextRecognized,

    /// The recognized text does not satisfy the field grammar.
    #[error("validation failed for {field}: {text:?}")]
    ValidationFailed { field: String, text: String },
}

/// Result type for the cardex library.
pub type Result<T> = std::result::Result<T, CardexError>;
