//! Data models shared by the pipeline and its callers.

pub mod config;
pub mod field;
pub mod result;

pub use config::{CardexConfig, ReviewPolicy, Verdict};
pub use field::{FieldCandidate, FieldKind};
pub use result::{ExtractionReport, ExtractionResult, RegionOutcome, Resolution};
