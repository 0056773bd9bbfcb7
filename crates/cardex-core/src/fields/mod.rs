//! Field validation and candidate aggregation.

mod aggregate;
pub mod rules;

pub use aggregate::{AggregationStrategy, CandidateAggregator, CandidatePool};
pub use rules::{DateStrategy, DateValidator, FieldValidator, IdNumberValidator, NameValidator};

use chrono::{Datelike, Local};

use crate::models::config::ExtractionConfig;
use crate::models::{FieldCandidate, FieldKind};

/// The validator set, one per field kind.
pub struct FieldValidators {
    date: DateValidator,
    id_number: IdNumberValidator,
    name: NameValidator,
}

impl FieldValidators {
    /// Validators with default settings.
    pub fn new() -> Self {
        Self {
            date: DateValidator::new(),
            id_number: IdNumberValidator::new(),
            name: NameValidator::new(),
        }
    }

    /// Validators configured from the extraction section.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let (min_year, max_year) = config.year_range(Local::now().year());
        Self {
            date: DateValidator::new()
                .with_strategy(config.date_strategy)
                .with_year_range(min_year, max_year),
            id_number: IdNumberValidator::new(),
            name: NameValidator::new(),
        }
    }

    /// Replace the date validator.
    pub fn with_date_validator(mut self, date: DateValidator) -> Self {
        self.date = date;
        self
    }

    /// Validator responsible for `kind`.
    pub fn for_kind(&self, kind: FieldKind) -> &dyn FieldValidator {
        match kind {
            FieldKind::DateOfBirth => &self.date,
            FieldKind::IdNumber => &self.id_number,
            FieldKind::FatherName | FieldKind::Name => &self.name,
        }
    }

    /// Turn recognized text into a candidate.
    ///
    /// Text that fails validation becomes an invalid candidate holding the
    /// validator's raw attempt.
    pub fn candidate(&self, kind: FieldKind, text: &str) -> FieldCandidate {
        let validator = self.for_kind(kind);
        let value = validator.validate(text);
        if value.is_empty() {
            FieldCandidate::invalid(kind, validator.raw_attempt(text))
        } else {
            FieldCandidate::valid(kind, value)
        }
    }
}

impl Default for FieldValidators {
    fn default() -> Self {
        Self::new()
    }
}
