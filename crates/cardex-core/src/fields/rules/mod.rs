//! Rule-based validators for identity card fields.

pub mod confusion;
pub mod dates;
pub mod id_number;
pub mod names;
pub mod patterns;

pub use confusion::{SlotType, correct};
pub use dates::{DateStrategy, DateValidator};
pub use id_number::{ID_GRAMMAR, IdNumberValidator, clean_id, matches_grammar};
pub use names::NameValidator;

/// Trait for field validators.
///
/// Validators are pure and total: any input, however noisy, yields either a
/// canonical value or an empty string.
pub trait FieldValidator: Send + Sync {
    /// Validate recognized text, returning the canonical value or `""`.
    fn validate(&self, text: &str) -> String;

    /// Cleaned text kept as weak evidence when validation fails.
    fn raw_attempt(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
