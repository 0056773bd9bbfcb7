//! Government ID number validation.
//!
//! The number is a fixed-format code of five letters, four digits and a
//! final letter (`ABCDE1234F`). There is no checksum; format conformance is
//! the only acceptance criterion.

use super::FieldValidator;
use super::confusion::{SlotType, correct};

use SlotType::{Digit, Letter};

/// Expected character type for each position of the code.
pub const ID_GRAMMAR: [SlotType; 10] = [
    Letter, Letter, Letter, Letter, Letter, Digit, Digit, Digit, Digit, Letter,
];

/// ID number validator with slot-aware OCR correction.
pub struct IdNumberValidator {
    correct_confusions: bool,
}

impl IdNumberValidator {
    pub fn new() -> Self {
        Self {
            correct_confusions: true,
        }
    }

    /// Set whether look-alike characters are corrected.
    pub fn with_correction(mut self, correct_confusions: bool) -> Self {
        self.correct_confusions = correct_confusions;
        self
    }
}

impl Default for IdNumberValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidator for IdNumberValidator {
    fn validate(&self, text: &str) -> String {
        let cleaned = clean_id(text);
        if cleaned.chars().count() != ID_GRAMMAR.len() {
            return String::new();
        }

        let corrected: String = if self.correct_confusions {
            cleaned
                .chars()
                .zip(ID_GRAMMAR)
                .map(|(c, slot)| correct(c, slot))
                .collect()
        } else {
            cleaned
        };

        if matches_grammar(&corrected) {
            corrected
        } else {
            String::new()
        }
    }

    fn raw_attempt(&self, text: &str) -> String {
        clean_id(text)
    }
}

/// Keep ASCII letters and digits, uppercased.
pub fn clean_id(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether `value` is exactly a well-formed ID number.
pub fn matches_grammar(value: &str) -> bool {
    value.chars().count() == ID_GRAMMAR.len()
        && value
            .chars()
            .zip(ID_GRAMMAR)
            .all(|(c, slot)| slot.accepts(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_input_is_unchanged() {
        let v = IdNumberValidator::new();
        for id in ["ABCDE1234F", "OOOOO0000O", "BZSAI8521D", "ZZZZZ9999Z", "QWERT5678Y"] {
            assert_eq!(v.validate(id), id);
        }
    }

    #[test]
    fn test_noise_and_case() {
        let v = IdNumberValidator::new();
        assert_eq!(v.validate("abcde 1234 f"), "ABCDE1234F");
        assert_eq!(v.validate("  ABCDE-1234-F\n"), "ABCDE1234F");
    }

    #[test]
    fn test_slot_corrections() {
        let v = IdNumberValidator::new();
        // Digits in letter slots.
        assert_eq!(v.validate("A8CDE1234F"), "ABCDE1234F");
        assert_eq!(v.validate("ABCDE12345"), "ABCDE1234S");
        // Letters in digit slots.
        assert_eq!(v.validate("ABCDEI2O4F"), "ABCDE1204F");
        assert_eq!(v.validate("ABCDED2Z4F"), "ABCDE0224F");
    }

    #[test]
    fn test_uncorrectable_rejected() {
        let v = IdNumberValidator::new();
        assert_eq!(v.validate("ABCDE12K4F"), "");
        assert_eq!(v.validate("ABC7E1234F"), "");
        assert_eq!(v.validate("ABCDE1234F9"), "");
        assert_eq!(v.validate("ABCDE123F"), "");
        assert_eq!(v.validate(""), "");
    }

    #[test]
    fn test_without_correction() {
        let v = IdNumberValidator::new().with_correction(false);
        assert_eq!(v.validate("A8CDE1234F"), "");
        assert_eq!(v.validate("abcde1234f"), "ABCDE1234F");
    }

    #[test]
    fn test_raw_attempt() {
        let v = IdNumberValidator::new();
        assert_eq!(v.raw_attempt("ab-cd 12x"), "ABCD12X");
    }

    #[test]
    fn test_grammar() {
        assert!(matches_grammar("ABCDE1234F"));
        assert!(!matches_grammar("ABCDE1234"));
        assert!(!matches_grammar("abcde1234f"));
        assert!(!matches_grammar("ÄBCDE1234F"));
    }
}
