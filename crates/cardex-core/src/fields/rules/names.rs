//! Person name validation for the holder and father name fields.

use super::FieldValidator;

/// Name validator producing whitespace-collapsed title case.
pub struct NameValidator {
    min_len: usize,
}

impl NameValidator {
    pub fn new() -> Self {
        Self { min_len: 2 }
    }
}

impl Default for NameValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidator for NameValidator {
    fn validate(&self, text: &str) -> String {
        // A digit means the region holds something other than a name.
        if text.chars().any(|c| c.is_ascii_digit()) {
            return String::new();
        }

        let kept: String = text
            .chars()
            .filter(|&c| c.is_alphabetic() || c.is_whitespace() || c == '\'')
            .collect();
        let trimmed = kept.trim();

        // Lone "O"s are card border noise.
        if trimmed.chars().all(|c| c == 'O' || c == 'o') {
            return String::new();
        }
        if !trimmed.chars().any(char::is_alphabetic) {
            return String::new();
        }

        let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        let name = title_case(&collapsed);

        if name.chars().count() < self.min_len {
            return String::new();
        }
        name
    }
}

/// Uppercase the first letter of every letter run and lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
