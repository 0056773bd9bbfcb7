//! Field kinds and per-region candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four identity fields printed on the card.
///
/// The declaration order matches the detector's class ids and is the order
/// used when results are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Date of birth.
    #[serde(rename = "dob")]
    DateOfBirth,
    /// Father's (relative's) name.
    #[serde(rename = "father_name")]
    FatherName,
    /// Card holder's name.
    #[serde(rename = "name")]
    Name,
    /// Government ID number.
    #[serde(rename = "id_number", alias = "pan_number")]
    IdNumber,
}

impl FieldKind {
    /// All kinds in class-id order.
    pub const ALL: [FieldKind; 4] = [
        FieldKind::DateOfBirth,
        FieldKind::FatherName,
        FieldKind::Name,
        FieldKind::IdNumber,
    ];

    /// Map a detector class id to a field kind.
    pub fn from_class_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    /// Detector class id of this kind.
    pub fn class_id(self) -> usize {
        self as usize
    }

    /// Stable machine name, identical to the serialized key.
    pub fn key(self) -> &'static str {
        match self {
            FieldKind::DateOfBirth => "dob",
            FieldKind::FatherName => "father_name",
            FieldKind::Name => "name",
            FieldKind::IdNumber => "id_number",
        }
    }

    /// Human readable label, used as a column header in tabular exports.
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::DateOfBirth => "DOB",
            FieldKind::FatherName => "Father's Name",
            FieldKind::Name => "Name",
            FieldKind::IdNumber => "ID Number",
        }
    }

    /// Parse a kind from its key, accepting a few common spellings.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "dob" | "date_of_birth" | "birth_date" => Some(FieldKind::DateOfBirth),
            "father_name" | "fathers_name" | "relative_name" => Some(FieldKind::FatherName),
            "name" | "holder_name" => Some(FieldKind::Name),
            "id_number" | "pan_number" | "pan" | "id" => Some(FieldKind::IdNumber),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A field value derived from one region's recognized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidate {
    /// Field kind of the originating region.
    pub kind: FieldKind,
    /// Canonical value when valid, best-effort cleaned text otherwise.
    pub value: String,
    /// Whether the value passed the field validator.
    pub valid: bool,
}

impl FieldCandidate {
    /// A candidate that passed validation.
    pub fn valid(kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            valid: true,
        }
    }

    /// A raw attempt kept as weak fallback evidence.
    pub fn invalid(kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            valid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_id_mapping() {
        assert_eq!(FieldKind::from_class_id(0), Some(FieldKind::DateOfBirth));
        assert_eq!(FieldKind::from_class_id(1), Some(FieldKind::FatherName));
        assert_eq!(FieldKind::from_class_id(2), Some(FieldKind::Name));
        assert_eq!(FieldKind::from_class_id(3), Some(FieldKind::IdNumber));
        assert_eq!(FieldKind::from_class_id(4), None);
        assert_eq!(FieldKind::IdNumber.class_id(), 3);
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!(FieldKind::from_key("DOB"), Some(FieldKind::DateOfBirth));
        assert_eq!(FieldKind::from_key("father-name"), Some(FieldKind::FatherName));
        assert_eq!(FieldKind::from_key("pan_number"), Some(FieldKind::IdNumber));
        assert_eq!(FieldKind::from_key("address"), None);
    }

    #[test]
    fn test_serde_keys() {
        let json = serde_json::to_string(&FieldKind::IdNumber).unwrap();
        assert_eq!(json, "\"id_number\"");

        let kind: FieldKind = serde_json::from_str("\"pan_number\"").unwrap();
        assert_eq!(kind, FieldKind::IdNumber);
    }
}
