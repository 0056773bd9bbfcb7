//! Extraction results.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::field::{FieldCandidate, FieldKind};
use crate::error::RegionError;

/// Outcome of aggregating all candidates of one field kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved value, empty when unresolved.
    pub value: String,
    /// False when the value is a fallback that never passed validation.
    pub verified: bool,
}

impl Resolution {
    /// A value backed by at least one valid candidate.
    pub fn verified(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            verified: true,
        }
    }

    /// A best-effort value surfaced without validation.
    pub fn unverified(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            verified: false,
        }
    }

    /// No value.
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Final per-image result.
///
/// Always holds all four field kinds; `missing` is exactly the set of kinds
/// whose value is empty. Fields are private so the invariant cannot be
/// broken after assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    values: BTreeMap<FieldKind, String>,
    missing: BTreeSet<FieldKind>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    unverified: BTreeSet<FieldKind>,
}

impl ExtractionResult {
    /// Assemble a result from per-kind resolutions.
    ///
    /// Kinds absent from `resolutions` are treated as unresolved. If a kind
    /// appears more than once the last resolution wins.
    pub fn assemble<I>(resolutions: I) -> Self
    where
        I: IntoIterator<Item = (FieldKind, Resolution)>,
    {
        let mut resolved: BTreeMap<FieldKind, Resolution> = FieldKind::ALL
            .iter()
            .map(|&kind| (kind, Resolution::unresolved()))
            .collect();
        resolved.extend(resolutions);

        let mut values = BTreeMap::new();
        let mut missing = BTreeSet::new();
        let mut unverified = BTreeSet::new();

        for (kind, resolution) in resolved {
            if resolution.is_empty() {
                missing.insert(kind);
            } else if !resolution.verified {
                unverified.insert(kind);
            }
            values.insert(kind, resolution.value);
        }

        Self {
            values,
            missing,
            unverified,
        }
    }

    /// Result for an image where nothing could be resolved.
    pub fn all_missing() -> Self {
        Self::assemble(std::iter::empty())
    }

    /// All four values, empty string where unresolved.
    pub fn values(&self) -> &BTreeMap<FieldKind, String> {
        &self.values
    }

    /// Value of one kind, empty string where unresolved.
    pub fn value(&self, kind: FieldKind) -> &str {
        self.values.get(&kind).map(String::as_str).unwrap_or("")
    }

    /// Kinds with an empty value.
    pub fn missing(&self) -> &BTreeSet<FieldKind> {
        &self.missing
    }

    /// Kinds whose value is a fallback that never passed validation.
    pub fn unverified(&self) -> &BTreeSet<FieldKind> {
        &self.unverified
    }

    /// Kinds that are missing or only resolved by fallback.
    pub fn unresolved(&self) -> BTreeSet<FieldKind> {
        self.missing.union(&self.unverified).copied().collect()
    }

    /// True when every kind has a verified value.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unverified.is_empty()
    }
}

/// What happened to one input region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutcome {
    /// Position of the region in detection order.
    pub index: usize,
    /// Field kind the region was tagged with.
    pub kind: FieldKind,
    /// Candidate contributed to the pool, valid or not.
    pub candidate: Option<FieldCandidate>,
    /// Why the region did not contribute a valid candidate.
    pub error: Option<RegionError>,
}

impl RegionOutcome {
    pub fn accepted(index: usize, candidate: FieldCandidate) -> Self {
        Self {
            index,
            kind: candidate.kind,
            candidate: Some(candidate),
            error: None,
        }
    }

    pub fn failed(index: usize, kind: FieldKind, error: RegionError) -> Self {
        Self {
            index,
            kind,
            candidate: None,
            error: Some(error),
        }
    }

    /// Whether this region contributed a valid candidate.
    pub fn is_valid(&self) -> bool {
        self.candidate.as_ref().is_some_and(|c| c.valid)
    }
}

/// Result plus per-region diagnostics.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub result: ExtractionResult,
    pub outcomes: Vec<RegionOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assemble_partial() {
        let result = ExtractionResult::assemble([
            (FieldKind::Name, Resolution::verified("Rahul Kumar")),
            (FieldKind::IdNumber, Resolution::verified("ABCDE1234F")),
        ]);

        assert_eq!(result.values().len(), 4);
        assert_eq!(result.value(FieldKind::Name), "Rahul Kumar");
        assert_eq!(result.value(FieldKind::DateOfBirth), "");
        assert_eq!(
            result.missing().iter().copied().collect::<Vec<_>>(),
            vec![FieldKind::DateOfBirth, FieldKind::FatherName]
        );
        assert!(!result.is_complete());
    }

    #[test]
    fn test_empty_verified_value_is_missing() {
        let result = ExtractionResult::assemble([(FieldKind::Name, Resolution::verified(""))]);
        assert!(result.missing().contains(&FieldKind::Name));
    }

    #[test]
    fn test_unverified_is_not_missing() {
        let result =
            ExtractionResult::assemble([(FieldKind::IdNumber, Resolution::unverified("ABCDE12X4F"))]);

        assert!(!result.missing().contains(&FieldKind::IdNumber));
        assert!(result.unverified().contains(&FieldKind::IdNumber));
        assert!(result.unresolved().contains(&FieldKind::IdNumber));
        assert_eq!(result.unresolved().len(), 4);
    }

    #[test]
    fn test_all_missing() {
        let result = ExtractionResult::all_missing();
        assert_eq!(result.missing().len(), 4);
        assert!(result.values().values().all(String::is_empty));
    }

    #[test]
    fn test_serialized_shape() {
        let result = ExtractionResult::assemble([(FieldKind::Name, Resolution::verified("Asha"))]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["values"]["name"], "Asha");
        assert_eq!(json["values"]["dob"], "");
        assert!(json.get("unverified").is_none());
        assert_eq!(json["missing"].as_array().unwrap().len(), 3);
    }
}
