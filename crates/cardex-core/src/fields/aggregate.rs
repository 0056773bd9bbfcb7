//! Reduction of per-region candidates to one value per field kind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{ExtractionResult, FieldCandidate, FieldKind, Resolution};

/// How date and name candidates are reduced to one value.
///
/// ID numbers always use the most frequent valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Longest valid candidate; ties go to the first encountered.
    #[default]
    LongestValid,
    /// Most frequent valid candidate; ties go to the longer value, then the
    /// first encountered.
    MostFrequent,
}

/// Append-only candidate collection scoped to one image.
///
/// Candidates must be pushed in region order (detection order) so that
/// first-encountered tie breaks do not depend on worker scheduling.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<FieldCandidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: FieldCandidate) {
        self.candidates.push(candidate);
    }

    /// Candidates of one kind, in insertion order.
    pub fn of_kind(&self, kind: FieldKind) -> impl Iterator<Item = &FieldCandidate> {
        self.candidates.iter().filter(move |c| c.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl FromIterator<FieldCandidate> for CandidatePool {
    fn from_iter<I: IntoIterator<Item = FieldCandidate>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

/// Candidate aggregator.
#[derive(Debug, Clone)]
pub struct CandidateAggregator {
    strategy: AggregationStrategy,
    id_fallback: bool,
}

impl CandidateAggregator {
    pub fn new() -> Self {
        Self {
            strategy: AggregationStrategy::default(),
            id_fallback: false,
        }
    }

    /// Set the strategy for date and name fields.
    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Surface the first raw ID attempt, flagged unverified, when no ID
    /// candidate is valid.
    pub fn with_id_fallback(mut self, enabled: bool) -> Self {
        self.id_fallback = enabled;
        self
    }

    /// Resolve one field kind.
    pub fn resolve(&self, kind: FieldKind, pool: &CandidatePool) -> Resolution {
        let valid: Vec<&str> = pool
            .of_kind(kind)
            .filter(|c| c.valid && !c.value.is_empty())
            .map(|c| c.value.as_str())
            .collect();

        let chosen = match (kind, self.strategy) {
            (FieldKind::IdNumber, _) => most_frequent(&valid, false),
            (_, AggregationStrategy::LongestValid) => longest(&valid),
            (_, AggregationStrategy::MostFrequent) => most_frequent(&valid, true),
        };

        if let Some(value) = chosen {
            debug!(
                "Resolved {} from {} valid candidate(s): {:?}",
                kind,
                valid.len(),
                value
            );
            return Resolution::verified(value);
        }

        if kind == FieldKind::IdNumber && self.id_fallback {
            let raw = pool
                .of_kind(kind)
                .find(|c| !c.valid && !c.value.is_empty());
            if let Some(raw) = raw {
                warn!("No valid {} candidate, using raw attempt {:?}", kind, raw.value);
                return Resolution::unverified(raw.value.clone());
            }
        }

        Resolution::unresolved()
    }

    /// Resolve every field kind and assemble the result.
    pub fn aggregate(&self, pool: &CandidatePool) -> ExtractionResult {
        ExtractionResult::assemble(
            FieldKind::ALL
                .iter()
                .map(|&kind| (kind, self.resolve(kind, pool))),
        )
    }
}

impl Default for CandidateAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// First value of maximal character length.
fn longest<'a>(values: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    for &value in values {
        if best.is_none_or(|b| value.chars().count() > b.chars().count()) {
            best = Some(value);
        }
    }
    best
}

/// Mode of `values`. Ties go to the longer value when `prefer_longer`, then
/// to the value seen first.
fn most_frequent<'a>(values: &[&'a str], prefer_longer: bool) -> Option<&'a str> {
    // value -> (count, first index)
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, &value) in values.iter().enumerate() {
        tally.entry(value).or_insert((0, index)).0 += 1;
    }

    tally
        .into_iter()
        .max_by(|(a, (count_a, first_a)), (b, (count_b, first_b))| {
            let by_length = if prefer_longer {
                a.chars().count().cmp(&b.chars().count())
            } else {
                std::cmp::Ordering::Equal
            };
            count_a
                .cmp(count_b)
                .then(by_length)
                .then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pool(kind: FieldKind, values: &[(&str, bool)]) -> CandidatePool {
        values
            .iter()
            .map(|&(value, valid)| FieldCandidate {
                kind,
                value: value.to_string(),
                valid,
            })
            .collect()
    }

    #[test]
    fn test_id_mode() {
        let pool = pool(
            FieldKind::IdNumber,
            &[("ABCDE1234F", true), ("ABCDE1234F", true), ("XYZZZ0000Z", true)],
        );
        let resolution = CandidateAggregator::new().resolve(FieldKind::IdNumber, &pool);
        assert_eq!(resolution, Resolution::verified("ABCDE1234F"));
    }

    #[test]
    fn test_id_mode_tie_goes_to_first() {
        let pool = pool(
            FieldKind::IdNumber,
            &[("XYZZZ0000Z", true), ("ABCDE1234F", true)],
        );
        let resolution = CandidateAggregator::new().resolve(FieldKind::IdNumber, &pool);
        assert_eq!(resolution.value, "XYZZZ0000Z");
    }

    #[test]
    fn test_id_mode_is_order_independent() {
        let a = pool(
            FieldKind::IdNumber,
            &[("XYZZZ0000Z", true), ("ABCDE1234F", true), ("ABCDE1234F", true)],
        );
        let b = pool(
            FieldKind::IdNumber,
            &[("ABCDE1234F", true), ("XYZZZ0000Z", true), ("ABCDE1234F", true)],
        );
        let aggregator = CandidateAggregator::new();
        assert_eq!(
            aggregator.resolve(FieldKind::IdNumber, &a),
            aggregator.resolve(FieldKind::IdNumber, &b)
        );
    }

    #[test]
    fn test_id_fallback_is_flagged() {
        let pool = pool(FieldKind::IdNumber, &[("", false), ("ABCDE12K4F", false)]);

        let strict = CandidateAggregator::new();
        assert_eq!(strict.resolve(FieldKind::IdNumber, &pool), Resolution::unresolved());

        let lenient = CandidateAggregator::new().with_id_fallback(true);
        assert_eq!(
            lenient.resolve(FieldKind::IdNumber, &pool),
            Resolution::unverified("ABCDE12K4F")
        );
    }

    #[test]
    fn test_fallback_never_beats_valid() {
        let pool = pool(
            FieldKind::IdNumber,
            &[("JUNK", false), ("ABCDE1234F", true)],
        );
        let aggregator = CandidateAggregator::new().with_id_fallback(true);
        assert_eq!(
            aggregator.resolve(FieldKind::IdNumber, &pool),
            Resolution::verified("ABCDE1234F")
        );
    }

    #[test]
    fn test_longest_valid_name() {
        let pool = pool(
            FieldKind::Name,
            &[("Rahul", true), ("Rahul Kumar Sharma With Noise", false), ("Rahul Kumar", true)],
        );
        let resolution = CandidateAggregator::new().resolve(FieldKind::Name, &pool);
        assert_eq!(resolution, Resolution::verified("Rahul Kumar"));
    }

    #[test]
    fn test_invalid_only_is_missing() {
        let pool = pool(FieldKind::DateOfBirth, &[("12/13/1990", false)]);
        let aggregator = CandidateAggregator::new().with_id_fallback(true);
        assert!(aggregator.resolve(FieldKind::DateOfBirth, &pool).is_empty());
    }

    #[test]
    fn test_most_frequent_strategy() {
        let pool = pool(
            FieldKind::FatherName,
            &[("Suresh Kumar", true), ("Suresh", true), ("Suresh", true)],
        );

        let longest = CandidateAggregator::new();
        assert_eq!(longest.resolve(FieldKind::FatherName, &pool).value, "Suresh Kumar");

        let frequent = CandidateAggregator::new().with_strategy(AggregationStrategy::MostFrequent);
        assert_eq!(frequent.resolve(FieldKind::FatherName, &pool).value, "Suresh");
    }

    #[test]
    fn test_most_frequent_tie_prefers_longer() {
        let pool = pool(FieldKind::Name, &[("Asha", true), ("Asha Devi", true)]);
        let frequent = CandidateAggregator::new().with_strategy(AggregationStrategy::MostFrequent);
        assert_eq!(frequent.resolve(FieldKind::Name, &pool).value, "Asha Devi");
    }

    #[test]
    fn test_aggregate_reports_missing() {
        let mut pool = CandidatePool::new();
        pool.push(FieldCandidate::valid(FieldKind::Name, "Asha Devi"));
        pool.push(FieldCandidate::valid(FieldKind::IdNumber, "ABCDE1234F"));
        pool.push(FieldCandidate::invalid(FieldKind::DateOfBirth, "12 13 1990"));

        let result = CandidateAggregator::new().aggregate(&pool);
        assert_eq!(
            result.missing().iter().copied().collect::<Vec<_>>(),
            vec![FieldKind::DateOfBirth, FieldKind::FatherName]
        );
    }
}
