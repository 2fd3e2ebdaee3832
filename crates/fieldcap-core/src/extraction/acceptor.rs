//! Candidate validation and the never-downgrade acceptance rule.

use serde::{Deserialize, Serialize};

use super::field::FieldSpec;

/// A candidate that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validated {
    /// The matched part of the candidate (the whole candidate if unconstrained).
    pub value: String,
    /// Pattern that produced the match; `None` for unconstrained fields.
    pub pattern_index: Option<usize>,
}

/// Validate a candidate against the field's patterns.
///
/// Unconstrained fields accept any non-empty candidate verbatim. Otherwise
/// every match of every pattern is considered and the longest wins; on equal
/// length the earlier pattern (and earlier match) is kept.
pub fn validate(field: &FieldSpec, candidate: &str) -> Option<Validated> {
    if candidate.is_empty() {
        return None;
    }

    if !field.has_patterns() {
        return Some(Validated {
            value: candidate.to_string(),
            pattern_index: None,
        });
    }

    let mut best: Option<(usize, &str, usize)> = None;

    for (index, pattern) in field.patterns.iter().enumerate() {
        let Some(regex) = pattern.regex() else {
            continue;
        };

        for found in regex.find_iter(candidate) {
            let len = found.as_str().chars().count();
            if len > best.map_or(0, |(best_len, _, _)| best_len) {
                best = Some((len, found.as_str(), index));
            }
        }
    }

    best.map(|(_, value, index)| Validated {
        value: value.to_string(),
        pattern_index: Some(index),
    })
}

/// Store a validated value if it improves on the field's current one.
///
/// An unset field takes any value; a set field only takes a strictly longer
/// one. Returns whether the value was stored.
pub fn accept(field: &mut FieldSpec, validated: Validated, keyword_index: Option<usize>) -> bool {
    if field.resolution.is_set()
        && validated.value.chars().count() <= field.resolution.value.chars().count()
    {
        return false;
    }

    field.resolution.value = validated.value;
    field.resolution.pattern_index = validated.pattern_index;
    if let Some(keyword) = keyword_index.and_then(|i| field.keywords.get(i)) {
        field.resolution.keyword = keyword.clone();
    }
    field.frame.selected = true;

    true
}
