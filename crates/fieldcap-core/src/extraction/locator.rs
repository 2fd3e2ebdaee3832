//! Keyword location over a frame's text units.

use regex::Regex;
use tracing::debug;

use super::field::FieldSpec;
use super::patterns::postal_signatures;
use crate::text::{Frame, UnitRef};

/// Keywords longer than this (in characters) match anywhere in a unit.
pub const TOKEN_BOUNDARY_MAX_LEN: usize = 10;

/// Check whether `text` contains `keyword` case-insensitively as a whole token.
///
/// Short keywords must not touch an alphanumeric character on either side, so
/// "to" does not match inside "total". Long keywords skip that check.
pub fn contains_keyword(keyword: &str, text: &str) -> bool {
    let key = keyword.to_lowercase();
    if key.is_empty() {
        return false;
    }
    let haystack = text.to_lowercase();

    if key.chars().count() > TOKEN_BOUNDARY_MAX_LEN {
        return haystack.contains(&key);
    }

    haystack.match_indices(&key).any(|(start, found)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + found.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Index of the first keyword contained in `text`.
pub fn keyword_index(keywords: &[String], text: &str) -> Option<usize> {
    keywords.iter().position(|key| contains_keyword(key, text))
}

/// Finds where each field's label sits in a frame.
#[derive(Debug, Clone, Default)]
pub struct KeywordLocator {
    postal: Option<&'static [Regex]>,
}

impl KeywordLocator {
    /// Create a locator without a postal-code fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a locator whose postal fallback uses the given locale.
    ///
    /// Unknown locales leave the fallback disabled.
    pub fn for_country(country: &str) -> Self {
        let postal = postal_signatures(country);
        if postal.is_none() && !country.is_empty() {
            debug!("No postal-code table for {:?}; fallback disabled", country);
        }
        Self { postal }
    }

    pub fn has_postal_fallback(&self) -> bool {
        self.postal.is_some()
    }

    /// Record the first keyword hit of every field in this frame.
    ///
    /// Units are scanned block by block in reading order. A unit is claimed
    /// by the first field (in configuration order) still without a hit whose
    /// keywords it contains. Address fields left without a hit then fall back
    /// to postal-code signatures.
    pub fn locate(&self, frame: &Frame, fields: &mut [FieldSpec]) {
        for (at, unit) in frame.units() {
            for field in fields.iter_mut() {
                if field.frame.has_hit() {
                    continue;
                }
                if let Some(index) = keyword_index(&field.keywords, &unit.value) {
                    debug!(
                        "Keyword {:?} for {} at block {} unit {}",
                        field.keywords[index], field.name, at.block, at.unit
                    );
                    field.frame.record_keyword(index, at);
                    break;
                }
            }
        }

        self.locate_postal(frame, fields);
    }

    fn locate_postal(&self, frame: &Frame, fields: &mut [FieldSpec]) {
        let Some(signatures) = self.postal else {
            return;
        };

        for field in fields.iter_mut() {
            if field.frame.has_hit() || !field.uses_postal_fallback() {
                continue;
            }
            if let Some(at) = find_postal_code(frame, signatures) {
                debug!(
                    "Postal code for {} at block {} unit {}",
                    field.name, at.block, at.unit
                );
                field.frame.record_block(at);
            }
        }
    }
}

/// First unit matching a signature; within a block, signature order wins
/// over unit order.
fn find_postal_code(frame: &Frame, signatures: &[Regex]) -> Option<UnitRef> {
    frame.blocks.iter().enumerate().find_map(|(b, block)| {
        signatures.iter().find_map(|signature| {
            block
                .components
                .iter()
                .position(|unit| signature.is_match(&unit.value))
                .map(|u| UnitRef::new(b, u))
        })
    })
}
