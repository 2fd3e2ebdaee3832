//! Field specifications and their resolution state.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::config::FieldDescriptor;
use crate::text::UnitRef;

/// A validation pattern compiled case-insensitively.
///
/// A pattern that fails to compile keeps its slot (and index) but never
/// matches.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    source: String,
    regex: Option<Regex>,
}

impl FieldPattern {
    pub fn compile(source: impl Into<String>) -> Self {
        let source = source.into();
        let regex = match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Ignoring invalid pattern {:?}: {}", source, e);
                None
            }
        };
        Self { source, regex }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }
}

/// Best answer found so far, kept across frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Keyword the value was found next to; empty if unset.
    pub keyword: String,
    /// Resolved value; empty if unset.
    pub value: String,
    /// Index of the pattern that validated the value.
    pub pattern_index: Option<usize>,
}

impl Resolution {
    pub fn is_set(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Per-frame search state; reset at the start of every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMatch {
    /// Index into the field's keywords of the keyword that hit.
    pub keyword_index: Option<usize>,
    /// Block holding the hit.
    pub keyword_block: Option<usize>,
    /// Unit inside `keyword_block`; `None` for block-level (postal) hits.
    pub index_in_keyword_block: Option<usize>,
    /// Unit proposed as the value this frame.
    pub candidate_value: Option<UnitRef>,
    /// A value was accepted this frame.
    pub selected: bool,
}

impl FrameMatch {
    pub fn has_hit(&self) -> bool {
        self.keyword_block.is_some()
    }

    /// The unit the keyword was found in, for unit-level hits.
    pub fn keyword_unit(&self) -> Option<UnitRef> {
        match (self.keyword_block, self.index_in_keyword_block) {
            (Some(block), Some(unit)) => Some(UnitRef::new(block, unit)),
            _ => None,
        }
    }

    pub(crate) fn record_keyword(&mut self, keyword_index: usize, at: UnitRef) {
        self.keyword_index = Some(keyword_index);
        self.keyword_block = Some(at.block);
        self.index_in_keyword_block = Some(at.unit);
    }

    /// Record a block-level hit whose evidence is the unit itself.
    pub(crate) fn record_block(&mut self, evidence: UnitRef) {
        self.keyword_block = Some(evidence.block);
        self.candidate_value = Some(evidence);
    }
}

/// A field to extract: static configuration plus resolution state.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub mandatory: bool,
    pub keywords: Vec<String>,
    pub patterns: Vec<FieldPattern>,
    pub(crate) resolution: Resolution,
    pub(crate) frame: FrameMatch,
}

impl FieldSpec {
    pub fn new<K, P>(name: impl Into<String>, mandatory: bool, keywords: K, patterns: P) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            name: name.into(),
            mandatory,
            keywords: keywords.into_iter().map(Into::into).collect(),
            patterns: patterns.into_iter().map(FieldPattern::compile).collect(),
            resolution: Resolution::default(),
            frame: FrameMatch::default(),
        }
    }

    pub fn from_descriptor(descriptor: &FieldDescriptor) -> Self {
        Self::new(
            descriptor.name.clone(),
            descriptor.mandatory,
            descriptor.keyword_list(),
            descriptor.pattern_list(),
        )
    }

    pub fn has_patterns(&self) -> bool {
        !self.patterns.is_empty()
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn frame_match(&self) -> &FrameMatch {
        &self.frame
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_set()
    }

    pub fn resolved_value(&self) -> Option<&str> {
        self.is_resolved().then_some(self.resolution.value.as_str())
    }

    /// Value for display, or `placeholder` if unresolved.
    pub fn display_value<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.resolved_value().unwrap_or(placeholder)
    }

    /// `"name:value"`, plus `"/keyword/pattern#"` in debug mode.
    pub fn display_string(&self, placeholder: &str, debug: bool) -> String {
        let mut result = format!("{}:{}", self.name, self.display_value(placeholder));
        if debug {
            let pattern_number = self.resolution.pattern_index.map_or(0, |i| i + 1);
            result.push_str(&format!("/{}/{}", self.resolution.keyword, pattern_number));
        }
        result
    }

    /// Fields located by postal code when no keyword is found.
    pub fn uses_postal_fallback(&self) -> bool {
        self.name.to_lowercase().contains("service address") && self.resolution.keyword.is_empty()
    }

    /// Fields whose value is assembled from the address lines above a postal code.
    pub fn assembles_address(&self) -> bool {
        self.name.eq_ignore_ascii_case("service address") && self.resolution.keyword.is_empty()
    }

    pub(crate) fn reset_frame(&mut self) {
        self.frame = FrameMatch::default();
    }
}

impl From<&FieldDescriptor> for FieldSpec {
    fn from(descriptor: &FieldDescriptor) -> Self {
        Self::from_descriptor(descriptor)
    }
}
