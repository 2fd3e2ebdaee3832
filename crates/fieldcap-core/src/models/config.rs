//! Configuration structures for a capture session.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, Result};
use crate::geometry::DEFAULT_ROW_TOLERANCE;

/// Separator between patterns in [`FieldDescriptor::patterns`].
pub const PATTERN_DELIMITER: &str = "&&";

/// Placeholder reported for fields that never resolved.
pub const DEFAULT_PLACEHOLDER: &str = "---";

/// Main configuration for a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldcapConfig {
    /// Locale selecting the postal-code signature table (e.g. "Australia").
    pub country: String,

    /// Append resolved keyword and pattern number to display strings.
    pub debug: bool,

    /// Value reported for unresolved fields on confirmation.
    pub default_value: String,

    /// Vertical tolerance in pixels for "same row" comparisons.
    pub row_tolerance: f32,

    /// Ordered field descriptors.
    ///
    /// Accepts either a JSON array or a JSON-encoded string holding one, which
    /// is how host bridges usually pass it through.
    #[serde(deserialize_with = "dictionary_from_list_or_string")]
    pub dictionary: Vec<FieldDescriptor>,
}

impl Default for FieldcapConfig {
    fn default() -> Self {
        Self {
            country: String::new(),
            debug: false,
            default_value: DEFAULT_PLACEHOLDER.to_string(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            dictionary: Vec::new(),
        }
    }
}

/// Static description of one field to extract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    /// Field name, also the key in the confirmed result.
    #[serde(rename = "Name", alias = "name")]
    pub name: String,

    /// Whether the caller requires this field before confirming.
    #[serde(rename = "Mandatory", alias = "mandatory")]
    pub mandatory: bool,

    /// Keyword synonyms, tried in order.
    #[serde(rename = "Keywords", alias = "keywords")]
    pub keywords: Vec<String>,

    /// Validation patterns joined with `&&`; empty means unconstrained.
    #[serde(rename = "Patterns", alias = "patterns")]
    pub patterns: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_patterns(mut self, patterns: impl Into<String>) -> Self {
        self.patterns = patterns.into();
        self
    }

    /// Non-blank keywords, in configured order.
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Patterns split on `&&`, blank segments dropped.
    pub fn pattern_list(&self) -> Vec<String> {
        self.patterns
            .split(PATTERN_DELIMITER)
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DictionaryRepr {
    List(Vec<FieldDescriptor>),
    Encoded(String),
}

fn dictionary_from_list_or_string<'de, D>(deserializer: D) -> std::result::Result<Vec<FieldDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    match DictionaryRepr::deserialize(deserializer)? {
        DictionaryRepr::List(list) => Ok(list),
        DictionaryRepr::Encoded(s) if s.trim().is_empty() => Ok(Vec::new()),
        DictionaryRepr::Encoded(s) => serde_json::from_str(&s).map_err(|e| {
            serde::de::Error::custom(ConfigError::Dictionary(e.to_string()))
        }),
    }
}

impl FieldcapConfig {
    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject entries that cannot form a usable session.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.row_tolerance.is_finite() || self.row_tolerance < 0.0 {
            return Err(ConfigError::RowTolerance(self.row_tolerance));
        }

        let mut seen = HashSet::new();
        for (i, field) in self.dictionary.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(i));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField(field.name.clone()));
            }
        }

        Ok(())
    }
}
