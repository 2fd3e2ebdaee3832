//! Capture session: per-frame orchestration and the persisted field list.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::field::FieldSpec;
use super::locator::KeywordLocator;
use super::resolver::{Strategy, ValueResolver};
use crate::error::{Result, SessionError};
use crate::geometry::BoundingBox;
use crate::models::config::{DEFAULT_PLACEHOLDER, FieldcapConfig};
use crate::text::Frame;

/// What a renderer needs to highlight one field in the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOverlay {
    pub field: String,
    /// Box of the keyword unit, for unit-level hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_bbox: Option<BoundingBox>,
    /// Box of the unit proposed as the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_text: Option<String>,
    /// Strategy whose candidate validated this frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    /// A value was accepted this frame.
    pub selected: bool,
}

/// Result of one frame pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Overlays for every field that had a keyword hit, in field order.
    pub overlays: Vec<FieldOverlay>,
}

impl FrameReport {
    /// Fields whose value was accepted this frame.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.overlays
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.field.as_str())
    }
}

/// Caller-visible state of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_index: Option<usize>,
    /// A value was accepted in the most recent frame.
    pub selected: bool,
}

impl From<&FieldSpec> for FieldSnapshot {
    fn from(field: &FieldSpec) -> Self {
        let resolution = field.resolution();
        Self {
            name: field.name.clone(),
            mandatory: field.mandatory,
            value: field.resolved_value().map(str::to_string),
            keyword: (!resolution.keyword.is_empty()).then(|| resolution.keyword.clone()),
            pattern_index: resolution.pattern_index,
            selected: field.frame_match().selected,
        }
    }
}

/// Owns the fields of one capture and folds successive frames into them.
#[derive(Debug, Clone)]
pub struct ExtractionSession {
    fields: Vec<FieldSpec>,
    locator: KeywordLocator,
    resolver: ValueResolver,
    default_value: String,
    debug: bool,
    frames_processed: u64,
}

impl ExtractionSession {
    /// Create a session from a validated configuration.
    pub fn new(config: &FieldcapConfig) -> Result<Self> {
        config.validate()?;

        let fields = config.dictionary.iter().map(FieldSpec::from).collect();

        Ok(Self::from_fields(fields)
            .with_country(&config.country)
            .with_row_tolerance(config.row_tolerance)
            .with_default_value(config.default_value.clone())
            .with_debug(config.debug))
    }

    /// Create a session over prepared fields, without a postal fallback.
    pub fn from_fields(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            locator: KeywordLocator::new(),
            resolver: ValueResolver::new(),
            default_value: DEFAULT_PLACEHOLDER.to_string(),
            debug: false,
            frames_processed: 0,
        }
    }

    /// Select the postal-code table for address fields.
    pub fn with_country(mut self, country: &str) -> Self {
        self.locator = KeywordLocator::for_country(country);
        self
    }

    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.resolver = self.resolver.with_row_tolerance(tolerance);
        self
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Run one detection frame through locate, resolve and accept.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameReport {
        for field in &mut self.fields {
            field.reset_frame();
        }

        self.locator.locate(frame, &mut self.fields);

        let mut overlays = Vec::new();
        for field in &mut self.fields {
            if !field.frame_match().has_hit() {
                continue;
            }

            let strategy = self.resolver.resolve(frame, field);
            let hit = field.frame_match();
            let value_unit = hit.candidate_value.and_then(|at| frame.unit(at));

            overlays.push(FieldOverlay {
                field: field.name.clone(),
                keyword_bbox: hit.keyword_unit().and_then(|at| frame.unit(at)).map(|u| u.bbox),
                value_bbox: value_unit.map(|u| u.bbox),
                value_text: value_unit.map(|u| u.value.clone()),
                strategy,
                selected: hit.selected,
            });
        }

        self.frames_processed += 1;
        debug!(
            "Frame {}: {} blocks, {} units, {} hits, {} resolved",
            self.frames_processed,
            frame.blocks.len(),
            frame.unit_count(),
            overlays.len(),
            self.fields.iter().filter(|f| f.is_resolved()).count()
        );

        FrameReport { overlays }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    /// Current state of every field, in configuration order.
    pub fn snapshot(&self) -> Vec<FieldSnapshot> {
        self.fields.iter().map(FieldSnapshot::from).collect()
    }

    /// One `"name:value"` line per field, with debug suffixes when enabled.
    pub fn display_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.display_string(&self.default_value, self.debug))
            .collect()
    }

    /// Final `name -> value` mapping; unresolved fields get the placeholder.
    pub fn confirm(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.display_value(&self.default_value).to_string()))
            .collect()
    }

    /// Mandatory fields that have not resolved yet.
    pub fn missing_mandatory(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.mandatory && !f.is_resolved())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// All mandatory fields are resolved.
    pub fn is_complete(&self) -> bool {
        self.missing_mandatory().is_empty()
    }
}

/// A session shared between the detection thread and result readers.
///
/// Every frame pass and every read holds the same lock, so readers never see
/// a field halfway through an update.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<ExtractionSession>>,
}

impl SharedSession {
    pub fn new(session: ExtractionSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, ExtractionSession>, SessionError> {
        self.inner
            .lock()
            .map_err(|e| SessionError::Poisoned(e.to_string()))
    }

    /// Run a closure with exclusive access to the session.
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&mut ExtractionSession) -> R,
    ) -> std::result::Result<R, SessionError> {
        let mut session = self.lock()?;
        Ok(f(&mut session))
    }

    pub fn process_frame(&self, frame: &Frame) -> std::result::Result<FrameReport, SessionError> {
        self.with_session(|s| s.process_frame(frame))
    }

    pub fn snapshot(&self) -> std::result::Result<Vec<FieldSnapshot>, SessionError> {
        self.with_session(|s| s.snapshot())
    }

    pub fn confirm(&self) -> std::result::Result<BTreeMap<String, String>, SessionError> {
        self.with_session(|s| s.confirm())
    }

    pub fn missing_mandatory(&self) -> std::result::Result<Vec<String>, SessionError> {
        self.with_session(|s| {
            s.missing_mandatory()
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }
}

impl From<ExtractionSession> for SharedSession {
    fn from(session: ExtractionSession) -> Self {
        Self::new(session)
    }
}
