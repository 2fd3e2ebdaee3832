//! Core library for extracting field values from OCR text fragments.
//!
//! This crate provides:
//! - Geometry and text models for detector output (boxes, units, blocks, frames)
//! - Keyword location with whole-token matching and a postal-code fallback
//! - Spatial value search (inline, right of, below a keyword)
//! - Regex validation with longest-match acceptance that persists across frames

pub mod error;
pub mod extraction;
pub mod geometry;
pub mod models;
pub mod text;

pub use error::{ConfigError, FieldcapError, Result, SessionError};
pub use extraction::{
    ExtractionSession, FieldOverlay, FieldSnapshot, FieldSpec, FrameReport, KeywordLocator,
    SharedSession, Strategy, ValueResolver,
};
pub use geometry::{BoundingBox, DEFAULT_ROW_TOLERANCE};
pub use models::config::{FieldDescriptor, FieldcapConfig};
pub use text::{Frame, TextBlock, TextUnit, UnitRef};
