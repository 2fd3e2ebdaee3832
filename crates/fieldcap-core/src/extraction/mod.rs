//! Keyword-anchored field extraction.
//!
//! A frame of text blocks flows through three stages:
//! - [`KeywordLocator`] finds where each field's label sits,
//! - [`ValueResolver`] searches inline, to the right of and below the label,
//! - [`acceptor`] validates candidates and keeps the longest valid value.
//!
//! [`ExtractionSession`] runs the stages per frame and owns the fields.

pub mod acceptor;
mod field;
pub mod locator;
pub mod patterns;
mod resolver;
mod session;

pub use acceptor::{accept, validate, Validated};
pub use field::{FieldPattern, FieldSpec, FrameMatch, Resolution};
pub use locator::{contains_keyword, keyword_index, KeywordLocator};
pub use patterns::postal_signatures;
pub use resolver::{text_after_keyword, Strategy, ValueResolver};
pub use session::{ExtractionSession, FieldOverlay, FieldSnapshot, FrameReport, SharedSession};
