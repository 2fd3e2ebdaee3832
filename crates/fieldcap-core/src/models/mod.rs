//! Data models and configuration.

pub mod config;

pub use config::{FieldDescriptor, FieldcapConfig, DEFAULT_PLACEHOLDER, PATTERN_DELIMITER};
