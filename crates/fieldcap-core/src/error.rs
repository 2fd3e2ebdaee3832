//! Error types for the fieldcap-core library.

use thiserror::Error;

/// Main error type for the fieldcap library.
#[derive(Error, Debug)]
pub enum FieldcapError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a field configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field descriptor has an empty name.
    #[error("field #{0} has an empty name")]
    EmptyName(usize),

    /// Two field descriptors share the same name.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// The embedded dictionary string is not valid JSON.
    #[error("invalid dictionary: {0}")]
    Dictionary(String),

    /// The row tolerance is negative or not a number.
    #[error("invalid row tolerance: {0}")]
    RowTolerance(f32),
}

/// Errors related to a running extraction session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Another thread panicked while holding the session lock.
    #[error("session lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for the fieldcap library.
pub type Result<T> = std::result::Result<T, FieldcapError>;
