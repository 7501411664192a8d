//! Error types for ContentGraph.
//!
//! Library crates use [`ContentGraphError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ContentGraph operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentGraphError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure while paging a remote collection.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed payload or schema file.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A link points at an entry that is not part of the fetched corpus.
    #[error("entry '{id}' not found in fetched corpus")]
    DanglingEntry { id: String },

    /// A link points at an asset that is not part of the fetched corpus.
    #[error("asset '{id}' not found in fetched corpus")]
    DanglingAsset { id: String },

    /// A type name or content type could not be matched to a definition.
    #[error("unknown {kind} '{name}'")]
    UnknownType { kind: &'static str, name: String },

    /// The markdown renderer rejected its input.
    #[error("markdown rendering failed: {0}")]
    Markdown(String),

    /// The rich-text bundler rejected its input.
    #[error("rich-text bundling failed: {0}")]
    RichText(String),

    /// A date field held something that is not a date.
    #[error("invalid date '{value}': {message}")]
    InvalidDate { value: String, message: String },

    /// A field kind this backend never produces reached the resolver.
    #[error("internal error: field kind '{kind}' is not supported by this backend")]
    UnsupportedFieldKind { kind: &'static str },

    /// A list item matched none of the known item shapes.
    #[error("unhandled list item shape: {payload}")]
    UnhandledListItem { payload: serde_json::Value },

    /// Nested links went deeper than the materializer allows (usually a cycle).
    #[error("nesting deeper than {max} levels at entry '{id}'")]
    NestingTooDeep { id: String, max: usize },

    /// A spawned materialization task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),

    /// Failure while resolving one field.
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        source: Box<ContentGraphError>,
    },

    /// Failure while materializing one document.
    #[error("document '{id}': {source}")]
    Document {
        id: String,
        source: Box<ContentGraphError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentGraphError>;

impl ContentGraphError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Tag this error with the field it came from.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Tag this error with the document it came from.
    pub fn in_document(self, id: impl Into<String>) -> Self {
        Self::Document {
            id: id.into(),
            source: Box::new(self),
        }
    }
}
