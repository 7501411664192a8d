//! Materialization engine for ContentGraph.
//!
//! This crate turns a fetched corpus of untyped entries and assets into a
//! typed document graph:
//! - [`resolve_field`] / [`resolve_list_item`] — per-field value rules
//! - [`materialize_nested`] / [`materialize_inline`] — embedded objects
//! - [`materialize_document`] — one top-level document plus its hash
//! - [`assemble`] — fetch, partition, and materialize under a concurrency bound

pub mod assemble;
pub mod context;
pub mod document;
pub mod field;
pub mod hash;
pub mod list;
pub mod nested;

pub use assemble::{
    AssembleConfig, AssembleOutput, ProgressReporter, SilentProgress, assemble, materialize_corpus,
};
pub use context::{CorpusIndex, MaterializeContext, Renderers};
pub use document::materialize_document;
pub use field::{absolute_url, parse_date, resolve_field};
pub use hash::content_hash;
pub use list::{ListElement, resolve_list_item};
pub use nested::{
    INLINE_TYPE_NAME, MAX_NESTING_DEPTH, materialize_inline, materialize_nested, resolve_fields,
};
