//! Shared types, error model, and configuration for ContentGraph.
//!
//! This crate is the foundation depended on by all other ContentGraph crates.
//! It provides:
//! - [`ContentGraphError`] — the unified error type
//! - Raw records ([`RawEntry`], [`RawAsset`], [`ContentType`]) and resolved
//!   output ([`Document`], [`NestedDocument`], [`CacheItem`], [`Cache`])
//! - Configuration ([`AppConfig`], [`AssembleOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AssembleOptions, DebugConfig, MarkdownConfig, MaterializeConfig, RichTextConfig,
    SchemaOverridesConfig, SpaceConfig, access_token, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{ContentGraphError, Result};
pub use types::{
    Cache, CacheItem, ContentType, Diagnostic, Document, Link, LinkTarget, LocalizedValue,
    NestedDocument, RawAsset, RawEntry, Sys,
};
