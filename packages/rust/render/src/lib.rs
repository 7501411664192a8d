//! Renderers for text-bearing fields.
//!
//! This crate provides:
//! - [`MarkdownRenderer`] with the comrak-backed [`ComrakRenderer`]
//! - [`RichTextBundler`] with the subprocess-backed [`BridgeBundler`]

pub mod markdown;
pub mod rich_text;

pub use markdown::{ComrakRenderer, MarkdownRenderer};
pub use rich_text::{BridgeBundler, DisabledBundler, RichTextBundler};
