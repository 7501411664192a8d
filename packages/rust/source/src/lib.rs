//! Remote collection access.
//!
//! This crate provides:
//! - [`CollectionSource`] — the paging primitive the materializer depends on
//! - [`fetch_all`] / [`RawCorpus`] — bulk, sequential collection sweeps
//! - [`ContentfulClient`] — delivery API implementation over `reqwest`

pub mod contentful;
pub mod fetcher;

pub use contentful::ContentfulClient;
pub use fetcher::{
    Collection, CollectionSource, PAGE_SIZE, Page, RawCorpus, fetch_all, fetch_all_chunked,
};
