//! Bulk collection fetcher: drains a paginated remote collection.
//!
//! All paging is sequential. The upstream API enforces one rate limit across
//! every call this process makes, so collections are never swept in parallel.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use contentgraph_shared::{ContentGraphError, ContentType, RawAsset, RawEntry, Result};

/// Page size used for every bulk sweep.
pub const PAGE_SIZE: usize = 500;

/// A remote collection that can be paged through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    ContentTypes,
    Entries,
    Assets,
}

impl Collection {
    /// Path segment used by the delivery API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentTypes => "content_types",
            Self::Entries => "entries",
            Self::Assets => "assets",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Size of the whole collection.
    pub total: usize,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// Paging primitive. Ordering must be stable across calls for one snapshot.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn fetch_page(&self, collection: Collection, limit: usize, offset: usize)
    -> Result<Page>;
}

/// Fetch every item of `collection` using [`PAGE_SIZE`] pages.
pub async fn fetch_all<T: DeserializeOwned>(
    source: &dyn CollectionSource,
    collection: Collection,
) -> Result<Vec<T>> {
    fetch_all_chunked(source, collection, PAGE_SIZE).await
}

/// Fetch every item of `collection` in pages of `chunk_size`.
///
/// Issues one `limit = 0` probe to learn the total, then
/// `ceil(total / chunk_size)` page requests. Any failed request aborts the
/// whole sweep.
#[instrument(skip(source), fields(collection = %collection))]
pub async fn fetch_all_chunked<T: DeserializeOwned>(
    source: &dyn CollectionSource,
    collection: Collection,
    chunk_size: usize,
) -> Result<Vec<T>> {
    if chunk_size == 0 {
        return Err(ContentGraphError::config("page size must be greater than zero"));
    }

    let total = source.fetch_page(collection, 0, 0).await?.total;
    debug!(total, chunk_size, "probed collection size");

    // The reported total is remote input; grow page by page instead of trusting it.
    let mut items: Vec<T> = Vec::with_capacity(total.min(chunk_size));
    let mut offset = 0;

    while offset < total {
        let page = source.fetch_page(collection, chunk_size, offset).await?;
        debug!(offset, received = page.items.len(), "fetched page");
        if page.items.is_empty() {
            break;
        }

        for raw in page.items {
            let item = serde_json::from_value(raw).map_err(|e| {
                ContentGraphError::parse(format!("malformed item in {collection}: {e}"))
            })?;
            items.push(item);
        }

        offset += chunk_size;
    }

    if items.len() != total {
        warn!(
            expected = total,
            received = items.len(),
            "collection size changed while paging"
        );
    }

    Ok(items)
}

// ---------------------------------------------------------------------------
// RawCorpus
// ---------------------------------------------------------------------------

/// Everything fetched from the backend for one run. Immutable once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCorpus {
    pub content_types: Vec<ContentType>,
    pub entries: Vec<RawEntry>,
    pub assets: Vec<RawAsset>,
}

impl RawCorpus {
    /// Fetch content types, entries and assets, one collection after another.
    #[instrument(skip_all)]
    pub async fn fetch(source: &dyn CollectionSource) -> Result<Self> {
        let content_types = fetch_all(source, Collection::ContentTypes).await?;
        let entries = fetch_all(source, Collection::Entries).await?;
        let assets = fetch_all(source, Collection::Assets).await?;

        let corpus = Self {
            content_types,
            entries,
            assets,
        };

        info!(
            content_types = corpus.content_types.len(),
            entries = corpus.entries.len(),
            assets = corpus.assets.len(),
            "fetched corpus"
        );

        Ok(corpus)
    }

    /// Write each collection as pretty JSON under `dir` for inspection.
    pub fn dump(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| ContentGraphError::io(dir, e))?;

        write_json(&dir.join("content_types.json"), &self.content_types)?;
        write_json(&dir.join("entries.json"), &self.entries)?;
        write_json(&dir.join("assets.json"), &self.assets)?;

        info!(dir = %dir.display(), "dumped raw corpus");
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ContentGraphError::parse(format!("failed to serialize {}: {e}", path.display())))?;
    std::fs::write(path, json).map_err(|e| ContentGraphError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::json;

    /// In-memory collection that records every request it serves.
    struct FakeSource {
        items: HashMap<Collection, Vec<serde_json::Value>>,
        requests: Mutex<Vec<(Collection, usize, usize)>>,
        fail_at_offset: Option<usize>,
        reported_total: Option<usize>,
    }

    impl FakeSource {
        fn with_entries(n: usize) -> Self {
            let entries = (0..n)
                .map(|i| json!({ "sys": { "id": format!("e{i}") }, "fields": {} }))
                .collect();
            let mut items = HashMap::new();
            items.insert(Collection::Entries, entries);
            Self {
                items,
                requests: Mutex::new(Vec::new()),
                fail_at_offset: None,
                reported_total: None,
            }
        }

        fn page_requests(&self) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, limit, _)| *limit > 0)
                .count()
        }
    }

    #[async_trait]
    impl CollectionSource for FakeSource {
        async fn fetch_page(
            &self,
            collection: Collection,
            limit: usize,
            offset: usize,
        ) -> Result<Page> {
            self.requests.lock().unwrap().push((collection, limit, offset));
            if limit > 0 && self.fail_at_offset == Some(offset) {
                return Err(ContentGraphError::Network("HTTP 429".into()));
            }
            let all = self.items.get(&collection).cloned().unwrap_or_default();
            let items = all.iter().skip(offset).take(limit).cloned().collect();
            Ok(Page {
                total: self.reported_total.unwrap_or(all.len()),
                items,
            })
        }
    }

    #[tokio::test]
    async fn pagination_is_complete_and_ordered() {
        for (total, chunk) in [(0, 3), (1, 3), (3, 3), (7, 3), (10, 1), (1001, 500)] {
            let source = FakeSource::with_entries(total);
            let entries: Vec<RawEntry> =
                fetch_all_chunked(&source, Collection::Entries, chunk).await.unwrap();

            assert_eq!(entries.len(), total);
            for (i, entry) in entries.iter().enumerate() {
                assert_eq!(entry.id(), format!("e{i}"));
            }
            assert_eq!(source.page_requests(), total.div_ceil(chunk));
        }
    }

    #[tokio::test]
    async fn probe_uses_zero_limit() {
        let source = FakeSource::with_entries(4);
        let _: Vec<RawEntry> = fetch_all(&source, Collection::Entries).await.unwrap();
        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0], (Collection::Entries, 0, 0));
        assert_eq!(requests[1], (Collection::Entries, PAGE_SIZE, 0));
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn page_failure_aborts_sweep() {
        let mut source = FakeSource::with_entries(9);
        source.fail_at_offset = Some(6);
        let result: Result<Vec<RawEntry>> =
            fetch_all_chunked(&source, Collection::Entries, 3).await;
        assert!(matches!(result, Err(ContentGraphError::Network(_))));
    }

    #[tokio::test]
    async fn inflated_total_stops_at_first_empty_page() {
        let mut source = FakeSource::with_entries(5);
        source.reported_total = Some(usize::MAX / 2);

        let entries: Vec<RawEntry> = fetch_all_chunked(&source, Collection::Entries, 3)
            .await
            .unwrap();

        assert_eq!(entries.len(), 5);
        // Two full pages, then one empty page ends the sweep.
        assert_eq!(source.page_requests(), 3);
    }

    #[tokio::test]
    async fn malformed_item_is_a_parse_error() {
        let mut source = FakeSource::with_entries(0);
        source
            .items
            .insert(Collection::Assets, vec![json!({ "fields": {} })]);
        let result: Result<Vec<RawAsset>> = fetch_all(&source, Collection::Assets).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("malformed item in assets"));
    }

    #[tokio::test]
    async fn corpus_fetches_collections_in_sequence() {
        let mut source = FakeSource::with_entries(2);
        source.items.insert(
            Collection::ContentTypes,
            vec![json!({ "sys": { "id": "post" }, "name": "Post" })],
        );
        source.items.insert(
            Collection::Assets,
            vec![json!({ "sys": { "id": "X" }, "fields": {} })],
        );

        let corpus = RawCorpus::fetch(&source).await.unwrap();
        assert_eq!(corpus.content_types.len(), 1);
        assert_eq!(corpus.entries.len(), 2);
        assert_eq!(corpus.assets.len(), 1);

        let order: Vec<Collection> = source
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _, _)| *c)
            .collect();
        let first_entry = order.iter().position(|c| *c == Collection::Entries).unwrap();
        let first_asset = order.iter().position(|c| *c == Collection::Assets).unwrap();
        let last_type = order.iter().rposition(|c| *c == Collection::ContentTypes).unwrap();
        let last_entry = order.iter().rposition(|c| *c == Collection::Entries).unwrap();
        assert!(last_type < first_entry);
        assert!(last_entry < first_asset);
    }

    #[test]
    fn dump_writes_one_file_per_collection() {
        let dir = std::env::temp_dir().join(format!("cg-dump-{}", std::process::id()));
        let corpus = RawCorpus::default();
        corpus.dump(&dir).unwrap();
        for name in ["content_types.json", "entries.json", "assets.json"] {
            let content = std::fs::read_to_string(dir.join(name)).unwrap();
            assert_eq!(content.trim(), "[]");
        }
        let _ = std::fs::remove_dir_all(&dir);
    }
}
