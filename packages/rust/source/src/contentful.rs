//! Delivery API client implementing [`CollectionSource`] over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use contentgraph_shared::{ContentGraphError, Result, SpaceConfig};

use crate::fetcher::{Collection, CollectionSource, Page};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("ContentGraph/", env!("CARGO_PKG_VERSION"));

/// Thin HTTP client for one space/environment.
pub struct ContentfulClient {
    client: Client,
    base: Url,
    access_token: String,
}

impl ContentfulClient {
    /// Create a client for the space described by `space`.
    pub fn new(space: &SpaceConfig, access_token: impl Into<String>) -> Result<Self> {
        if space.space_id.is_empty() {
            return Err(ContentGraphError::config("space.space_id is not set"));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ContentGraphError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        let base = format!(
            "{}/spaces/{}/environments/{}/",
            space.host.trim_end_matches('/'),
            space.space_id,
            space.environment
        );
        let base = Url::parse(&base)
            .map_err(|e| ContentGraphError::config(format!("invalid API host '{base}': {e}")))?;

        Ok(Self {
            client,
            base,
            access_token: access_token.into(),
        })
    }

    fn collection_url(&self, collection: Collection, limit: usize, offset: usize) -> Result<Url> {
        let mut url = self.base.join(collection.as_str()).map_err(|e| {
            ContentGraphError::config(format!("invalid collection URL for {collection}: {e}"))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &limit.to_string())
                .append_pair("skip", &offset.to_string());
            if collection != Collection::ContentTypes {
                query.append_pair("locale", "*");
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl CollectionSource for ContentfulClient {
    async fn fetch_page(
        &self,
        collection: Collection,
        limit: usize,
        offset: usize,
    ) -> Result<Page> {
        let url = self.collection_url(collection, limit, offset)?;
        debug!(%url, "requesting page");

        let response = self
            .client
            .get(url.as_str())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ContentGraphError::Network(format!("{collection}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentGraphError::Network(format!(
                "{collection} (limit={limit}, skip={offset}): HTTP {status}"
            )));
        }

        response.json::<Page>().await.map_err(|e| {
            ContentGraphError::Network(format!("{collection}: invalid page body: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::fetch_all_chunked;
    use contentgraph_shared::RawEntry;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn space(host: &str) -> SpaceConfig {
        SpaceConfig {
            space_id: "sp".into(),
            host: host.into(),
            ..SpaceConfig::default()
        }
    }

    #[test]
    fn requires_space_id() {
        let config = SpaceConfig::default();
        assert!(ContentfulClient::new(&config, "token").is_err());
    }

    #[test]
    fn builds_collection_urls() {
        let client = ContentfulClient::new(&space("https://cdn.example.com/"), "t").unwrap();

        let url = client.collection_url(Collection::Entries, 500, 1000).unwrap();
        assert_eq!(url.path(), "/spaces/sp/environments/master/entries");
        assert_eq!(url.query(), Some("limit=500&skip=1000&locale=*"));

        let url = client.collection_url(Collection::ContentTypes, 0, 0).unwrap();
        assert_eq!(url.path(), "/spaces/sp/environments/master/content_types");
        assert_eq!(url.query(), Some("limit=0&skip=0"));
    }

    #[tokio::test]
    async fn pages_through_mock_server() {
        let server = MockServer::start().await;
        let entries_path = "/spaces/sp/environments/master/entries";

        Mock::given(method("GET"))
            .and(path(entries_path))
            .and(query_param("limit", "0"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 3, "items": [] })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(entries_path))
            .and(query_param("limit", "2"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3,
                "items": [
                    { "sys": { "id": "a" }, "fields": {} },
                    { "sys": { "id": "b" }, "fields": {} }
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(entries_path))
            .and(query_param("limit", "2"))
            .and(query_param("skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3,
                "items": [{ "sys": { "id": "c" }, "fields": {} }]
            })))
            .mount(&server)
            .await;

        let client = ContentfulClient::new(&space(&server.uri()), "secret").unwrap();
        let entries: Vec<RawEntry> = fetch_all_chunked(&client, Collection::Entries, 2)
            .await
            .unwrap();

        let ids: Vec<&str> = entries.iter().map(RawEntry::id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn http_error_is_a_network_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = ContentfulClient::new(&space(&server.uri()), "secret").unwrap();
        let err = client
            .fetch_page(Collection::Assets, 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentGraphError::Network(_)));
        assert!(err.to_string().contains("429"));
    }
}
