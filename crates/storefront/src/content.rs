//! Marketing content from the Contentful delivery API.
//!
//! Pages are fetched over Contentful's GraphQL endpoint and cached in the
//! shared cache store under a short TTL. A missing page is returned as `None`
//! and never cached, same as catalog point lookups.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cache::CacheStore;
use crate::config::ContentConfig;

const PAGE_TTL: Duration = Duration::from_secs(60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const MARKETING_PAGE_BY_SLUG: &str = r"
query MarketingPageBySlug($slug: String!) {
  marketingPageCollection(where: { slug: $slug }, limit: 1) {
    items {
      title
      slug
      heroHeadline
      heroSubhead
      body
      featuredQuery
    }
  }
}
";

/// Errors from the content API.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("content response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("content query error: {0}")]
    GraphQL(String),
}

/// A marketing page as authored in Contentful.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPage {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub hero_headline: Option<String>,
    #[serde(default)]
    pub hero_subhead: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Optional catalog query the page wants rendered alongside it.
    #[serde(default)]
    pub featured_query: Option<String>,
}

#[derive(Deserialize)]
struct GraphQLEnvelope {
    #[serde(default)]
    data: Option<MarketingPageData>,
    #[serde(default)]
    errors: Vec<GraphQLMessage>,
}

#[derive(Deserialize)]
struct GraphQLMessage {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketingPageData {
    marketing_page_collection: Option<PageCollection>,
}

#[derive(Deserialize)]
struct PageCollection {
    items: Vec<MarketingPage>,
}

/// Contentful GraphQL client with cached page reads.
pub struct ContentClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    store: Arc<dyn CacheStore>,
}

impl ContentClient {
    /// Build a client for the configured space.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ContentConfig, store: Arc<dyn CacheStore>) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "https://graphql.contentful.com/content/v1/spaces/{}/environments/{}",
                config.space_id, config.environment,
            ),
            access_token: config.access_token.expose_secret().to_string(),
            store,
        })
    }

    /// Fetch a marketing page by slug; `None` when no page exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the response is malformed.
    /// Cache failures are logged and absorbed.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn marketing_page_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<MarketingPage>, ContentError> {
        let cache_key = page_key(slug);

        match self.store.get(&cache_key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(page) => {
                    debug!("Cache hit for marketing page");
                    return Ok(Some(page));
                }
                Err(e) => warn!(key = %cache_key, error = %e, "Discarding undecodable cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %cache_key, error = %e, "Cache read failed, fetching upstream"),
        }

        let Some(page) = self.fetch_page(slug).await? else {
            return Ok(None);
        };

        match serde_json::to_value(&page) {
            Ok(json) => {
                if let Err(e) = self.store.set(&cache_key, json, Some(PAGE_TTL)).await {
                    warn!(key = %cache_key, error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(key = %cache_key, error = %e, "Failed to serialize cache entry"),
        }

        Ok(Some(page))
    }

    async fn fetch_page(&self, slug: &str) -> Result<Option<MarketingPage>, ContentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "query": MARKETING_PAGE_BY_SLUG,
                "variables": { "slug": slug },
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ContentError::Status { status, body });
        }

        let envelope: GraphQLEnvelope = serde_json::from_str(&body)?;
        if !envelope.errors.is_empty() {
            let messages: Vec<String> =
                envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(ContentError::GraphQL(messages.join("; ")));
        }

        Ok(envelope
            .data
            .and_then(|d| d.marketing_page_collection)
            .and_then(|c| c.items.into_iter().next()))
    }
}

fn page_key(slug: &str) -> String {
    format!("page:{}", urlencoding::encode(slug))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_deserializes_page() {
        let body = json!({
            "data": {
                "marketingPageCollection": {
                    "items": [{
                        "title": "About Us",
                        "slug": "about",
                        "heroHeadline": "Baked with love",
                        "heroSubhead": null,
                        "body": "Hello",
                        "featuredQuery": "tag:featured"
                    }]
                }
            }
        });

        let envelope: GraphQLEnvelope = serde_json::from_value(body).unwrap();
        let page = envelope
            .data
            .unwrap()
            .marketing_page_collection
            .unwrap()
            .items
            .into_iter()
            .next()
            .unwrap();

        assert_eq!(page.slug, "about");
        assert_eq!(page.hero_headline.as_deref(), Some("Baked with love"));
        assert!(page.hero_subhead.is_none());
    }

    #[test]
    fn test_envelope_collects_graphql_errors() {
        let body = json!({
            "data": null,
            "errors": [
                { "message": "Unknown field" },
                { "message": "Bad cursor" }
            ]
        });

        let envelope: GraphQLEnvelope = serde_json::from_value(body).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.len(), 2);
    }

    #[test]
    fn test_page_key_encodes_slug() {
        assert_eq!(page_key("about"), "page:about");
        assert_eq!(page_key("a b"), "page:a%20b");
    }
}
