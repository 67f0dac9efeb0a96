//! Web page scraping through the Firecrawl API, with a TTL cache.

use super::ContentFetcher;
use crate::config::ScraperConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl ScrapeResponse {
    /// The markdown body, or else the first non-empty string field of `data`.
    fn into_text(self) -> Option<String> {
        let data = self.data?;
        if let Some(markdown) = data.get("markdown").and_then(Value::as_str) {
            return Some(markdown.to_string());
        }
        data.as_object()?
            .values()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Firecrawl `/v1/scrape` client requesting Markdown output.
pub struct FirecrawlFetcher {
    api_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl FirecrawlFetcher {
    pub fn new(api_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: api_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            http_client,
        })
    }

    pub fn from_config(config: &ScraperConfig, api_key: Option<String>) -> Result<Self, FetchError> {
        Self::new(
            &config.api_url,
            api_key,
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl ContentFetcher for FirecrawlFetcher {
    async fn fetch_content(&self, url: &str) -> Result<String, FetchError> {
        let endpoint = format!("{}/v1/scrape", self.api_url);
        let body = ScrapeRequest {
            url,
            formats: ["markdown"],
        };

        let mut request = self.http_client.post(&endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let scraped: ScrapeResponse = response.json().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: format!("invalid scrape response: {}", e),
        })?;

        if !scraped.success {
            return Err(FetchError::Unsuccessful {
                url: url.to_string(),
                message: scraped
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        scraped
            .into_text()
            .ok_or_else(|| FetchError::NoContent(url.to_string()))
    }
}

struct CacheEntry {
    text: String,
    cached_at: Instant,
}

/// Caches successful fetches by URL for a fixed time-to-live.
///
/// Entries are keyed only by URL, so a page that changes upstream is served
/// stale until its entry expires.
pub struct CachedFetcher<F> {
    inner: F,
    ttl: Duration,
    cache: DashMap<String, CacheEntry>,
}

impl<F: ContentFetcher> CachedFetcher<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: DashMap::new(),
        }
    }

    fn cached(&self, url: &str) -> Option<String> {
        let hit = self.cache.get(url).and_then(|entry| {
            (entry.cached_at.elapsed() < self.ttl && !entry.text.is_empty())
                .then(|| entry.text.clone())
        });
        if hit.is_none() {
            self.cache.remove(url);
        }
        hit
    }
}

#[async_trait]
impl<F: ContentFetcher> ContentFetcher for CachedFetcher<F> {
    async fn fetch_content(&self, url: &str) -> Result<String, FetchError> {
        if let Some(text) = self.cached(url) {
            info!("Cache hit for scraped URL: {}", url);
            return Ok(text);
        }

        debug!("Cache miss for scraped URL: {}, fetching...", url);
        let text = self.inner.fetch_content(url).await?;
        self.cache.insert(
            url.to_string(),
            CacheEntry {
                text: text.clone(),
                cached_at: Instant::now(),
            },
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::MapFetcher;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> FirecrawlFetcher {
        FirecrawlFetcher::new(&server.uri(), Some("fc-key".into()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .and(header("authorization", "Bearer fc-key"))
            .and(body_json(json!({"url": "https://hm.example/news", "formats": ["markdown"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"markdown": "# News\nNew store concept.", "metadata": {"title": "News"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = fetcher(&server).fetch_content("https://hm.example/news").await.unwrap();
        assert_eq!(text, "# News\nNew store concept.");
    }

    #[tokio::test]
    async fn test_scrape_falls_back_to_first_string_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"html": "", "rawText": "plain body"}
            })))
            .mount(&server)
            .await;

        let text = fetcher(&server).fetch_content("https://x.example").await.unwrap();
        assert_eq!(text, "plain body");
    }

    #[tokio::test]
    async fn test_scrape_unsuccessful() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "blocked by robots.txt"
            })))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_content("https://x.example").await.unwrap_err();
        assert!(err.to_string().contains("blocked by robots.txt"));
    }

    #[tokio::test]
    async fn test_scrape_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"metadata": {"statusCode": 200}}
            })))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_content("https://x.example").await.unwrap_err();
        assert!(matches!(err, FetchError::NoContent(_)));
    }

    #[tokio::test]
    async fn test_scrape_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("payment required"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_content("https://x.example").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 402, .. }));
    }

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let inner = MapFetcher::default().with_page("https://a.example", "page a");
        let cached = CachedFetcher::new(inner, Duration::from_secs(3600));

        assert_eq!(cached.fetch_content("https://a.example").await.unwrap(), "page a");
        assert_eq!(cached.fetch_content("https://a.example").await.unwrap(), "page a");
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let inner = MapFetcher::default().with_page("https://a.example", "page a");
        let cached = CachedFetcher::new(inner, Duration::ZERO);

        cached.fetch_content("https://a.example").await.unwrap();
        cached.fetch_content("https://a.example").await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cached = CachedFetcher::new(MapFetcher::default(), Duration::from_secs(3600));

        assert!(cached.fetch_content("https://missing.example").await.is_err());
        assert!(cached.fetch_content("https://missing.example").await.is_err());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }
}
