//! In-memory source doubles for tests.

use super::{ContentFetcher, DocumentExtractor};
use crate::error::{ExtractionError, FetchError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Treats the uploaded bytes as UTF-8 text; bytes starting with `%BAD`
/// fail extraction.
#[derive(Default)]
pub struct TextExtractor {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DocumentExtractor for TextExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if bytes.starts_with(b"%BAD") {
            return Err(ExtractionError("malformed document".to_string()));
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Serves pages from a fixed map; unknown URLs fail.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MapFetcher {
    pub fn with_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl ContentFetcher for MapFetcher {
    async fn fetch_content(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NoContent(url.to_string()))
    }
}
