//! Upstream text sources: uploaded documents and scraped web pages.
//!
//! The pipeline treats both as opaque collaborators behind small traits.

pub mod pdf;
pub mod scraper;

#[cfg(test)]
pub mod testing;

pub use pdf::PdfExtractor;
pub use scraper::{CachedFetcher, FirecrawlFetcher};

use crate::error::{ExtractionError, FetchError};
use async_trait::async_trait;

/// Turns an uploaded document into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Fetches the readable content of a web page.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_content(&self, url: &str) -> Result<String, FetchError>;
}
