//! PDF text extraction.

use super::DocumentExtractor;
use crate::error::ExtractionError;
use async_trait::async_trait;
use tracing::debug;

/// Extracts text with `pdf-extract` on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let owned = bytes.to_vec();
        debug!("Extracting text from {} byte PDF", owned.len());

        // pdf-extract can panic on malformed input; a panic surfaces as a JoinError
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|e| ExtractionError(format!("extraction task failed: {}", e)))?
            .map_err(|e| ExtractionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_garbage_is_extraction_error() {
        let result = PdfExtractor.extract_text(b"definitely not a pdf").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_buffer_is_extraction_error() {
        assert!(PdfExtractor.extract_text(&[]).await.is_err());
    }
}
