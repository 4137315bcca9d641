//! OCR boundary: turns an uploaded bill image or PDF into raw text.
//!
//! The pipeline only sees the [`OcrEngine`] trait. [`StaticTextOcr`] serves
//! fixed text (tests, demos, pre-extracted bills); the `http` feature adds
//! [`HttpOcrClient`] for a remote OCR service.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpOcrClient;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("no readable text in document")]
    Unreadable,
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[cfg(feature = "http")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `image`. `mime` is the upload's declared type.
    async fn recognize(&self, image: &[u8], mime: &str) -> Result<String, OcrError>;
}

/// Reject blank OCR output.
pub fn require_text(text: String) -> Result<String, OcrError> {
    if text.trim().is_empty() {
        Err(OcrError::Unreadable)
    } else {
        Ok(text)
    }
}

/// Returns the same text for every document.
#[derive(Debug, Clone, Default)]
pub struct StaticTextOcr {
    text: String,
    delay: Option<Duration>,
}

impl StaticTextOcr {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delay: None,
        }
    }

    /// Sleep before answering, to simulate a slow engine.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl OcrEngine for StaticTextOcr {
    async fn recognize(&self, image: &[u8], mime: &str) -> Result<String, OcrError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tracing::debug!(bytes = image.len(), mime, "static OCR");
        require_text(self.text.clone())
    }
}

/// Always fails; stands in when no OCR backend is configured.
#[derive(Debug, Clone, Default)]
pub struct UnavailableOcr;

#[async_trait]
impl OcrEngine for UnavailableOcr {
    async fn recognize(&self, _image: &[u8], _mime: &str) -> Result<String, OcrError> {
        Err(OcrError::Unavailable("no OCR backend configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_text_is_returned() {
        let ocr = StaticTextOcr::new("Facility Fee $847.00");
        let text = ocr.recognize(b"png", "image/png").await.unwrap();
        assert_eq!(text, "Facility Fee $847.00");
    }

    #[tokio::test]
    async fn blank_text_is_unreadable() {
        let ocr = StaticTextOcr::new("  \n ");
        let err = ocr.recognize(b"png", "image/png").await.unwrap_err();
        assert!(matches!(err, OcrError::Unreadable));
    }

    #[tokio::test]
    async fn unavailable_engine_errors() {
        let err = UnavailableOcr.recognize(b"", "image/png").await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }

    #[tokio::test]
    async fn delay_is_applied() {
        let ocr = StaticTextOcr::new("x").with_delay(Duration::from_millis(50));
        let start = tokio::time::Instant::now();
        ocr.recognize(b"", "image/png").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
