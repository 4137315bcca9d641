use std::time::Duration;

use billbot_core::CoreError;
use billbot_ocr::OcrError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("OCR failed: {0}")]
    OcrFailure(#[from] OcrError),

    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Config, reference table and template load failures are server-side.
impl From<CoreError> for PipelineError {
    fn from(e: CoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Error body returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub details: String,
}

impl PipelineError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUpload(_) => 400,
            Self::OcrFailure(_) | Self::Timeout(_) => 422,
            Self::Internal(_) => 500,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        let (error, details) = match self {
            Self::InvalidUpload(msg) => ("Invalid upload", msg.clone()),
            Self::OcrFailure(e) => ("Could not read bill", e.to_string()),
            Self::Timeout(_) => ("Could not read bill", self.to_string()),
            Self::Internal(msg) => ("Failed to process bill", msg.clone()),
        };
        ErrorPayload {
            error: error.to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(PipelineError::InvalidUpload("x".into()).status_code(), 400);
        assert_eq!(PipelineError::OcrFailure(OcrError::Unreadable).status_code(), 422);
        assert_eq!(PipelineError::Timeout(Duration::from_secs(30)).status_code(), 422);
        assert_eq!(PipelineError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn core_errors_are_internal() {
        let err: PipelineError = CoreError::InvalidReference("table has no entries".into()).into();
        assert_eq!(err.status_code(), 500);
        let p = err.payload();
        assert_eq!(p.error, "Failed to process bill");
        assert_eq!(p.details, "invalid reference table: table has no entries");
    }

    #[test]
    fn payload_shape() {
        let p = PipelineError::OcrFailure(OcrError::Unreadable).payload();
        assert_eq!(p.error, "Could not read bill");
        assert_eq!(p.details, "no readable text in document");
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("error").is_some() && json.get("details").is_some());
    }
}
