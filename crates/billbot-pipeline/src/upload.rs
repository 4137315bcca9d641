//! Upload acceptance rules.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/heic",
];

/// A submitted bill document.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("(unnamed)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UploadLimits {
    /// Accept non-empty documents within the size limit whose MIME type is
    /// allowed. HEIC files are also accepted by extension, since browsers
    /// often send them without a type.
    pub fn validate(&self, upload: &Upload) -> Result<(), PipelineError> {
        if upload.bytes.is_empty() {
            return Err(PipelineError::InvalidUpload("No file uploaded".into()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(PipelineError::InvalidUpload(format!(
                "file is {} bytes, limit is {}",
                upload.bytes.len(),
                self.max_bytes
            )));
        }

        let mime = upload.mime.trim().to_ascii_lowercase();
        let type_ok = self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(&mime));
        let heic_name = upload
            .filename
            .as_deref()
            .is_some_and(|f| f.to_ascii_lowercase().ends_with(".heic"));
        if !type_ok && !heic_name {
            return Err(PipelineError::InvalidUpload(format!(
                "unsupported file type '{}'",
                upload.mime
            )));
        }
        Ok(())
    }
}

/// Validate against the default limits.
pub fn validate_upload(upload: &Upload) -> Result<(), PipelineError> {
    UploadLimits::default().validate(upload)
}
