// Thesis document upload rules
//
// Decision: One accepted MIME type and one size ceiling, shared by the form
// state (UploadForm) and the server endpoint so both reject the same files.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// 5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// File the user picked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Why a file was rejected. The Display text is shown inline next to the form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("The selected file is empty")]
    Empty,

    #[error("Only {expected} files are accepted (got {actual})")]
    InvalidType { expected: String, actual: String },

    #[error("File is too large: {} (maximum {})", format_size(*size), format_size(*max))]
    TooLarge { size: u64, max: u64 },

    /// Upload stopped once it passed the limit; the full size is unknown
    #[error("File is too large (maximum {})", format_size(*max))]
    ExceedsLimit { max: u64 },

    #[error("No file was provided")]
    Missing,
}

/// Accepted MIME type and maximum size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub mime_type: String,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            mime_type: PDF_MIME_TYPE.to_string(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn validate(&self, file: &SelectedFile) -> Result<(), UploadError> {
        let actual = file
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if actual != self.mime_type {
            return Err(UploadError::InvalidType {
                expected: self.mime_type.clone(),
                actual: if actual.is_empty() {
                    "unknown type".to_string()
                } else {
                    actual
                },
            });
        }
        if file.size == 0 {
            return Err(UploadError::Empty);
        }
        if file.size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Upload form state: one selected file at most, plus the last validation message
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    policy: UploadPolicy,
    selected: Option<SelectedFile>,
    error: Option<UploadError>,
}

impl UploadForm {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            selected: None,
            error: None,
        }
    }

    /// Select a file. An invalid file leaves the selection unset and records
    /// the validation error; the user can pick another file.
    pub fn select(&mut self, file: SelectedFile) -> Result<(), UploadError> {
        match self.policy.validate(&file) {
            Ok(()) => {
                self.selected = Some(file);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(file = %file.name, size = file.size, "Rejected upload: {}", e);
                self.selected = None;
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    /// Inline message for the current validation error
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some()
    }

    /// Take the selection for submission, resetting the form
    pub fn take(&mut self) -> Option<SelectedFile> {
        self.error = None;
        self.selected.take()
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.error = None;
    }
}

/// Human-readable size in MiB/KiB/bytes
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
