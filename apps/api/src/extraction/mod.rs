//! Document extraction — turns an uploaded resume into plain text.
//!
//! Dispatch is driven by the declared media type only. An unsupported type is
//! rejected before any byte of the upload is inspected.

pub mod docx;
pub mod pdf;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MEDIA_TYPE: &str = "text/plain";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format '{0}'. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from {format} document: {message}")]
    Failed {
        format: DocumentFormat,
        message: String,
    },

    #[error("The uploaded resume is empty. Please check your file and try again.")]
    EmptyDocument,
}

impl ExtractError {
    fn failed(format: DocumentFormat, message: impl Into<String>) -> Self {
        ExtractError::Failed {
            format,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Resolves a declared media type. Case-insensitive; parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn from_media_type(media_type: &str) -> Result<Self, ExtractError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PDF_MEDIA_TYPE => Ok(DocumentFormat::Pdf),
            DOCX_MEDIA_TYPE => Ok(DocumentFormat::Docx),
            TEXT_MEDIA_TYPE => Ok(DocumentFormat::Txt),
            _ => Err(ExtractError::UnsupportedFormat(media_type.to_string())),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Pdf => f.write_str("PDF"),
            DocumentFormat::Docx => f.write_str("DOCX"),
            DocumentFormat::Txt => f.write_str("TXT"),
        }
    }
}

/// Picks the media type to dispatch on. A declared type wins unless it is absent or
/// the generic `application/octet-stream`, in which case the file extension decides.
pub fn resolve_media_type(declared: Option<&str>, file_name: Option<&str>) -> Option<String> {
    let declared = declared
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("application/octet-stream"));
    if let Some(declared) = declared {
        return Some(declared.to_string());
    }

    let extension = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
    let inferred = match extension.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "docx" => DOCX_MEDIA_TYPE,
        "txt" => TEXT_MEDIA_TYPE,
        _ => return None,
    };
    Some(inferred.to_string())
}

/// An uploaded resume together with the text pulled out of it.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub source_format: DocumentFormat,
    pub raw_bytes: Bytes,
    pub extracted_text: String,
}

impl ResumeDocument {
    /// Extracts on the blocking pool: PDF and DOCX parsing are CPU-bound.
    pub async fn from_upload(raw_bytes: Bytes, media_type: &str) -> Result<Self, ExtractError> {
        let source_format = DocumentFormat::from_media_type(media_type)?;

        let bytes = raw_bytes.clone();
        let extracted_text = tokio::task::spawn_blocking(move || extract(&bytes, source_format))
            .await
            .map_err(|e| ExtractError::failed(source_format, format!("extraction task failed: {e}")))??;

        Ok(ResumeDocument {
            source_format,
            raw_bytes,
            extracted_text,
        })
    }

    /// The caller-side post-condition: whitespace-only text counts as empty.
    pub fn require_text(&self) -> Result<&str, ExtractError> {
        if self.extracted_text.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }
        Ok(&self.extracted_text)
    }
}

/// Synchronous extraction for an already resolved format.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Pdf => pdf::extract_text(bytes),
        DocumentFormat::Docx => docx::extract_text(bytes),
        DocumentFormat::Txt => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractError::failed(DocumentFormat::Txt, format!("invalid UTF-8: {e}"))),
    }
}
