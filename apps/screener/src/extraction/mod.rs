//! Résumé text extraction.
//!
//! A download is classified into a `ResumeFormat` from its declared content type
//! (URL extension only as a fallback), then handed to the extractor registered for
//! that capability. Unknown formats are rejected with a typed error; the pipeline
//! records the failure and moves on to the next candidate.

pub mod formats;
pub mod reader;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::extraction::formats::{DocxExtractor, PdfExtractor};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Download returned status {0}")]
    Status(u16),

    #[error("Résumé is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unsupported résumé format: {0}")]
    Unsupported(String),

    #[error("Could not read {format} document: {message}")]
    Corrupt {
        format: ResumeFormat,
        message: String,
    },

    #[error("No text could be extracted from the {0} document")]
    Empty(ResumeFormat),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResumeFormat {
    Pdf,
    Docx,
    Unsupported(String),
}

impl std::fmt::Display for ResumeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumeFormat::Pdf => write!(f, "PDF"),
            ResumeFormat::Docx => write!(f, "DOCX"),
            ResumeFormat::Unsupported(kind) => write!(f, "{kind}"),
        }
    }
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl ResumeFormat {
    /// Maps a `Content-Type` header value. Returns `None` for generic binary
    /// types that say nothing about the document.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "" | "application/octet-stream" | "binary/octet-stream" => None,
            "application/pdf" | "application/x-pdf" => Some(ResumeFormat::Pdf),
            DOCX_MIME => Some(ResumeFormat::Docx),
            other => Some(ResumeFormat::Unsupported(other.to_string())),
        }
    }

    /// Fallback classification from the URL path extension.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        match file.rsplit_once('.') {
            Some((_, ext)) => match ext.to_ascii_lowercase().as_str() {
                "pdf" => ResumeFormat::Pdf,
                "docx" => ResumeFormat::Docx,
                other => ResumeFormat::Unsupported(format!(".{other}")),
            },
            None => ResumeFormat::Unsupported("no file extension".to_string()),
        }
    }

    /// Declared content type wins; the URL is consulted only when the header is
    /// missing or generic.
    pub fn detect(content_type: Option<&str>, url: &str) -> Self {
        content_type
            .and_then(Self::from_content_type)
            .unwrap_or_else(|| Self::from_url(url))
    }
}

/// One document capability.
pub trait TextExtractor: Send + Sync {
    fn format(&self) -> ResumeFormat;
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Registry of extractors keyed by the format they handle.
#[derive(Clone)]
pub struct ExtractorSet {
    extractors: HashMap<ResumeFormat, Arc<dyn TextExtractor>>,
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::new()
            .with(Arc::new(PdfExtractor))
            .with(Arc::new(DocxExtractor))
    }
}

impl ExtractorSet {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    pub fn with(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(extractor.format(), extractor);
        self
    }

    pub fn supports(&self, format: &ResumeFormat) -> bool {
        self.extractors.contains_key(format)
    }

    /// Runs the matching extractor on the blocking pool; a panicking parser is
    /// reported as a corrupt document.
    pub async fn extract(&self, format: ResumeFormat, bytes: Vec<u8>) -> Result<String, ExtractError> {
        let extractor = self
            .extractors
            .get(&format)
            .cloned()
            .ok_or_else(|| ExtractError::Unsupported(format.to_string()))?;

        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| ExtractError::Corrupt {
                format: format.clone(),
                message: e.to_string(),
            })??;

        if text.trim().is_empty() {
            return Err(ExtractError::Empty(format));
        }
        Ok(text)
    }
}
