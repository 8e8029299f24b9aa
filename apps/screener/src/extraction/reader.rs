use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::{debug, warn};

use crate::extraction::{ExtractError, ExtractorSet, ResumeFormat};

/// Largest résumé body that is downloaded and parsed.
pub const MAX_RESUME_BYTES: u64 = 20 * 1024 * 1024;

fn ensure_within_limit(size: u64) -> Result<(), ExtractError> {
    if size > MAX_RESUME_BYTES {
        return Err(ExtractError::TooLarge {
            size,
            limit: MAX_RESUME_BYTES,
        });
    }
    Ok(())
}

/// Turns a résumé reference into flat text.
#[async_trait]
pub trait ResumeReader: Send + Sync {
    async fn read_text(&self, url: &str) -> Result<String, ExtractError>;
}

/// Downloads the résumé over HTTP and dispatches on its declared format.
pub struct HttpResumeReader {
    client: Client,
    extractors: ExtractorSet,
}

impl HttpResumeReader {
    pub fn new(client: Client, extractors: ExtractorSet) -> Self {
        Self { client, extractors }
    }
}

#[async_trait]
impl ResumeReader for HttpResumeReader {
    async fn read_text(&self, url: &str) -> Result<String, ExtractError> {
        let result = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExtractError::Status(status.as_u16()));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let format = ResumeFormat::detect(content_type.as_deref(), url);
            if !self.extractors.supports(&format) {
                return Err(ExtractError::Unsupported(format.to_string()));
            }

            // Declared length is checked before the body is read; the actual
            // length after, for servers that stream without one.
            if let Some(declared) = response.content_length() {
                ensure_within_limit(declared)?;
            }
            let bytes = response.bytes().await?;
            ensure_within_limit(bytes.len() as u64)?;
            debug!("Downloaded {} bytes ({format}) from {url}", bytes.len());
            self.extractors.extract(format, bytes.to_vec()).await
        }
        .await;

        if let Err(e) = &result {
            warn!("Résumé extraction failed for {url}: {e}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(ensure_within_limit(0).is_ok());
        assert!(ensure_within_limit(MAX_RESUME_BYTES).is_ok());
    }

    #[test]
    fn test_oversized_resume_is_rejected() {
        let err = ensure_within_limit(MAX_RESUME_BYTES + 1).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TooLarge { size, limit } if size == MAX_RESUME_BYTES + 1 && limit == MAX_RESUME_BYTES
        ));
    }
}
