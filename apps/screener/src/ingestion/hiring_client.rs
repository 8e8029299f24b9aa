//! Hiring-platform public API client: candidate listing and opening detail.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::ingestion::listing_url::ListingIds;
use crate::ingestion::normalize::html_to_text;
use crate::ingestion::IngestError;

/// Job opening as returned by the opening-detail endpoint, with HTML removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpeningDetail {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Clone)]
pub struct HiringClient {
    client: Client,
    api_base: String,
    access_token: String,
    page_size: u32,
    start_date: NaiveDate,
}

impl HiringClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_base: format!("https://{}/publicapi/v2", config.hiring_host),
            access_token: config.hiring_access_token.clone(),
            page_size: config.listing_page_size,
            start_date: config.listing_start_date,
        }
    }

    /// Fetches every candidate of one opening stage in a single page.
    pub async fn list_candidates(&self, ids: &ListingIds) -> Result<Vec<Value>, IngestError> {
        let page_size = self.page_size.to_string();
        let start_date = self.start_date.format("%Y-%m-%d").to_string();
        let form = [
            ("access_token", self.access_token.as_str()),
            ("opening_id", ids.opening_id.as_str()),
            ("num_per_page", page_size.as_str()),
            ("stage_id", ids.stage_id.as_str()),
            ("start_date", start_date.as_str()),
            ("end_date", ""),
        ];

        info!(
            "Listing candidates for opening {} stage {}",
            ids.opening_id, ids.stage_id
        );
        let body = self.post_form("candidate/list", &form).await?;
        candidates_from_response(body)
    }

    pub async fn opening_detail(&self, opening_id: &str) -> Result<OpeningDetail, IngestError> {
        let form = [
            ("access_token", self.access_token.as_str()),
            ("id", opening_id),
        ];
        let body = self.post_form("opening/get", &form).await?;
        opening_from_response(opening_id, body)
    }

    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<Value, IngestError> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.api_base))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        debug!("Hiring API {endpoint} responded");
        Ok(body)
    }
}

/// Pulls the `candidates` array out of a listing response.
pub fn candidates_from_response(body: Value) -> Result<Vec<Value>, IngestError> {
    match body {
        Value::Object(mut obj) => match obj.remove("candidates") {
            Some(Value::Array(candidates)) => Ok(candidates),
            Some(_) => Err(IngestError::Malformed(
                "'candidates' is not an array".to_string(),
            )),
            None => Err(IngestError::MissingKey("candidates")),
        },
        _ => Err(IngestError::Malformed(
            "listing response is not a JSON object".to_string(),
        )),
    }
}

pub fn opening_from_response(opening_id: &str, body: Value) -> Result<OpeningDetail, IngestError> {
    let opening = body.get("opening").ok_or(IngestError::MissingKey("opening"))?;
    let content = opening
        .get("content")
        .and_then(|v| v.as_str())
        .ok_or(IngestError::MissingKey("opening.content"))?;
    let name = opening
        .get("name")
        .and_then(|v| v.as_str())
        .map(html_to_text)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| opening_id.to_string());

    Ok(OpeningDetail {
        id: opening_id.to_string(),
        name,
        description: html_to_text(content),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidates_from_response_returns_array() {
        let body = json!({"code": 1, "candidates": [{"id": "1"}, {"id": "2"}]});
        assert_eq!(candidates_from_response(body).unwrap().len(), 2);
    }

    #[test]
    fn test_candidates_from_response_missing_key() {
        let body = json!({"code": 0, "message": "invalid token"});
        assert!(matches!(
            candidates_from_response(body),
            Err(IngestError::MissingKey("candidates"))
        ));
    }

    #[test]
    fn test_candidates_from_response_wrong_shape() {
        assert!(matches!(
            candidates_from_response(json!({"candidates": "none"})),
            Err(IngestError::Malformed(_))
        ));
        assert!(matches!(
            candidates_from_response(json!([1, 2])),
            Err(IngestError::Malformed(_))
        ));
    }

    #[test]
    fn test_opening_from_response_strips_html() {
        let body = json!({
            "opening": {
                "name": "Backend Engineer",
                "content": "<h3>Requirements</h3><p>3+ years of Go&amp;Rust</p>"
            }
        });
        let opening = opening_from_response("77", body).unwrap();
        assert_eq!(opening.id, "77");
        assert_eq!(opening.name, "Backend Engineer");
        assert_eq!(opening.description, "Requirements\n3+ years of Go&Rust");
    }

    #[test]
    fn test_opening_without_name_falls_back_to_id() {
        let body = json!({"opening": {"name": "  ", "content": "<p>Rust</p>"}});
        assert_eq!(opening_from_response("77", body).unwrap().name, "77");

        let body = json!({"opening": {"content": "<p>Rust</p>"}});
        assert_eq!(opening_from_response("78", body).unwrap().name, "78");
    }

    #[test]
    fn test_opening_from_response_requires_content() {
        let body = json!({"opening": {"name": "X"}});
        assert!(matches!(
            opening_from_response("1", body),
            Err(IngestError::MissingKey("opening.content"))
        ));
    }
}
