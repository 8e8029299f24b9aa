// Candidate ingestion: listing URL → hiring-platform listing → normalised records.
// Validation happens before any request is issued; upstream failures are not retried.

pub mod export;
pub mod handlers;
pub mod hiring_client;
pub mod listing_url;
pub mod normalize;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::ingestion::hiring_client::HiringClient;
use crate::ingestion::listing_url::ListingUrlValidator;
use crate::ingestion::normalize::normalize_candidates;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid listing URL '{0}': expected https://<host>/opening/candidates/<opening_id>?stage=<stage_id>")]
    InvalidListingUrl(String),

    #[error("Hiring API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hiring API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Hiring API response is missing '{0}'")]
    MissingKey(&'static str),

    #[error("Hiring API response is malformed: {0}")]
    Malformed(String),
}

/// One candidate as fetched in a run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub resume_url: String,
    pub desired_salary: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Validates the listing URL, fetches the stage and normalises every candidate.
pub async fn fetch_candidates(
    hiring: &HiringClient,
    validator: &ListingUrlValidator,
    listing_url: &str,
) -> Result<Vec<CandidateRecord>, IngestError> {
    let ids = validator.parse(listing_url)?;
    let raw = hiring.list_candidates(&ids).await?;
    let records = normalize_candidates(&raw);
    info!(
        "Fetched {} candidates ({} with a résumé) for opening {}",
        raw.len(),
        records.len(),
        ids.opening_id
    );
    Ok(records)
}
