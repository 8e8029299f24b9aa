//! Listing URL validation: `https://<host>/opening/candidates/<opening_id>?stage=<stage_id>`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingestion::IngestError;

/// The two identifiers embedded in a candidate listing URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingIds {
    pub opening_id: String,
    pub stage_id: String,
}

/// Full-match validator for listing URLs on one hiring-platform host.
#[derive(Debug, Clone)]
pub struct ListingUrlValidator {
    pattern: Regex,
}

impl ListingUrlValidator {
    pub fn new(host: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^https://{}/opening/candidates/(\d+)\?stage=(\d+)$",
            regex::escape(host)
        ))?;
        Ok(Self { pattern })
    }

    pub fn is_valid(&self, url: &str) -> bool {
        self.pattern.is_match(url.trim())
    }

    /// Validates the URL and returns its identifiers. Nothing touches the
    /// network before this succeeds.
    pub fn parse(&self, url: &str) -> Result<ListingIds, IngestError> {
        if !self.is_valid(url) {
            return Err(IngestError::InvalidListingUrl(url.to_string()));
        }
        extract_ids(url).ok_or_else(|| IngestError::InvalidListingUrl(url.to_string()))
    }
}

/// Returns the opening and stage identifiers exactly as captured, or `None`
/// when the URL does not carry them.
pub fn extract_ids(url: &str) -> Option<ListingIds> {
    static IDS: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = IDS
        .get_or_init(|| Regex::new(r"candidates/(\d+)\?stage=(\d+)").ok())
        .as_ref()?;
    let captures = pattern.captures(url)?;
    Some(ListingIds {
        opening_id: captures.get(1)?.as_str().to_string(),
        stage_id: captures.get(2)?.as_str().to_string(),
    })
}
