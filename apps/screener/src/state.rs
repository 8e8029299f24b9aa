use std::sync::Arc;

use crate::config::Config;
use crate::extraction::reader::ResumeReader;
use crate::ingestion::hiring_client::HiringClient;
use crate::ingestion::listing_url::ListingUrlValidator;
use crate::scoring::scorer::ResumeScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hiring: HiringClient,
    /// Listing URL pattern, compiled once for the configured host.
    pub listing_urls: Arc<ListingUrlValidator>,
    /// Résumé download + text extraction. Default: HttpResumeReader.
    pub resumes: Arc<dyn ResumeReader>,
    pub scorer: ResumeScorer,
}
