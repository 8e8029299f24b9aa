//! Axum route handlers for candidate ingestion.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingestion::export::candidates_to_csv;
use crate::ingestion::hiring_client::OpeningDetail;
use crate::ingestion::listing_url::extract_ids;
use crate::ingestion::{fetch_candidates, CandidateRecord};
use crate::routes::export::{csv_attachment, ExportQuery, OutputFormat};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchCandidatesRequest {
    pub listing_url: String,
}

#[derive(Debug, Serialize)]
pub struct FetchCandidatesResponse {
    pub opening_id: String,
    pub stage_id: String,
    pub count: usize,
    pub candidates: Vec<CandidateRecord>,
}

/// POST /api/v1/candidates
///
/// Fetches and normalises every candidate of the listing's stage.
/// `?format=csv` returns the listing export instead of JSON.
pub async fn handle_fetch_candidates(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<FetchCandidatesRequest>,
) -> Result<Response, AppError> {
    if request.listing_url.trim().is_empty() {
        return Err(AppError::Validation("listing_url cannot be empty".to_string()));
    }

    let candidates =
        fetch_candidates(&state.hiring, &state.listing_urls, request.listing_url.trim()).await?;

    match query.format {
        OutputFormat::Csv => Ok(csv_attachment(
            "candidates.csv",
            candidates_to_csv(&candidates)?,
        )),
        OutputFormat::Json => {
            let ids = extract_ids(&request.listing_url).ok_or_else(|| {
                AppError::Validation(format!("Invalid listing URL '{}'", request.listing_url))
            })?;
            Ok(Json(FetchCandidatesResponse {
                opening_id: ids.opening_id,
                stage_id: ids.stage_id,
                count: candidates.len(),
                candidates,
            })
            .into_response())
        }
    }
}

/// GET /api/v1/opening/:opening_id
pub async fn handle_get_opening(
    State(state): State<AppState>,
    Path(opening_id): Path<String>,
) -> Result<Json<OpeningDetail>, AppError> {
    if opening_id.is_empty() || !opening_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "opening id must be numeric, got '{opening_id}'"
        )));
    }
    let opening = state.hiring.opening_detail(&opening_id).await?;
    Ok(Json(opening))
}
