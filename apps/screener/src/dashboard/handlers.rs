use axum::{
    extract::{Multipart, Query},
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::dashboard::filters::DashboardQuery;
use crate::dashboard::{build_dashboard, Dashboard};
use crate::errors::AppError;
use crate::evaluation::report::load_report;

/// POST /api/v1/dashboard
///
/// Reads the uploaded report CSV (`file`) and returns every chart's data.
pub async fn handle_dashboard(
    Query(query): Query<DashboardQuery>,
    mut multipart: Multipart,
) -> Result<Json<Dashboard>, AppError> {
    let mut file: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = Some(field.bytes().await?);
        }
    }
    let bytes = file.ok_or_else(|| AppError::Validation("A report CSV 'file' is required".to_string()))?;

    let report = load_report(&bytes)?;
    info!(
        "Building dashboard for {} rows ({} score columns)",
        report.rows.len(),
        report.axes.len()
    );
    Ok(Json(build_dashboard(&report, &query)?))
}
