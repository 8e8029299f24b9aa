//! Axum route handler for batch evaluations.

use anyhow::Context;
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::AppError;
use crate::evaluation::pipeline::{
    run_evaluation, EvaluationMode, EvaluationPlan, EvaluationReport, JdSource,
};
use crate::evaluation::report::report_to_csv;
use crate::ingestion::export::candidates_from_csv;
use crate::ingestion::fetch_candidates;
use crate::routes::export::{csv_attachment, ExportQuery, OutputFormat};
use crate::scoring::job_bands::JobBandTable;
use crate::scoring::prompts::DEFAULT_HARD_RUBRIC;
use crate::scoring::schema::SchemaVariant;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JdSourceKind {
    Direct,
    Banded,
    Opening,
}

/// Text fields and the optional candidate file of an evaluation request.
#[derive(Debug, Default)]
pub struct EvaluationForm {
    pub file: Option<Vec<u8>>,
    pub listing_url: Option<String>,
    pub jd: Option<String>,
    pub position: Option<String>,
    pub variant: Option<String>,
    pub mode: Option<String>,
    pub jd_source: Option<String>,
}

impl EvaluationForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = EvaluationForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => form.file = Some(field.bytes().await?.to_vec()),
                "listing_url" => form.listing_url = non_empty(field.text().await?),
                "jd" => form.jd = non_empty(field.text().await?),
                "position" => form.position = non_empty(field.text().await?),
                "variant" => form.variant = non_empty(field.text().await?),
                "mode" => form.mode = non_empty(field.text().await?),
                "jd_source" => form.jd_source = non_empty(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    /// Explicit `jd_source`, otherwise direct when a description was supplied and banded when not.
    pub fn jd_source_kind(&self) -> Result<JdSourceKind, AppError> {
        match self.jd_source.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("direct") => Ok(JdSourceKind::Direct),
            Some("banded") => Ok(JdSourceKind::Banded),
            Some("opening") => Ok(JdSourceKind::Opening),
            Some(other) => Err(AppError::Validation(format!(
                "jd_source must be one of direct, banded, opening; got '{other}'"
            ))),
            None if self.jd.is_some() => Ok(JdSourceKind::Direct),
            None => Ok(JdSourceKind::Banded),
        }
    }

    pub fn variant(&self) -> Result<SchemaVariant, AppError> {
        match self.variant.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("rubric") => Ok(SchemaVariant::Rubric),
            Some("criteria") => Ok(SchemaVariant::Criteria),
            Some(other) => Err(AppError::Validation(format!(
                "variant must be rubric or criteria; got '{other}'"
            ))),
        }
    }

    pub fn is_dual(&self) -> Result<bool, AppError> {
        match self.mode.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("single") => Ok(false),
            Some("dual") => Ok(true),
            Some(other) => Err(AppError::Validation(format!(
                "mode must be single or dual; got '{other}'"
            ))),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn load_hard_rubric(config: &Config) -> Result<String, AppError> {
    match &config.hard_rubric_path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read hard rubric {}", path.display()))?;
            Ok(text)
        }
        None => Ok(DEFAULT_HARD_RUBRIC.to_string()),
    }
}

async fn build_plan(state: &AppState, form: &EvaluationForm) -> Result<EvaluationPlan, AppError> {
    let jd_source = match form.jd_source_kind()? {
        JdSourceKind::Direct => JdSource::Direct {
            text: form.jd.clone().ok_or_else(|| {
                AppError::Validation("jd is required when jd_source is direct".to_string())
            })?,
            position: form.position.clone(),
        },
        // Re-read at every run so edits to the table apply without a restart.
        JdSourceKind::Banded => {
            let table = JobBandTable::load(&state.config.job_bands_path)?;
            debug!(
                "Loaded {} job bands from {}",
                table.bands().len(),
                state.config.job_bands_path.display()
            );
            JdSource::Banded(table)
        }
        JdSourceKind::Opening => {
            let url = form.listing_url.as_deref().ok_or_else(|| {
                AppError::Validation(
                    "jd_source opening needs a listing_url naming the opening".to_string(),
                )
            })?;
            let ids = state.listing_urls.parse(url)?;
            JdSource::Opening(state.hiring.opening_detail(&ids.opening_id).await?)
        }
    };

    let mode = if form.is_dual()? {
        EvaluationMode::Dual {
            hard_rubric: load_hard_rubric(&state.config).await?,
        }
    } else {
        EvaluationMode::Single(form.variant()?)
    };

    Ok(EvaluationPlan { jd_source, mode })
}

/// POST /api/v1/evaluations
///
/// Scores every candidate of an uploaded export (or a listing URL) and returns
/// the merged report together with per-candidate failures.
pub async fn handle_create_evaluation(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = EvaluationForm::from_multipart(multipart).await?;

    form.variant()?;
    if form.file.is_none() && form.listing_url.is_none() {
        return Err(AppError::Validation(
            "Provide either a candidate CSV file or a listing_url".to_string(),
        ));
    }

    // Job description first: a bad source fails the request before any candidate is fetched.
    let plan = build_plan(&state, &form).await?;
    let candidates = match (&form.file, &form.listing_url) {
        (Some(bytes), _) => candidates_from_csv(bytes)?,
        (None, Some(url)) => fetch_candidates(&state.hiring, &state.listing_urls, url).await?,
        (None, None) => Vec::new(),
    };

    info!("Evaluating {} candidates", candidates.len());
    let outcomes = run_evaluation(candidates, &plan, state.resumes.as_ref(), &state.scorer).await;
    let report = EvaluationReport::from_outcomes(outcomes);

    match query.format {
        OutputFormat::Csv => Ok(csv_attachment("evaluation.csv", report_to_csv(&report.rows)?)),
        OutputFormat::Json => Ok(Json(report).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(jd: Option<&str>, jd_source: Option<&str>) -> EvaluationForm {
        EvaluationForm {
            jd: jd.map(str::to_string),
            jd_source: jd_source.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_jd_source_defaults_follow_jd_presence() {
        assert_eq!(form(Some("Rust dev"), None).jd_source_kind().unwrap(), JdSourceKind::Direct);
        assert_eq!(form(None, None).jd_source_kind().unwrap(), JdSourceKind::Banded);
        assert_eq!(
            form(Some("Rust dev"), Some("Opening")).jd_source_kind().unwrap(),
            JdSourceKind::Opening
        );
    }

    #[test]
    fn test_unknown_choices_are_validation_errors() {
        assert!(matches!(
            form(None, Some("random")).jd_source_kind(),
            Err(AppError::Validation(_))
        ));

        let bad_variant = EvaluationForm {
            variant: Some("holistic".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_variant.variant(), Err(AppError::Validation(_))));

        let bad_mode = EvaluationForm {
            mode: Some("triple".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_mode.is_dual(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_variant_and_mode_defaults() {
        let empty = EvaluationForm::default();
        assert_eq!(empty.variant().unwrap(), SchemaVariant::Rubric);
        assert!(!empty.is_dual().unwrap());

        let dual = EvaluationForm {
            variant: Some("CRITERIA".to_string()),
            mode: Some("dual".to_string()),
            ..Default::default()
        };
        assert_eq!(dual.variant().unwrap(), SchemaVariant::Criteria);
        assert!(dual.is_dual().unwrap());
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty("  a  ".to_string()), Some("a".to_string()));
        assert_eq!(non_empty("   ".to_string()), None);
    }
}
