//! Linear batch evaluation: résumé text → model scoring → report row.
//!
//! Candidates are processed one at a time in input order. A failure at any
//! stage is recorded against that candidate and the batch moves on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::evaluation::report::{Assessment, ReportRow};
use crate::extraction::reader::ResumeReader;
use crate::ingestion::hiring_client::OpeningDetail;
use crate::ingestion::CandidateRecord;
use crate::scoring::job_bands::JobBandTable;
use crate::scoring::policy::{SalaryBand, UNASSIGNED_POSITION};
use crate::scoring::schema::SchemaVariant;
use crate::scoring::scorer::ResumeScorer;
use crate::scoring::ScoringError;

/// Where each candidate's job description comes from.
#[derive(Debug, Clone)]
pub enum JdSource {
    /// One description for everybody.
    Direct {
        text: String,
        position: Option<String>,
    },
    /// Looked up from the candidate's compensation band.
    Banded(JobBandTable),
    /// The opening's own description, fetched from the hiring platform.
    Opening(OpeningDetail),
}

#[derive(Debug, Clone)]
pub enum EvaluationMode {
    Single(SchemaVariant),
    /// Soft pass (criteria vs. job description) plus hard pass (rubric vs. generic rubric).
    Dual { hard_rubric: String },
}

#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    pub jd_source: JdSource,
    pub mode: EvaluationMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    JobDescription,
    Extract,
    Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateFailure {
    pub candidate: CandidateRecord,
    pub stage: FailureStage,
    pub message: String,
}

impl CandidateFailure {
    fn new(candidate: CandidateRecord, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            candidate,
            stage,
            message: message.into(),
        }
    }
}

pub type CandidateOutcome = Result<ReportRow, CandidateFailure>;

enum Target<'a> {
    Score {
        position: String,
        job_description: &'a str,
    },
    Placeholder,
}

fn resolve_target(source: &JdSource, band: Option<SalaryBand>) -> Result<Target<'_>, String> {
    match source {
        JdSource::Banded(table) => {
            let Some(band) = band else {
                return Ok(Target::Placeholder);
            };
            let entry = table
                .get(band)
                .ok_or_else(|| format!("no job description for band {}", band.label()))?;
            Ok(Target::Score {
                position: entry.job_name.clone(),
                job_description: &entry.description,
            })
        }
        JdSource::Direct { text, position } => Ok(Target::Score {
            position: match band {
                Some(band) => position.clone().unwrap_or_else(|| band.label().to_string()),
                None => UNASSIGNED_POSITION.to_string(),
            },
            job_description: text,
        }),
        JdSource::Opening(opening) => Ok(Target::Score {
            position: match band {
                Some(_) => opening.name.clone(),
                None => UNASSIGNED_POSITION.to_string(),
            },
            job_description: &opening.description,
        }),
    }
}

async fn score_passes(
    mode: &EvaluationMode,
    scorer: &ResumeScorer,
    job_description: &str,
    resume: &str,
) -> Result<Vec<Assessment>, ScoringError> {
    match mode {
        EvaluationMode::Single(variant) => Ok(vec![Assessment {
            prefix: None,
            card: scorer.score(*variant, job_description, resume).await?,
        }]),
        EvaluationMode::Dual { hard_rubric } => {
            let soft = scorer
                .score(SchemaVariant::Criteria, job_description, resume)
                .await?;
            let hard = scorer
                .score(SchemaVariant::Rubric, hard_rubric, resume)
                .await?;
            Ok(vec![
                Assessment {
                    prefix: Some("soft_"),
                    card: soft,
                },
                Assessment {
                    prefix: Some("hard_"),
                    card: hard,
                },
            ])
        }
    }
}

pub async fn evaluate_candidate(
    candidate: CandidateRecord,
    plan: &EvaluationPlan,
    reader: &dyn ResumeReader,
    scorer: &ResumeScorer,
) -> CandidateOutcome {
    let band = SalaryBand::for_salary(candidate.desired_salary);

    let (position, job_description) = match resolve_target(&plan.jd_source, band) {
        Ok(Target::Score {
            position,
            job_description,
        }) => (position, job_description),
        Ok(Target::Placeholder) => return Ok(ReportRow::unassigned(candidate)),
        Err(message) => {
            return Err(CandidateFailure::new(
                candidate,
                FailureStage::JobDescription,
                message,
            ))
        }
    };

    let resume = match reader.read_text(&candidate.resume_url).await {
        Ok(text) => text,
        Err(e) => return Err(CandidateFailure::new(candidate, FailureStage::Extract, e.to_string())),
    };

    match score_passes(&plan.mode, scorer, job_description, &resume).await {
        Ok(assessments) => Ok(ReportRow::scored(candidate, position, assessments, band)),
        Err(e) => Err(CandidateFailure::new(candidate, FailureStage::Score, e.to_string())),
    }
}

/// Evaluates every candidate sequentially; one outcome per input, in order.
pub async fn run_evaluation(
    candidates: Vec<CandidateRecord>,
    plan: &EvaluationPlan,
    reader: &dyn ResumeReader,
    scorer: &ResumeScorer,
) -> Vec<CandidateOutcome> {
    let total = candidates.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, candidate) in candidates.into_iter().enumerate() {
        let name = candidate.name.clone();
        let outcome = evaluate_candidate(candidate, plan, reader, scorer).await;
        match &outcome {
            Ok(row) => info!(
                "scored {}/{}: {} ({})",
                i + 1,
                total,
                name,
                row.verdict
            ),
            Err(failure) => warn!(
                "candidate {}/{} ({}) failed at {:?}: {}",
                i + 1,
                total,
                name,
                failure.stage,
                failure.message
            ),
        }
        outcomes.push(outcome);
    }
    outcomes
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub failures: Vec<CandidateFailure>,
}

impl EvaluationReport {
    pub fn from_outcomes(outcomes: Vec<CandidateOutcome>) -> Self {
        let (rows, failures): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            rows: rows.into_iter().filter_map(Result::ok).collect(),
            failures: failures.into_iter().filter_map(Result::err).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractError, ResumeFormat};
    use crate::llm_client::{LlmError, StructuredModel};
    use crate::scoring::policy::Verdict;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Reads "text" for any URL whose extension is a supported document.
    struct StubReader;

    #[async_trait]
    impl ResumeReader for StubReader {
        async fn read_text(&self, url: &str) -> Result<String, ExtractError> {
            match ResumeFormat::detect(None, url) {
                ResumeFormat::Unsupported(kind) => Err(ExtractError::Unsupported(kind)),
                format => Ok(format!("{format} résumé from {url}")),
            }
        }
    }

    /// Answers with a rubric or criteria reply depending on the requested schema.
    struct StubModel {
        calls: AtomicUsize,
        fail_on_resume: Option<&'static str>,
    }

    impl StubModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_resume: None,
            }
        }
    }

    #[async_trait]
    impl StructuredModel for StubModel {
        async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_on_resume {
                if prompt.contains(marker) {
                    return Err(LlmError::EmptyContent);
                }
            }
            if schema["properties"].get("competency").is_some() {
                Ok(json!({
                    "competency": 35, "cultural_fit": 25, "future_potential": 15,
                    "other_criteria": 5, "bonus_points": 10, "penalty_points": 5,
                    "summary": "Fits the team."
                }))
            } else {
                Ok(json!({
                    "job_fit": 8, "technical_skills": 7, "experience": 9,
                    "education": 6, "soft_skills": 8, "overall": 7.6,
                    "summary": "Solid backend engineer."
                }))
            }
        }
    }

    fn candidate(id: &str, file: &str, salary: Option<u64>) -> CandidateRecord {
        CandidateRecord {
            id: id.to_string(),
            name: format!("Candidate {id}"),
            email: format!("{id}@example.com"),
            status: "1".to_string(),
            resume_url: format!("https://cdn.example.com/{file}"),
            desired_salary: salary,
            title: None,
        }
    }

    fn direct_plan(variant: SchemaVariant) -> EvaluationPlan {
        EvaluationPlan {
            jd_source: JdSource::Direct {
                text: "Backend engineer, Rust and Postgres.".to_string(),
                position: Some("Backend Engineer".to_string()),
            },
            mode: EvaluationMode::Single(variant),
        }
    }

    fn band_table() -> JobBandTable {
        JobBandTable::from_csv(
            b"Band,Job_name,Job_Description\n\
              under_500,Intern,Learn\n\
              500_999,Junior Developer,Ship\n\
              1000_1499,Developer,Own\n\
              1500_plus,Senior Developer,Lead\n",
        )
        .unwrap()
    }

    fn scorer(model: Arc<StubModel>) -> ResumeScorer {
        ResumeScorer::new(model, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_unsupported_resume_is_skipped_and_batch_continues() {
        let model = Arc::new(StubModel::new());
        let candidates = vec![
            candidate("1", "a.pdf", Some(800)),
            candidate("2", "b.png", Some(800)),
            candidate("3", "c.pdf", Some(300)),
        ];

        let outcomes = run_evaluation(
            candidates,
            &direct_plan(SchemaVariant::Rubric),
            &StubReader,
            &scorer(model.clone()),
        )
        .await;
        let report = EvaluationReport::from_outcomes(outcomes);

        assert_eq!(report.rows.len(), 2);
        for row in &report.rows {
            assert_eq!(row.aggregate, Some(7.6));
            assert!(!row.summary.is_empty());
            assert_eq!(row.position, "Backend Engineer");
        }
        // 76 ≥ 75 for 500–999, 76 ≥ 70 below 500
        assert_eq!(report.rows[0].verdict, Verdict::Pass);
        assert_eq!(report.rows[1].verdict, Verdict::Pass);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].candidate.id, "2");
        assert_eq!(report.failures[0].stage, FailureStage::Extract);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_model_failure_only_fails_that_candidate() {
        let model = Arc::new(StubModel {
            calls: AtomicUsize::new(0),
            fail_on_resume: Some("b.pdf"),
        });
        let candidates = vec![
            candidate("1", "a.pdf", Some(800)),
            candidate("2", "b.pdf", Some(800)),
            candidate("3", "c.pdf", Some(800)),
        ];

        let outcomes = run_evaluation(
            candidates,
            &direct_plan(SchemaVariant::Rubric),
            &StubReader,
            &scorer(model),
        )
        .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        let failure = outcomes[1].as_ref().unwrap_err();
        assert_eq!(failure.stage, FailureStage::Score);
        assert!(outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn test_banded_without_salary_emits_placeholder_without_scoring() {
        let model = Arc::new(StubModel::new());
        let plan = EvaluationPlan {
            jd_source: JdSource::Banded(band_table()),
            mode: EvaluationMode::Single(SchemaVariant::Criteria),
        };
        let candidates = vec![
            candidate("1", "a.pdf", None),
            candidate("2", "b.pdf", Some(1200)),
        ];

        let report = EvaluationReport::from_outcomes(
            run_evaluation(candidates, &plan, &StubReader, &scorer(model.clone())).await,
        );

        assert_eq!(report.rows.len(), 2);
        let placeholder = &report.rows[0];
        assert_eq!(placeholder.position, UNASSIGNED_POSITION);
        assert_eq!(placeholder.verdict, Verdict::Unassigned);
        assert!(placeholder.scores.is_empty());

        let scored = &report.rows[1];
        assert_eq!(scored.position, "Developer");
        // 35 + 25 + 15 + 5 + 10 - 5 = 85 ≥ 80
        assert_eq!(scored.aggregate, Some(85.0));
        assert_eq!(scored.verdict, Verdict::Pass);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_direct_without_salary_is_scored_but_unassigned() {
        let model = Arc::new(StubModel::new());
        let outcomes = run_evaluation(
            vec![candidate("1", "a.docx", Some(0))],
            &direct_plan(SchemaVariant::Rubric),
            &StubReader,
            &scorer(model),
        )
        .await;
        let row = outcomes[0].as_ref().unwrap();
        assert_eq!(row.aggregate, Some(7.6));
        assert_eq!(row.position, UNASSIGNED_POSITION);
        assert_eq!(row.verdict, Verdict::Unassigned);
    }

    #[tokio::test]
    async fn test_dual_mode_merges_prefixed_passes() {
        let model = Arc::new(StubModel::new());
        let plan = EvaluationPlan {
            jd_source: JdSource::Banded(band_table()),
            mode: EvaluationMode::Dual {
                hard_rubric: "Generic rubric".to_string(),
            },
        };

        let outcomes = run_evaluation(
            vec![candidate("1", "a.pdf", Some(1600))],
            &plan,
            &StubReader,
            &scorer(model.clone()),
        )
        .await;
        let row = outcomes[0].as_ref().unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(row.score("soft_competency"), Some(35.0));
        assert_eq!(row.score("soft_aggregate"), Some(85.0));
        assert_eq!(row.score("hard_job_fit"), Some(8.0));
        assert_eq!(row.score("hard_aggregate"), Some(7.6));
        // Primary aggregate comes from the soft pass; 85 ≥ 85
        assert_eq!(row.aggregate, Some(85.0));
        assert_eq!(row.verdict, Verdict::Pass);
        assert!(row.summary.contains("[soft] Fits the team."));
        assert!(row.summary.contains("[hard] Solid backend engineer."));
    }

    #[tokio::test]
    async fn test_opening_source_uses_opening_name_as_position() {
        let model = Arc::new(StubModel::new());
        let plan = EvaluationPlan {
            jd_source: JdSource::Opening(OpeningDetail {
                id: "42".to_string(),
                name: "Data Engineer".to_string(),
                description: "Pipelines in Rust".to_string(),
            }),
            mode: EvaluationMode::Single(SchemaVariant::Rubric),
        };
        let outcomes =
            run_evaluation(vec![candidate("1", "a.pdf", Some(1000))], &plan, &StubReader, &scorer(model)).await;
        let row = outcomes[0].as_ref().unwrap();
        assert_eq!(row.position, "Data Engineer");
        // 76 < 80 for 1000–1499
        assert_eq!(row.verdict, Verdict::Fail);
    }

    #[test]
    fn test_report_serializes_failures_with_stage() {
        let report = EvaluationReport::from_outcomes(vec![Err(CandidateFailure::new(
            candidate("9", "x.png", None),
            FailureStage::Extract,
            "Unsupported résumé format: .png",
        ))]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["failures"][0]["stage"], "extract");
        assert_eq!(value["failures"][0]["candidate"]["id"], "9");
        assert!(value["rows"].as_array().unwrap().is_empty());
    }
}
