//! Model-backed résumé scorer.
//!
//! One call per pass: build the prompt, request JSON constrained to the
//! variant's schema, wait the fixed post-call delay, then parse fail-closed.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::llm_client::prompts::{RECRUITER_PERSONA, SCHEMA_ONLY_INSTRUCTION};
use crate::llm_client::StructuredModel;
use crate::scoring::prompts::SCORING_PROMPT_TEMPLATE;
use crate::scoring::schema::{parse_score_card, SchemaVariant, ScoreCard};
use crate::scoring::ScoringError;

#[derive(Clone)]
pub struct ResumeScorer {
    model: Arc<dyn StructuredModel>,
    delay: Duration,
}

impl ResumeScorer {
    pub fn new(model: Arc<dyn StructuredModel>, delay: Duration) -> Self {
        Self { model, delay }
    }

    pub async fn score(
        &self,
        variant: SchemaVariant,
        job_description: &str,
        resume: &str,
    ) -> Result<ScoreCard, ScoringError> {
        let prompt = build_prompt(variant, job_description, resume);
        let schema = variant.response_schema();

        let reply = self.model.generate_json(&prompt, &schema).await;

        // Fixed pause after every call, successful or not, to stay under the provider's rate limit.
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let card = parse_score_card(variant, &reply?)?;
        debug!(
            "Scored résumé ({:?}): aggregate {}",
            variant,
            card.aggregate()
        );
        Ok(card)
    }
}

/// Renders the criteria list shown to the model for a variant.
fn rubric_lines(variant: SchemaVariant) -> String {
    variant
        .axes()
        .iter()
        .map(|axis| format!("- {} (0–{}): {}", axis.label, axis.max, axis.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(variant: SchemaVariant, job_description: &str, resume: &str) -> String {
    let rubric = rubric_lines(variant);
    fill_template(
        SCORING_PROMPT_TEMPLATE,
        &[
            ("persona", RECRUITER_PERSONA),
            ("rubric", rubric.as_str()),
            ("job_description", job_description.trim()),
            ("resume", resume.trim()),
            ("schema_instruction", SCHEMA_ONLY_INSTRUCTION),
        ],
    )
}

/// Single-pass `{key}` substitution; text inserted from a value is never rescanned.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find(|(key, _)| {
            tail[1..].starts_with(key) && tail[1 + key.len()..].starts_with('}')
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct FixedModel {
        reply: Value,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StructuredModel for FixedModel {
        async fn generate_json(&self, prompt: &str, _schema: &Value) -> Result<Value, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl StructuredModel for FailingModel {
        async fn generate_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    fn rubric_reply() -> Value {
        json!({
            "job_fit": 8, "technical_skills": 7, "experience": 9,
            "education": 6, "soft_skills": 8, "overall": 7.6,
            "summary": "Solid."
        })
    }

    #[test]
    fn test_prompt_embeds_jd_resume_and_rubric() {
        let prompt = build_prompt(SchemaVariant::Criteria, "  Senior Go role ", "Ten years of Go");
        assert!(prompt.contains("JOB DESCRIPTION:\nSenior Go role\n"));
        assert!(prompt.contains("CV:\nTen years of Go"));
        assert!(prompt.contains("- Competency (0–40)"));
        assert!(prompt.contains("- Penalty points (0–40)"));
        assert!(!prompt.contains("{rubric}"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        assert_eq!(fill_template("{a} {b} {", &[("a", "x")]), "x {b} {");
    }

    #[test]
    fn test_prompt_keeps_braces_in_inputs() {
        let prompt = build_prompt(SchemaVariant::Rubric, "Uses {resume} templates", "cv");
        assert!(prompt.contains("Uses {resume} templates"));
    }

    #[tokio::test]
    async fn test_score_parses_reply() {
        let model = Arc::new(FixedModel {
            reply: rubric_reply(),
            prompts: Mutex::new(Vec::new()),
        });
        let scorer = ResumeScorer::new(model.clone(), Duration::ZERO);
        let card = scorer
            .score(SchemaVariant::Rubric, "JD", "CV text")
            .await
            .unwrap();
        assert_eq!(card.aggregate(), 7.6);
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_score_rejects_reply_for_other_variant() {
        let model = Arc::new(FixedModel {
            reply: rubric_reply(),
            prompts: Mutex::new(Vec::new()),
        });
        let scorer = ResumeScorer::new(model, Duration::ZERO);
        let err = scorer
            .score(SchemaVariant::Criteria, "JD", "CV")
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::MissingField("competency")));
    }

    #[tokio::test]
    async fn test_model_failure_is_scoring_error() {
        let scorer = ResumeScorer::new(Arc::new(FailingModel), Duration::ZERO);
        let err = scorer
            .score(SchemaVariant::Rubric, "JD", "CV")
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Model(LlmError::EmptyContent)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applies_after_failed_calls_too() {
        let scorer = ResumeScorer::new(Arc::new(FailingModel), Duration::from_secs(3));
        let start = tokio::time::Instant::now();
        let _ = scorer.score(SchemaVariant::Rubric, "JD", "CV").await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
