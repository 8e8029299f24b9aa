// Prompt constants for résumé scoring.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Scoring prompt template.
/// Replace: {persona}, {rubric}, {job_description}, {resume}, {schema_instruction}
pub const SCORING_PROMPT_TEMPLATE: &str = r#"{persona}

Evaluate the CV below against the job description and score it on every criterion.

SCORING CRITERIA:
{rubric}

JOB DESCRIPTION:
{job_description}

CV:
{resume}

{schema_instruction}"#;

/// Generic rubric used for the "hard" pass of a dual evaluation when no
/// rubric file is configured.
pub const DEFAULT_HARD_RUBRIC: &str = "\
Generic technical hiring rubric, independent of the specific opening.
- Job fit: responsibilities held previously resemble a professional software or business role at the claimed level.
- Technical skills: concrete tools, languages and methods, with evidence of hands-on use.
- Experience: total relevant years, progression and the scale of work delivered.
- Education: degrees, certifications and continued learning relevant to the profession.
- Soft skills: communication, teamwork, ownership and leadership shown through outcomes.";
