//! Declared scoring schemas and their locally-typed results.
//!
//! The model is asked for JSON constrained to one of two schemas. Replies are
//! parsed fail-closed: a missing field, a wrong type or a value outside the
//! declared range rejects the whole reply.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::scoring::ScoringError;

/// Which sub-score set the model is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// Five 0–10 sub-scores, aggregate = mean.
    #[default]
    Rubric,
    /// Four weighted axes plus bonus/penalty points, aggregate = sum.
    Criteria,
}

/// One numeric sub-score with its declared upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAxis {
    pub key: &'static str,
    pub label: &'static str,
    pub max: u32,
    pub description: &'static str,
}

pub const RUBRIC_AXES: [ScoreAxis; 5] = [
    ScoreAxis {
        key: "job_fit",
        label: "Job fit",
        max: 10,
        description: "How well the candidate's experience and qualifications match the job's responsibilities, from 0 to 10.",
    },
    ScoreAxis {
        key: "technical_skills",
        label: "Technical skills",
        max: 10,
        description: "Proficiency in the technical skills the job requires, from 0 to 10.",
    },
    ScoreAxis {
        key: "experience",
        label: "Experience",
        max: 10,
        description: "Work experience, including years and relevance to the role, from 0 to 10.",
    },
    ScoreAxis {
        key: "education",
        label: "Education",
        max: 10,
        description: "How well the candidate's education meets the job's requirements, from 0 to 10.",
    },
    ScoreAxis {
        key: "soft_skills",
        label: "Soft skills",
        max: 10,
        description: "Communication, teamwork and leadership, from 0 to 10.",
    },
];

pub const CRITERIA_AXES: [ScoreAxis; 6] = [
    ScoreAxis {
        key: "competency",
        label: "Competency",
        max: 40,
        description: "Fit against the Competency axis of the job description, from 0 to 40.",
    },
    ScoreAxis {
        key: "cultural_fit",
        label: "Cultural fit",
        max: 30,
        description: "Fit against the Cultural Fit axis of the job description, from 0 to 30.",
    },
    ScoreAxis {
        key: "future_potential",
        label: "Future potential",
        max: 20,
        description: "Fit against the Future Potential axis of the job description, from 0 to 20.",
    },
    ScoreAxis {
        key: "other_criteria",
        label: "Other criteria",
        max: 10,
        description: "Fit against the other suggested criteria of the job description, from 0 to 10.",
    },
    ScoreAxis {
        key: "bonus_points",
        label: "Bonus points",
        max: 30,
        description: "Bonus points listed in the job description, 5 points per matched item, from 0 to 30.",
    },
    ScoreAxis {
        key: "penalty_points",
        label: "Penalty points",
        max: 40,
        description: "Penalty points listed in the job description, 5 points per matched item, from 0 to 40.",
    },
];

const OVERALL_KEY: &str = "overall";
const SUMMARY_KEY: &str = "summary";

impl SchemaVariant {
    pub fn axes(self) -> &'static [ScoreAxis] {
        match self {
            SchemaVariant::Rubric => &RUBRIC_AXES,
            SchemaVariant::Criteria => &CRITERIA_AXES,
        }
    }

    /// JSON response schema in the shape the generative API expects.
    pub fn response_schema(self) -> Value {
        let mut properties = Map::new();
        let mut required: Vec<&str> = Vec::new();

        for axis in self.axes() {
            properties.insert(
                axis.key.to_string(),
                json!({"type": "INTEGER", "description": axis.description}),
            );
            required.push(axis.key);
        }
        if self == SchemaVariant::Rubric {
            properties.insert(
                OVERALL_KEY.to_string(),
                json!({"type": "NUMBER", "description": "Average of the five scores above."}),
            );
            required.push(OVERALL_KEY);
        }
        properties.insert(
            SUMMARY_KEY.to_string(),
            json!({
                "type": "STRING",
                "description": "The candidate's main strengths and weaknesses against the job, in 2 or 3 sentences."
            }),
        );
        required.push(SUMMARY_KEY);

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricScores {
    pub job_fit: u32,
    pub technical_skills: u32,
    pub experience: u32,
    pub education: u32,
    pub soft_skills: u32,
    /// The model's own average. Kept for reference; `aggregate()` is authoritative.
    pub overall: f64,
    pub summary: String,
}

impl RubricScores {
    /// Mean of the five sub-scores, rounded to two decimals.
    pub fn aggregate(&self) -> f64 {
        let sum = self.job_fit + self.technical_skills + self.experience + self.education + self.soft_skills;
        round2(sum as f64 / 5.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub competency: u32,
    pub cultural_fit: u32,
    pub future_potential: u32,
    pub other_criteria: u32,
    pub bonus_points: u32,
    pub penalty_points: u32,
    pub summary: String,
}

impl CriteriaScores {
    /// Four axes plus bonus minus penalty. May fall below zero.
    pub fn aggregate(&self) -> f64 {
        let axes = self.competency + self.cultural_fit + self.future_potential + self.other_criteria;
        axes as f64 + self.bonus_points as f64 - self.penalty_points as f64
    }
}

/// A validated model reply, tagged by the schema it was requested with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum ScoreCard {
    Rubric(RubricScores),
    Criteria(CriteriaScores),
}

impl ScoreCard {
    pub fn variant(&self) -> SchemaVariant {
        match self {
            ScoreCard::Rubric(_) => SchemaVariant::Rubric,
            ScoreCard::Criteria(_) => SchemaVariant::Criteria,
        }
    }

    pub fn aggregate(&self) -> f64 {
        match self {
            ScoreCard::Rubric(s) => s.aggregate(),
            ScoreCard::Criteria(s) => s.aggregate(),
        }
    }

    /// Aggregate on the 0–100 scale the pass thresholds are expressed in.
    pub fn percent(&self) -> f64 {
        match self {
            ScoreCard::Rubric(s) => round2(s.aggregate() * 10.0),
            ScoreCard::Criteria(s) => s.aggregate(),
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            ScoreCard::Rubric(s) => &s.summary,
            ScoreCard::Criteria(s) => &s.summary,
        }
    }

    /// Sub-scores in declared order.
    pub fn axis_values(&self) -> Vec<(&'static str, f64)> {
        let values: Vec<u32> = match self {
            ScoreCard::Rubric(s) => vec![
                s.job_fit,
                s.technical_skills,
                s.experience,
                s.education,
                s.soft_skills,
            ],
            ScoreCard::Criteria(s) => vec![
                s.competency,
                s.cultural_fit,
                s.future_potential,
                s.other_criteria,
                s.bonus_points,
                s.penalty_points,
            ],
        };
        self.variant()
            .axes()
            .iter()
            .zip(values)
            .map(|(axis, v)| (axis.key, v as f64))
            .collect()
    }
}

/// Validates a model reply against the variant's declared fields and ranges.
pub fn parse_score_card(variant: SchemaVariant, reply: &Value) -> Result<ScoreCard, ScoringError> {
    let obj = reply.as_object().ok_or(ScoringError::NotAnObject)?;
    let mut scores = Vec::with_capacity(variant.axes().len());
    for axis in variant.axes() {
        scores.push(int_field(obj, axis)?);
    }
    let summary = string_field(obj, SUMMARY_KEY)?;

    let card = match variant {
        SchemaVariant::Rubric => ScoreCard::Rubric(RubricScores {
            job_fit: scores[0],
            technical_skills: scores[1],
            experience: scores[2],
            education: scores[3],
            soft_skills: scores[4],
            overall: number_field(obj, OVERALL_KEY, 10)?,
            summary,
        }),
        SchemaVariant::Criteria => ScoreCard::Criteria(CriteriaScores {
            competency: scores[0],
            cultural_fit: scores[1],
            future_potential: scores[2],
            other_criteria: scores[3],
            bonus_points: scores[4],
            penalty_points: scores[5],
            summary,
        }),
    };
    Ok(card)
}

fn int_field(obj: &Map<String, Value>, axis: &ScoreAxis) -> Result<u32, ScoringError> {
    let value = number_field(obj, axis.key, axis.max)?;
    if value.fract() != 0.0 {
        return Err(ScoringError::WrongType {
            field: axis.key,
            expected: "an integer",
        });
    }
    Ok(value as u32)
}

fn number_field(obj: &Map<String, Value>, field: &'static str, max: u32) -> Result<f64, ScoringError> {
    let value = obj
        .get(field)
        .ok_or(ScoringError::MissingField(field))?
        .as_f64()
        .ok_or(ScoringError::WrongType {
            field,
            expected: "a number",
        })?;
    if !(0.0..=max as f64).contains(&value) {
        return Err(ScoringError::OutOfRange { field, value, max });
    }
    Ok(value)
}

fn string_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, ScoringError> {
    obj.get(field)
        .ok_or(ScoringError::MissingField(field))?
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or(ScoringError::WrongType {
            field,
            expected: "a string",
        })
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
