//! Merged report rows and their CSV form.
//!
//! A row is built directly from the candidate it scores, so there is exactly one
//! row per successfully evaluated candidate and no join on names.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingestion::normalize::extract_number;
use crate::ingestion::CandidateRecord;
use crate::scoring::policy::{classify, SalaryBand, Verdict, UNASSIGNED_POSITION};
use crate::scoring::schema::ScoreCard;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV is missing required column '{0}'")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write CSV: {0}")]
    Write(String),

    #[error("Row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: {message}")]
    InvalidVerdict { row: usize, message: String },
}

pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

pub fn finish_csv(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, ReportError> {
    writer
        .into_inner()
        .map_err(|e| ReportError::Write(e.to_string()))
}

/// Header name → column position.
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(headers: &StringRecord) -> Self {
        Self::from_names(headers.iter().map(|h| h.trim().to_string()))
    }

    fn from_names(names: impl Iterator<Item = String>) -> Self {
        let mut positions = HashMap::new();
        for (idx, name) in names.enumerate() {
            positions.entry(name).or_insert(idx);
        }
        Self { positions }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<usize, ReportError> {
        self.get(name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreColumn {
    pub name: String,
    pub value: f64,
}

/// One scoring pass. `prefix` is set in dual mode (`soft_` / `hard_`).
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub prefix: Option<&'static str>,
    pub card: ScoreCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(flatten)]
    pub candidate: CandidateRecord,
    pub position: String,
    pub scores: Vec<ScoreColumn>,
    pub aggregate: Option<f64>,
    pub verdict: Verdict,
    pub summary: String,
}

impl ReportRow {
    /// Flattens the passes into one row. The first pass drives the aggregate and verdict.
    pub fn scored(
        candidate: CandidateRecord,
        position: String,
        assessments: Vec<Assessment>,
        band: Option<SalaryBand>,
    ) -> Self {
        let mut scores = Vec::new();
        for assessment in &assessments {
            let prefix = assessment.prefix.unwrap_or_default();
            for (key, value) in assessment.card.axis_values() {
                scores.push(ScoreColumn {
                    name: format!("{prefix}{key}"),
                    value,
                });
            }
            if assessment.prefix.is_some() {
                scores.push(ScoreColumn {
                    name: format!("{prefix}aggregate"),
                    value: assessment.card.aggregate(),
                });
            }
        }

        let primary = assessments.first();
        let summary = assessments
            .iter()
            .map(|a| match a.prefix {
                Some(prefix) => format!("[{}] {}", prefix.trim_end_matches('_'), a.card.summary()),
                None => a.card.summary().to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            candidate,
            position,
            scores,
            aggregate: primary.map(|a| a.card.aggregate()),
            verdict: primary
                .map(|a| classify(a.card.percent(), band))
                .unwrap_or(Verdict::Unassigned),
            summary,
        }
    }

    /// Placeholder for a candidate routed to the unassigned bucket without scoring.
    pub fn unassigned(candidate: CandidateRecord) -> Self {
        Self {
            candidate,
            position: UNASSIGNED_POSITION.to_string(),
            scores: Vec::new(),
            aggregate: None,
            verdict: Verdict::Unassigned,
            summary: String::new(),
        }
    }

    pub fn score(&self, column: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.name == column)
            .map(|s| s.value)
    }
}

const LEADING_COLUMNS: [&str; 7] = [
    "candidate_id",
    "name",
    "email",
    "status",
    "resume_url",
    "desired_salary",
    "position",
];
const TRAILING_COLUMNS: [&str; 3] = ["aggregate_score", "verdict", "summary"];

/// Score columns across all rows, in first-seen order.
pub fn score_columns(rows: &[ReportRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for score in &row.scores {
            if !columns.contains(&score.name) {
                columns.push(score.name.clone());
            }
        }
    }
    columns
}

pub fn report_to_csv(rows: &[ReportRow]) -> Result<Vec<u8>, ReportError> {
    let axes = score_columns(rows);
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());

    let header: Vec<&str> = LEADING_COLUMNS
        .iter()
        .copied()
        .chain(axes.iter().map(String::as_str))
        .chain(TRAILING_COLUMNS.iter().copied())
        .collect();
    writer.write_record(&header)?;

    for row in rows {
        let c = &row.candidate;
        let mut record: Vec<String> = vec![
            c.id.clone(),
            c.name.clone(),
            c.email.clone(),
            c.status.clone(),
            c.resume_url.clone(),
            c.desired_salary.map(|s| s.to_string()).unwrap_or_default(),
            row.position.clone(),
        ];
        for axis in &axes {
            record.push(row.score(axis).map(|v| v.to_string()).unwrap_or_default());
        }
        record.push(row.aggregate.map(|v| v.to_string()).unwrap_or_default());
        record.push(row.verdict.to_string());
        record.push(row.summary.clone());
        writer.write_record(&record)?;
    }
    finish_csv(writer)
}

/// A report read back from CSV for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedReport {
    /// Numeric score columns in header order.
    pub axes: Vec<String>,
    pub rows: Vec<ReportRow>,
}

/// Maps headers of earlier exports onto the current column names.
fn canonical_column(header: &str) -> &str {
    match header.trim() {
        "id" | "Mã ứng viên" => "candidate_id",
        "Tên ứng viên" => "name",
        "Email" => "email",
        "Trạng thái" => "status",
        "cvs" | "Link CV" => "resume_url",
        "Điểm tổng quát" => "aggregate_score",
        "Tóm tắt" => "summary",
        "Mức độ phù hợp" => "job_fit",
        "Kỹ năng kỹ thuật" => "technical_skills",
        "Kinh nghiệm" => "experience",
        "Trình độ học vấn" => "education",
        "Kỹ năng mềm" => "soft_skills",
        other => other,
    }
}

/// Loads a scored report. Requires `name`; any other column that is not a fixed
/// text column and holds only numbers (or blanks) becomes a score axis.
pub fn load_report(bytes: &[u8]) -> Result<LoadedReport, ReportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(bytes));
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| canonical_column(h).to_string())
        .collect();
    let columns = ColumnIndex::from_names(headers.iter().cloned());
    let name_col = columns.require("name")?;

    let records: Vec<StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let cell = |record: &StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let axes: Vec<(String, usize)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            columns.get(name) == Some(*idx)
                && !LEADING_COLUMNS.contains(&name.as_str())
                && !TRAILING_COLUMNS.contains(&name.as_str())
                && !name.is_empty()
                && records.iter().all(|r| {
                    let v = cell(r, Some(*idx));
                    v.is_empty() || v.parse::<f64>().is_ok()
                })
        })
        .map(|(idx, name)| (name.clone(), idx))
        .collect();

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let row_number = i + 1;

        let aggregate = match cell(record, columns.get("aggregate_score")) {
            v if v.is_empty() => None,
            v => Some(v.parse::<f64>().map_err(|_| ReportError::InvalidNumber {
                row: row_number,
                column: "aggregate_score".to_string(),
                value: v.clone(),
            })?),
        };
        let verdict = cell(record, columns.get("verdict"))
            .parse::<Verdict>()
            .map_err(|message| ReportError::InvalidVerdict {
                row: row_number,
                message,
            })?;
        let position = match cell(record, columns.get("position")) {
            p if p.is_empty() => UNASSIGNED_POSITION.to_string(),
            p => p,
        };

        let scores = axes
            .iter()
            .filter_map(|(name, idx)| {
                let v = cell(record, Some(*idx));
                v.parse::<f64>().ok().map(|value| ScoreColumn {
                    name: name.clone(),
                    value,
                })
            })
            .collect();

        rows.push(ReportRow {
            candidate: CandidateRecord {
                id: cell(record, columns.get("candidate_id")),
                name: cell(record, Some(name_col)),
                email: cell(record, columns.get("email")),
                status: cell(record, columns.get("status")),
                resume_url: cell(record, columns.get("resume_url")),
                desired_salary: extract_number(&cell(record, columns.get("desired_salary"))),
                title: None,
            },
            position,
            scores,
            aggregate,
            verdict,
            summary: cell(record, columns.get("summary")),
        });
    }

    Ok(LoadedReport {
        axes: axes.into_iter().map(|(name, _)| name).collect(),
        rows,
    })
}
