//! Candidate normalisation — turns raw hiring-platform JSON into `CandidateRecord`s.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;
use serde_json::Value;
use tracing::debug;

use crate::ingestion::CandidateRecord;

/// Form-field name fragments that identify the desired-compensation answer.
pub const SALARY_FIELD_HINTS: &[&str] = &["salary", "lương", "luong", "compensation"];

/// Removes tags and decodes entities, joining text nodes with single spaces.
pub fn strip_html(raw: &str) -> String {
    join_text_nodes(raw, " ")
}

/// Like `strip_html`, but keeps one line per text node. Used for long
/// descriptions where paragraph breaks matter to the model.
pub fn html_to_text(raw: &str) -> String {
    join_text_nodes(raw, "\n")
}

fn join_text_nodes(raw: &str, separator: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Extracts the first run of digits, ignoring `,` and `.` thousands separators.
///
/// `"2,000 (USD/tháng)"` → `Some(2000)`; strings without a digit and
/// negative amounts → `None`.
pub fn extract_number(raw: &str) -> Option<u64> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = NUMBER
        .get_or_init(|| Regex::new(r"\d[\d.,]*").ok())
        .as_ref()?;
    let found = pattern.find(raw)?;
    if raw[..found.start()].trim_end().ends_with('-') {
        return None;
    }
    let run = found.as_str();
    let digits: String = run.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().ok()
}

/// Renders a JSON scalar as text; the platform sends some ids and statuses as numbers.
fn value_to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// First résumé attachment of a candidate; entries may be bare URLs or `{url}` objects.
pub fn first_resume_url(candidate: &Value) -> Option<String> {
    let first = candidate.get("cvs")?.as_array()?.first()?;
    let url = match first {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("url")?.as_str()?,
        _ => return None,
    };
    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// Desired compensation from the semi-structured `form` field list.
pub fn desired_salary(candidate: &Value) -> Option<u64> {
    let fields = candidate.get("form")?.as_array()?;
    fields
        .iter()
        .find(|field| {
            ["name", "id"].iter().any(|key| {
                field
                    .get(*key)
                    .and_then(|v| v.as_str())
                    .map(|label| {
                        let label = label.to_lowercase();
                        SALARY_FIELD_HINTS.iter().any(|hint| label.contains(hint))
                    })
                    .unwrap_or(false)
            })
        })
        .and_then(|field| match field.get("value") {
            Some(Value::Number(n)) => n.as_u64(),
            other => extract_number(&value_to_text(other)),
        })
}

/// Normalises one raw candidate. Returns `None` when it has no usable résumé.
pub fn normalize_candidate(raw: &Value) -> Option<CandidateRecord> {
    let resume_url = first_resume_url(raw)?;
    let title = raw
        .get("title")
        .and_then(|v| v.as_str())
        .map(strip_html)
        .filter(|t| !t.is_empty());

    Some(CandidateRecord {
        id: value_to_text(raw.get("id")),
        name: strip_html(&value_to_text(raw.get("name"))),
        email: value_to_text(raw.get("email")),
        status: value_to_text(raw.get("status")),
        resume_url,
        desired_salary: desired_salary(raw),
        title,
    })
}

/// Normalises a listing; the output never has more rows than the input.
pub fn normalize_candidates(raw: &[Value]) -> Vec<CandidateRecord> {
    let records: Vec<CandidateRecord> = raw.iter().filter_map(normalize_candidate).collect();
    debug!(
        "Normalised {} candidates, dropped {} without a résumé",
        records.len(),
        raw.len() - records.len()
    );
    records
}
