//! Table filtering, sorting and per-position rankings.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dashboard::DashboardError;
use crate::evaluation::report::ReportRow;

pub const DEFAULT_TOP_N: usize = 5;

/// Query string of `POST /api/v1/dashboard`. List parameters are comma-separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub min_score: Option<f64>,
    pub positions: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
    pub candidate: Option<String>,
    pub compare: Option<String>,
    pub top_n: Option<usize>,
}

impl DashboardQuery {
    pub fn position_filter(&self) -> Vec<String> {
        split_list(self.positions.as_deref())
    }

    pub fn compared(&self) -> Vec<String> {
        split_list(self.compare.as_deref())
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }
}

pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Aggregate,
    Salary,
    Name,
    Axis(String),
}

impl SortKey {
    /// `aggregate` (default), `salary`, `name`, or one of the report's score columns.
    pub fn parse(raw: Option<&str>, axes: &[String]) -> Result<Self, DashboardError> {
        match raw.map(str::trim) {
            None | Some("") | Some("aggregate") | Some("aggregate_score") => Ok(SortKey::Aggregate),
            Some("salary") | Some("desired_salary") => Ok(SortKey::Salary),
            Some("name") => Ok(SortKey::Name),
            Some(column) if axes.iter().any(|a| a == column) => Ok(SortKey::Axis(column.to_string())),
            Some(other) => Err(DashboardError::UnknownSortKey(other.to_string())),
        }
    }
}

/// Rows whose aggregate reaches `min_score` (rows without one are dropped once a
/// minimum is set) and whose position is selected (no selection keeps all).
pub fn filter_rows<'a>(
    rows: &'a [ReportRow],
    min_score: Option<f64>,
    positions: &[String],
) -> Vec<&'a ReportRow> {
    rows.iter()
        .filter(|row| match min_score {
            Some(min) => row.aggregate.is_some_and(|a| a >= min),
            None => true,
        })
        .filter(|row| positions.is_empty() || positions.contains(&row.position))
        .collect()
}

fn compare_optional(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.total_cmp(&a),
        (Some(a), Some(b)) => a.total_cmp(&b),
        // Missing values sort last in either direction.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort; ties keep report order.
pub fn sort_rows(rows: &mut [&ReportRow], key: &SortKey, descending: bool) {
    rows.sort_by(|a, b| match key {
        SortKey::Aggregate => compare_optional(a.aggregate, b.aggregate, descending),
        SortKey::Salary => compare_optional(
            a.candidate.desired_salary.map(|s| s as f64),
            b.candidate.desired_salary.map(|s| s as f64),
            descending,
        ),
        SortKey::Axis(column) => compare_optional(a.score(column), b.score(column), descending),
        SortKey::Name => {
            let ord = a.candidate.name.to_lowercase().cmp(&b.candidate.name.to_lowercase());
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    });
}

/// Best `n` scored rows of each position, highest aggregate first.
pub fn top_by_position<'a>(rows: &[&'a ReportRow], n: usize) -> BTreeMap<String, Vec<&'a ReportRow>> {
    let mut grouped: BTreeMap<String, Vec<&'a ReportRow>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.aggregate.is_some()) {
        grouped.entry(row.position.clone()).or_default().push(*row);
    }
    for group in grouped.values_mut() {
        sort_rows(group, &SortKey::Aggregate, true);
        group.truncate(n);
    }
    grouped
}
