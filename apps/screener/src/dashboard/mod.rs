//! Chart and table data for a scored report.
//!
//! Summary and charts describe the whole report; `table` and
//! `top_by_position` reflect the query's filters and sort order.

pub mod filters;
pub mod handlers;
pub mod stats;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::dashboard::filters::{filter_rows, sort_rows, top_by_position, DashboardQuery, SortKey};
use crate::dashboard::stats::{box_stats, histogram, mean, pearson, BoxStats, HistogramBin, HISTOGRAM_BINS};
use crate::evaluation::report::{LoadedReport, ReportRow};
use crate::scoring::policy::Verdict;
use crate::scoring::schema::{round2, CRITERIA_AXES, RUBRIC_AXES};

/// Radar charts compare at most this many candidates.
pub const MAX_OVERLAY: usize = 5;

const AGGREGATE_COLUMN: &str = "aggregate_score";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Unknown sort column '{0}'")]
    UnknownSortKey(String),

    #[error("No candidate named '{0}' in the report")]
    UnknownCandidate(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub scored: usize,
    pub mean_aggregate: Option<f64>,
    pub max_aggregate: Option<f64>,
    pub min_aggregate: Option<f64>,
    pub passed: usize,
    /// Percentage of Pass among rows with a Pass/Fail verdict.
    pub pass_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub bins: Vec<HistogramBin>,
    #[serde(rename = "box")]
    pub box_stats: Option<BoxStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisStats {
    pub axis: String,
    #[serde(flatten)]
    pub stats: BoxStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPoint {
    pub axis: String,
    pub value: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Radar {
    pub name: String,
    pub position: String,
    pub aggregate: Option<f64>,
    pub summary: String,
    pub points: Vec<RadarPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalaryPoint {
    pub name: String,
    pub salary: u64,
    pub aggregate: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictCount {
    pub verdict: Verdict,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionVerdicts {
    pub position: String,
    pub pass: usize,
    pub fail: usize,
    pub unassigned: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub distribution: Distribution,
    pub correlation: CorrelationMatrix,
    pub axis_comparison: Vec<AxisStats>,
    pub radar: Option<Radar>,
    pub overlay_radar: Vec<Radar>,
    pub salary_scatter: Vec<SalaryPoint>,
    pub verdict_pie: Vec<VerdictCount>,
    pub verdict_by_position: Vec<PositionVerdicts>,
    pub table: Vec<ReportRow>,
    pub top_by_position: BTreeMap<String, Vec<ReportRow>>,
}

fn aggregates(rows: &[ReportRow]) -> Vec<f64> {
    rows.iter().filter_map(|r| r.aggregate).collect()
}

fn column_value(row: &ReportRow, column: &str) -> Option<f64> {
    if column == AGGREGATE_COLUMN {
        row.aggregate
    } else {
        row.score(column)
    }
}

fn summarize(rows: &[ReportRow]) -> Summary {
    let values = aggregates(rows);
    let passed = rows.iter().filter(|r| r.verdict == Verdict::Pass).count();
    let decided = rows.iter().filter(|r| r.verdict.is_decided()).count();
    Summary {
        total: rows.len(),
        scored: values.len(),
        mean_aggregate: mean(&values).map(round2),
        max_aggregate: values.iter().copied().reduce(f64::max),
        min_aggregate: values.iter().copied().reduce(f64::min),
        passed,
        pass_rate: (decided > 0).then(|| round2(passed as f64 * 100.0 / decided as f64)),
    }
}

fn correlation(report: &LoadedReport) -> CorrelationMatrix {
    let columns: Vec<String> = report
        .axes
        .iter()
        .cloned()
        .chain(std::iter::once(AGGREGATE_COLUMN.to_string()))
        .collect();

    let values = columns
        .iter()
        .map(|a| {
            columns
                .iter()
                .map(|b| {
                    let pairs: Vec<(f64, f64)> = report
                        .rows
                        .iter()
                        .filter_map(|r| Some((column_value(r, a)?, column_value(r, b)?)))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix { columns, values }
}

fn axis_comparison(report: &LoadedReport) -> Vec<AxisStats> {
    report
        .axes
        .iter()
        .filter_map(|axis| {
            let values: Vec<f64> = report.rows.iter().filter_map(|r| r.score(axis)).collect();
            box_stats(&values).map(|stats| AxisStats {
                axis: axis.clone(),
                stats,
            })
        })
        .collect()
}

/// Declared upper bound of a score column, looking through `soft_`/`hard_` prefixes.
/// The bare name is tried first: `soft_skills` is itself a rubric axis.
fn declared_max(column: &str) -> Option<f64> {
    let lookup = |key: &str| {
        RUBRIC_AXES
            .iter()
            .chain(CRITERIA_AXES.iter())
            .find(|axis| axis.key == key)
            .map(|axis| axis.max as f64)
    };
    lookup(column).or_else(|| {
        column
            .strip_prefix("soft_")
            .or_else(|| column.strip_prefix("hard_"))
            .and_then(lookup)
    })
}

fn radar_axes(report: &LoadedReport) -> Vec<(String, f64)> {
    report
        .axes
        .iter()
        .filter(|axis| !axis.ends_with("aggregate"))
        .map(|axis| {
            let max = declared_max(axis).unwrap_or_else(|| {
                let observed = report
                    .rows
                    .iter()
                    .filter_map(|r| r.score(axis))
                    .fold(0.0, f64::max);
                if observed > 0.0 {
                    observed
                } else {
                    1.0
                }
            });
            (axis.clone(), max)
        })
        .collect()
}

fn radar_for(row: &ReportRow, axes: &[(String, f64)]) -> Radar {
    Radar {
        name: row.candidate.name.clone(),
        position: row.position.clone(),
        aggregate: row.aggregate,
        summary: row.summary.clone(),
        points: axes
            .iter()
            .filter_map(|(axis, max)| {
                row.score(axis).map(|value| RadarPoint {
                    axis: axis.clone(),
                    value,
                    max: *max,
                })
            })
            .collect(),
    }
}

fn find_candidate<'a>(rows: &'a [ReportRow], name: &str) -> Result<&'a ReportRow, DashboardError> {
    rows.iter()
        .find(|r| r.candidate.name == name || r.candidate.id == name)
        .ok_or_else(|| DashboardError::UnknownCandidate(name.to_string()))
}

fn verdict_counts(rows: &[ReportRow]) -> (Vec<VerdictCount>, Vec<PositionVerdicts>) {
    let pie = [Verdict::Pass, Verdict::Fail, Verdict::Unassigned]
        .into_iter()
        .map(|verdict| VerdictCount {
            verdict,
            count: rows.iter().filter(|r| r.verdict == verdict).count(),
        })
        .collect();

    let mut by_position: BTreeMap<&str, PositionVerdicts> = BTreeMap::new();
    for row in rows {
        let entry = by_position
            .entry(row.position.as_str())
            .or_insert_with(|| PositionVerdicts {
                position: row.position.clone(),
                ..Default::default()
            });
        match row.verdict {
            Verdict::Pass => entry.pass += 1,
            Verdict::Fail => entry.fail += 1,
            Verdict::Unassigned => entry.unassigned += 1,
        }
    }
    (pie, by_position.into_values().collect())
}

pub fn build_dashboard(report: &LoadedReport, query: &DashboardQuery) -> Result<Dashboard, DashboardError> {
    let rows = &report.rows;
    let sort_key = SortKey::parse(query.sort_by.as_deref(), &report.axes)?;

    let axes = radar_axes(report);
    let radar = match query.candidate.as_deref() {
        Some(name) => Some(radar_for(find_candidate(rows, name)?, &axes)),
        None => rows.first().map(|row| radar_for(row, &axes)),
    };

    let compared = query.compared();
    if compared.len() > MAX_OVERLAY {
        debug!(
            "Overlay radar limited to {} of {} requested candidates",
            MAX_OVERLAY,
            compared.len()
        );
    }
    let overlay_radar = compared
        .iter()
        .take(MAX_OVERLAY)
        .map(|name| find_candidate(rows, name).map(|row| radar_for(row, &axes)))
        .collect::<Result<Vec<_>, _>>()?;

    let values = aggregates(rows);
    let salary_scatter = rows
        .iter()
        .filter_map(|r| {
            Some(SalaryPoint {
                name: r.candidate.name.clone(),
                salary: r.candidate.desired_salary?,
                aggregate: r.aggregate?,
                verdict: r.verdict,
            })
        })
        .collect();
    let (verdict_pie, verdict_by_position) = verdict_counts(rows);

    let mut view = filter_rows(rows, query.min_score, &query.position_filter());
    sort_rows(&mut view, &sort_key, query.descending);
    let top = top_by_position(&view, query.top_n())
        .into_iter()
        .map(|(position, group)| (position, group.into_iter().cloned().collect()))
        .collect();

    Ok(Dashboard {
        summary: summarize(rows),
        distribution: Distribution {
            bins: histogram(&values, HISTOGRAM_BINS),
            box_stats: box_stats(&values),
        },
        correlation: correlation(report),
        axis_comparison: axis_comparison(report),
        radar,
        overlay_radar,
        salary_scatter,
        verdict_pie,
        verdict_by_position,
        table: view.into_iter().cloned().collect(),
        top_by_position: top,
    })
}
