//! Candidate listing CSV: the download produced by ingestion and the upload
//! consumed by an evaluation run.

use csv::{ReaderBuilder, WriterBuilder};

use crate::evaluation::report::{finish_csv, strip_bom, ColumnIndex, ReportError, UTF8_BOM};
use crate::ingestion::normalize::extract_number;
use crate::ingestion::CandidateRecord;

const CANDIDATE_HEADERS: [&str; 6] = ["id", "name", "email", "status", "cvs", "desired_salary"];

pub fn candidates_to_csv(records: &[CandidateRecord]) -> Result<Vec<u8>, ReportError> {
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    writer.write_record(CANDIDATE_HEADERS)?;
    for record in records {
        let salary = record
            .desired_salary
            .map(|s| s.to_string())
            .unwrap_or_default();
        writer.write_record([
            record.id.as_str(),
            record.name.as_str(),
            record.email.as_str(),
            record.status.as_str(),
            record.resume_url.as_str(),
            salary.as_str(),
        ])?;
    }
    finish_csv(writer)
}

/// Reads a candidate CSV. `name` and `cvs` are required columns; rows without
/// a résumé link are skipped.
pub fn candidates_from_csv(bytes: &[u8]) -> Result<Vec<CandidateRecord>, ReportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(bytes));
    let columns = ColumnIndex::new(reader.headers()?);
    let name_col = columns.require("name")?;
    let cvs_col = columns.require("cvs")?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let resume_url = cell(Some(cvs_col));
        if resume_url.is_empty() {
            continue;
        }

        records.push(CandidateRecord {
            id: cell(columns.get("id")),
            name: cell(Some(name_col)),
            email: cell(columns.get("email")),
            status: cell(columns.get("status")),
            resume_url,
            desired_salary: extract_number(&cell(columns.get("desired_salary"))),
            title: None,
        });
    }
    Ok(records)
}
