//! Band → job description lookup table, read from a CSV at every run.
//!
//! Expected header: `Band,Job_name,Job_Description`; one row per band.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::Serialize;
use thiserror::Error;

use crate::evaluation::report::{strip_bom, ColumnIndex, ReportError};
use crate::scoring::policy::SalaryBand;

#[derive(Debug, Error)]
pub enum JobBandError {
    #[error("Cannot read job band table {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Job band table is malformed: {0}")]
    Malformed(#[from] ReportError),

    #[error("Unknown band label '{0}'")]
    UnknownBand(String),

    #[error("Band '{0}' appears more than once")]
    DuplicateBand(&'static str),

    #[error("Band '{0}' has no job description")]
    MissingBand(&'static str),
}

impl From<csv::Error> for JobBandError {
    fn from(err: csv::Error) -> Self {
        JobBandError::Malformed(ReportError::Csv(err))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobBand {
    pub band: SalaryBand,
    pub job_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobBandTable {
    bands: Vec<JobBand>,
}

impl JobBandTable {
    pub fn load(path: &Path) -> Result<Self, JobBandError> {
        let bytes = std::fs::read(path).map_err(|source| JobBandError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(&bytes)
    }

    /// Parses the table; every band must be described exactly once.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, JobBandError> {
        let mut reader = ReaderBuilder::new().from_reader(strip_bom(bytes));
        let columns = ColumnIndex::new(reader.headers()?);
        let band_col = columns.require("Band")?;
        let name_col = columns.require("Job_name")?;
        let desc_col = columns.require("Job_Description")?;

        let mut bands: Vec<JobBand> = Vec::new();
        for row in reader.records() {
            let row = row?;
            let label = row.get(band_col).unwrap_or_default();
            let band = SalaryBand::from_label(label)
                .ok_or_else(|| JobBandError::UnknownBand(label.to_string()))?;
            if bands.iter().any(|b| b.band == band) {
                return Err(JobBandError::DuplicateBand(band.label()));
            }
            bands.push(JobBand {
                band,
                job_name: row.get(name_col).unwrap_or_default().trim().to_string(),
                description: row.get(desc_col).unwrap_or_default().trim().to_string(),
            });
        }

        for band in SalaryBand::ALL {
            let described = bands
                .iter()
                .any(|b| b.band == band && !b.description.is_empty());
            if !described {
                return Err(JobBandError::MissingBand(band.label()));
            }
        }

        bands.sort_by_key(|b| b.band);
        Ok(Self { bands })
    }

    pub fn get(&self, band: SalaryBand) -> Option<&JobBand> {
        self.bands.iter().find(|b| b.band == band)
    }

    pub fn bands(&self) -> &[JobBand] {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = "\u{feff}Band,Job_name,Job_Description\n\
        under_500,Intern,\"Learn fast, help the team\"\n\
        500_999,Junior Developer,Ship features\n\
        1000_1499,Developer,Own services\n\
        1500_plus,Senior Developer,Lead architecture\n";

    #[test]
    fn test_from_csv_reads_every_band() {
        let table = JobBandTable::from_csv(TABLE.as_bytes()).unwrap();
        assert_eq!(table.bands().len(), 4);
        let intern = table.get(SalaryBand::Under500).unwrap();
        assert_eq!(intern.job_name, "Intern");
        assert_eq!(intern.description, "Learn fast, help the team");
        assert_eq!(
            table.get(SalaryBand::From1500).unwrap().job_name,
            "Senior Developer"
        );
    }

    #[test]
    fn test_missing_band_rejected() {
        let csv = "Band,Job_name,Job_Description\nunder_500,Intern,x\n500_999,Junior,y\n";
        assert!(matches!(
            JobBandTable::from_csv(csv.as_bytes()),
            Err(JobBandError::MissingBand("1000_1499"))
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_band_rejected() {
        let unknown = "Band,Job_name,Job_Description\nsomething,X,y\n";
        assert!(matches!(
            JobBandTable::from_csv(unknown.as_bytes()),
            Err(JobBandError::UnknownBand(_))
        ));

        let duplicate = "Band,Job_name,Job_Description\nunder_500,X,y\nunder_500,Z,w\n";
        assert!(matches!(
            JobBandTable::from_csv(duplicate.as_bytes()),
            Err(JobBandError::DuplicateBand("under_500"))
        ));
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "Band,Job_name\nunder_500,X\n";
        assert!(matches!(
            JobBandTable::from_csv(csv.as_bytes()),
            Err(JobBandError::Malformed(ReportError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();
        let table = JobBandTable::load(file.path()).unwrap();
        assert_eq!(table.get(SalaryBand::From1000).unwrap().job_name, "Developer");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = JobBandTable::load(Path::new("/nonexistent/job_descriptions.csv")).unwrap_err();
        assert!(matches!(err, JobBandError::Io { .. }));
    }
}
