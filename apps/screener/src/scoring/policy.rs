//! Compensation bands and the pass/fail policy.
//!
//! | Band        | Desired compensation | Pass threshold |
//! |-------------|----------------------|----------------|
//! | `under_500` | < 500                | 70             |
//! | `500_999`   | [500, 1000)          | 75             |
//! | `1000_1499` | [1000, 1500)         | 80             |
//! | `1500_plus` | ≥ 1500               | 85             |
//!
//! Thresholds apply to the aggregate on a 0–100 scale (`ScoreCard::percent`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position label for candidates without a usable compensation figure.
pub const UNASSIGNED_POSITION: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SalaryBand {
    #[serde(rename = "under_500")]
    Under500,
    #[serde(rename = "500_999")]
    From500,
    #[serde(rename = "1000_1499")]
    From1000,
    #[serde(rename = "1500_plus")]
    From1500,
}

impl SalaryBand {
    pub const ALL: [SalaryBand; 4] = [
        SalaryBand::Under500,
        SalaryBand::From500,
        SalaryBand::From1000,
        SalaryBand::From1500,
    ];

    /// Absent or zero compensation has no band.
    pub fn for_salary(salary: Option<u64>) -> Option<Self> {
        match salary? {
            0 => None,
            s if s < 500 => Some(SalaryBand::Under500),
            s if s < 1000 => Some(SalaryBand::From500),
            s if s < 1500 => Some(SalaryBand::From1000),
            _ => Some(SalaryBand::From1500),
        }
    }

    pub fn threshold(self) -> f64 {
        match self {
            SalaryBand::Under500 => 70.0,
            SalaryBand::From500 => 75.0,
            SalaryBand::From1000 => 80.0,
            SalaryBand::From1500 => 85.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SalaryBand::Under500 => "under_500",
            SalaryBand::From500 => "500_999",
            SalaryBand::From1000 => "1000_1499",
            SalaryBand::From1500 => "1500_plus",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|b| b.label().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
    Unassigned,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
            Verdict::Unassigned => "Unassigned",
        }
    }

    /// Whether the row counts towards the pass rate.
    pub fn is_decided(self) -> bool {
        matches!(self, Verdict::Pass | Verdict::Fail)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" | "đạt" => Ok(Verdict::Pass),
            "fail" | "không đạt" => Ok(Verdict::Fail),
            "" | "unassigned" => Ok(Verdict::Unassigned),
            other => Err(format!("unknown verdict '{other}'")),
        }
    }
}

/// Pass iff the 0–100 aggregate reaches the band's threshold.
/// Candidates without a band are never classified.
pub fn classify(percent: f64, band: Option<SalaryBand>) -> Verdict {
    match band {
        Some(band) if percent >= band.threshold() => Verdict::Pass,
        Some(_) => Verdict::Fail,
        None => Verdict::Unassigned,
    }
}
