//! Report types written out as JSON or CSV by the CLI.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::chisquare::{ChiSquare, PeriodResiduals};
use crate::analyzers::summary::SectorSummary;
use crate::analyzers::zones::Regression;

/// Sector summary as written to the statistics sheet, rounded for reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub sector: String,
    pub trips: u64,
    pub dominant_mode: String,
    pub dominant_share_pct: String,
    pub sustainable_share_pct: String,
    pub auto_sustainable_ratio: String,
    pub diversity: String,
}

impl From<&SectorSummary> for SummaryRow {
    fn from(s: &SectorSummary) -> Self {
        Self {
            sector: s.sector.clone(),
            trips: s.trips as u64,
            dominant_mode: s.dominant_mode.clone(),
            dominant_share_pct: format!("{:.1}", s.dominant_share),
            sustainable_share_pct: format!("{:.1}", s.sustainable_share),
            auto_sustainable_ratio: format!("{:.2}", s.auto_sustainable_ratio),
            diversity: format!("{:.3}", s.diversity),
        }
    }
}

/// `summary.json` of the `tables` command.
#[derive(Debug, Serialize)]
pub struct TablesReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub trips: usize,
    pub trips_outside_sectors: usize,
    pub sectors: Vec<SummaryRow>,
}

/// Result of the sector × mode test.
#[derive(Debug, Serialize)]
pub struct ChiSquareReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub rows: String,
    pub cols: String,
    pub test: ChiSquare,
}

/// Outcome of one period segment.
#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub period: String,
    pub trips: usize,
    pub test: Option<ChiSquare>,
    pub skipped: Option<String>,
}

/// `periods.json` of the `period-residuals` command.
#[derive(Debug, Serialize)]
pub struct PeriodReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub max_abs_residual: f64,
    pub segments: Vec<SegmentReport>,
}

impl PeriodReport {
    pub fn new(source: &str, residuals: &PeriodResiduals) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.to_string(),
            max_abs_residual: residuals.max_abs_residual,
            segments: residuals
                .segments
                .iter()
                .map(|s| SegmentReport {
                    period: s.period.clone(),
                    trips: s.trips,
                    test: s.result.as_ref().ok().cloned(),
                    skipped: s.result.as_ref().err().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourTotal {
    pub hour: u32,
    pub trips: u64,
}

/// `zones.json` of the `zones` command.
#[derive(Debug, Serialize)]
pub struct ZoneReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub downtown_zone: i64,
    pub zones: usize,
    /// `part_auto` regressed on `distance_km`.
    pub distance_auto_fit: Option<Regression>,
}
