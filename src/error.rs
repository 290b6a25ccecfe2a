//! Domain errors raised while building mappings or running an analysis.
//!
//! IO and parsing failures travel as [`anyhow::Error`]; these enums cover the
//! cases a caller is expected to match on.

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("code {code} is listed under both '{first}' and '{second}' in the {mapping} mapping")]
    DuplicateCode {
        mapping: String,
        code: i64,
        first: String,
        second: String,
    },
    #[error("time period '{first}' overlaps time period '{second}'")]
    OverlappingPeriods { first: String, second: String },
    #[error("time period '{name}' has an empty interval [{start}, {end})")]
    EmptyPeriod { name: String, start: u32, end: u32 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(
        "insufficient data for this segment: {rows} row and {cols} column categories \
         (need at least 2 of each)"
    )]
    InsufficientData { rows: usize, cols: usize },
    #[error("required column '{column}' is missing from the input header")]
    MissingColumn { column: String },
    #[error("zone {zone} has no coordinates in the zone table")]
    UnknownZone { zone: i64 },
}
