//! Keeps only the survey rows whose value in one column is a valid code.
//!
//! Rows are copied through untouched, with every column preserved, so the
//! output can feed the next filter or any analysis.

use std::collections::HashSet;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::survey::reader::column_index;
use crate::survey::record::parse_code;

/// Row counts before and after a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FilterSummary {
    pub original: usize,
    pub kept: usize,
    pub removed: usize,
}

/// Copies rows of `input` to `output` when `column` parses to one of
/// `values_to_keep`. The header row is always written.
///
/// # Errors
///
/// Returns an error if `column` is absent from the header, or the CSV cannot
/// be read or written.
#[tracing::instrument(skip(input, output, values_to_keep), fields(values = values_to_keep.len()))]
pub fn filter_rows<W: Write>(
    input: &[u8],
    output: W,
    column: &str,
    values_to_keep: &[i64],
) -> Result<FilterSummary> {
    let keep: HashSet<i64> = values_to_keep.iter().copied().collect();

    let mut rdr = csv::ReaderBuilder::new().from_reader(input);
    let headers = rdr.headers()?.clone();
    let idx = column_index(&headers, column)?;

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&headers)?;

    let mut summary = FilterSummary::default();
    for result in rdr.records() {
        let record = result?;
        summary.original += 1;

        let valid = record
            .get(idx)
            .and_then(parse_code)
            .is_some_and(|code| keep.contains(&code));
        if valid {
            writer.write_record(&record)?;
            summary.kept += 1;
        }
    }
    writer.flush()?;

    summary.removed = summary.original - summary.kept;
    info!(
        original = summary.original,
        kept = summary.kept,
        removed = summary.removed,
        "Filter applied"
    );
    Ok(summary)
}
