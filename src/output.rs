//! Output formatting and persistence for analysis results.
//!
//! Tables go to CSV, one file per sheet; reports go to pretty-printed JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::contingency::ContingencyTable;
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Creates `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create '{}'", dir.display()))
}

/// Formats a table cell; undefined values (`NaN`) are left blank.
pub fn format_cell(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

/// Writes a table as CSV: a header of `corner` followed by the column labels,
/// then one line per row label.
pub fn write_table(path: &Path, table: &ContingencyTable, corner: &str) -> Result<()> {
    debug!(
        path = %path.display(),
        rows = table.rows().len(),
        cols = table.cols().len(),
        "Writing table"
    );

    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let mut header = vec![corner.to_string()];
    header.extend(table.cols().iter().cloned());
    writer.write_record(&header)?;

    for (i, label) in table.rows().iter().enumerate() {
        let mut record = vec![label.clone()];
        record.extend(table.row(i).iter().map(|&v| format_cell(v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes serializable rows as CSV with a header derived from `T`.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing rows");

    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a value as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_table() -> ContingencyTable {
        ContingencyTable::new(
            vec!["Centre-ville".into(), "Banlieue".into()],
            vec!["Auto".into(), "Modes actifs".into()],
            vec![vec![10.0, 2.5], vec![f64::NAN, 0.0]],
        )
    }

    #[derive(Serialize)]
    struct Row {
        hour: u32,
        trips: u64,
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(10.0), "10");
        assert_eq!(format_cell(2.5), "2.5");
        assert_eq!(format_cell(f64::INFINITY), "inf");
        assert_eq!(format_cell(f64::NAN), "");
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_table());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&vec![1, 2, 3]).unwrap();
    }

    #[test]
    fn test_write_table_layout() {
        let path = temp_path("transod_output_table.csv");
        let _ = fs::remove_file(&path);

        write_table(&path, &sample_table(), "sector").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "sector,Auto,Modes actifs",
                "Centre-ville,10,2.5",
                "Banlieue,,0"
            ]
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_rows_writes_header_once() {
        let path = temp_path("transod_output_rows.csv");
        let _ = fs::remove_file(&path);

        let rows = vec![Row { hour: 7, trips: 12 }, Row { hour: 8, trips: 30 }];
        write_rows(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("hour")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json() {
        let path = temp_path("transod_output_report.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &Row { hour: 5, trips: 1 }).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["hour"], 5);

        fs::remove_file(&path).unwrap();
    }
}
