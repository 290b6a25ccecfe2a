use anyhow::Result;
use csv::StringRecord;
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::survey::record::TripRecord;

pub const ORIGIN_ZONE: &str = "originreportzone";
pub const DEST_ZONE: &str = "destreportzone";
pub const MODE_PRIMARY: &str = "modeprimary";
pub const TRIP_PURPOSE: &str = "trippurpose";
pub const DEPART_TIME: &str = "departtime";

/// Returns the position of `column` in `headers`, or a [`AnalysisError::MissingColumn`].
pub fn column_index(headers: &StringRecord, column: &str) -> Result<usize, AnalysisError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| AnalysisError::MissingColumn {
            column: column.to_string(),
        })
}

/// Parses comma-separated survey rows into [`TripRecord`]s.
///
/// The header row must contain every column in `required`; other columns are
/// ignored. Unparseable numeric cells become missing values.
///
/// # Errors
///
/// Returns an error if a required column is absent or the CSV itself is
/// malformed (for example, a row with the wrong number of fields).
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn read_trips(bytes: &[u8], required: &[&str]) -> Result<Vec<TripRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    for column in required {
        column_index(&headers, column)?;
    }
    debug!(columns = headers.len(), "Header validated");

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: TripRecord = result?;
        rows.push(record);
    }

    info!(rows = rows.len(), "Trip records parsed");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "originreportzone,destreportzone,modeprimary,trippurpose,departtime";

    #[test]
    fn test_read_trips_basic() {
        let data = format!("{HEADER}\n1,50,2,10,730\n300,1,3,80,1745\n");
        let rows = read_trips(data.as_bytes(), &[ORIGIN_ZONE, MODE_PRIMARY]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].origin_zone, Some(300));
        assert_eq!(rows[1].depart_time, Some(1745));
    }

    #[test]
    fn test_read_trips_ignores_extra_columns() {
        let data = "id,modeprimary,weight\n7,4,1.5\n";
        let rows = read_trips(data.as_bytes(), &[MODE_PRIMARY]).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mode_primary, Some(4));
        assert_eq!(rows[0].origin_zone, None);
    }

    #[test]
    fn test_read_trips_missing_required_column() {
        let data = "modeprimary\n1\n";
        let err = read_trips(data.as_bytes(), &[ORIGIN_ZONE]).unwrap_err();

        assert_eq!(
            err.downcast_ref::<AnalysisError>(),
            Some(&AnalysisError::MissingColumn {
                column: ORIGIN_ZONE.into()
            })
        );
    }

    #[test]
    fn test_read_trips_coerces_bad_values() {
        let data = format!("{HEADER}\n1,50,x,,99:99\n");
        let rows = read_trips(data.as_bytes(), &[MODE_PRIMARY]).unwrap();

        assert_eq!(rows[0].mode_primary, None);
        assert_eq!(rows[0].trip_purpose, None);
        assert_eq!(rows[0].depart_time, None);
    }
}
