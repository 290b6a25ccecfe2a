//! Chi-square test of independence on a contingency table, with standardized
//! residuals and Cramér's V.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::{info, warn};

use crate::analyzers::contingency::{ContingencyTable, Normalize, crosstab};
use crate::classify::{Catalog, ClassifiedTrip};
use crate::error::AnalysisError;

/// Result of a chi-square test on one table.
#[derive(Debug, Clone, Serialize)]
pub struct ChiSquare {
    pub statistic: f64,
    pub dof: usize,
    pub n: f64,
    pub cramers_v: f64,
    /// Upper-tail probability of `statistic` under χ²(`dof`).
    pub p_value: f64,
    #[serde(skip)]
    pub observed: ContingencyTable,
    #[serde(skip)]
    pub expected: ContingencyTable,
    /// `(observed - expected) / sqrt(expected)` per cell.
    #[serde(skip)]
    pub residuals: ContingencyTable,
}

/// Expected counts under independence: `row_total * col_total / grand_total`.
pub fn expected_counts(observed: &ContingencyTable) -> ContingencyTable {
    let row_totals = observed.row_totals();
    let col_totals = observed.col_totals();
    let n = observed.grand_total();

    ContingencyTable::new(
        observed.rows().to_vec(),
        observed.cols().to_vec(),
        row_totals
            .iter()
            .map(|r| col_totals.iter().map(|c| r * c / n).collect())
            .collect(),
    )
}

/// Standardized residual `(observed - expected) / sqrt(expected)` per cell.
pub fn standardized_residuals(
    observed: &ContingencyTable,
    expected: &ContingencyTable,
) -> ContingencyTable {
    let (rows, cols) = observed.shape();
    ContingencyTable::new(
        observed.rows().to_vec(),
        observed.cols().to_vec(),
        (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| {
                        let e = expected.cell(i, j);
                        (observed.cell(i, j) - e) / e.sqrt()
                    })
                    .collect()
            })
            .collect(),
    )
}

/// Runs the test on a table of counts.
///
/// Rows and columns with no observations are dropped first. For a 2×2 table
/// (one degree of freedom) the statistic uses Yates' continuity correction;
/// residuals are always uncorrected.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] when fewer than two row or column
/// categories remain.
pub fn chi_square(counts: &ContingencyTable) -> Result<ChiSquare, AnalysisError> {
    let observed = counts.without_empty();
    let (rows, cols) = observed.shape();
    if rows < 2 || cols < 2 {
        return Err(AnalysisError::InsufficientData { rows, cols });
    }

    let expected = expected_counts(&observed);
    let residuals = standardized_residuals(&observed, &expected);
    let dof = (rows - 1) * (cols - 1);

    let mut statistic = 0.0;
    for i in 0..rows {
        for j in 0..cols {
            let o = observed.cell(i, j);
            let e = expected.cell(i, j);
            let diff = if dof == 1 {
                let d = e - o;
                d.signum() * (d.abs() - d.abs().min(0.5))
            } else {
                e - o
            };
            statistic += diff * diff / e;
        }
    }

    let n = observed.grand_total();
    let k = (rows - 1).min(cols - 1) as f64;
    let cramers_v = (statistic / (n * k)).sqrt();
    let p_value = ChiSquared::new(dof as f64).map_or(f64::NAN, |dist| dist.sf(statistic));

    Ok(ChiSquare {
        statistic,
        dof,
        n,
        cramers_v,
        p_value,
        observed,
        expected,
        residuals,
    })
}

/// One time-period panel of the purpose × mode analysis.
#[derive(Debug, Clone)]
pub struct PeriodSegment {
    pub period: String,
    pub trips: usize,
    pub result: Result<ChiSquare, AnalysisError>,
}

/// Purpose × mode chi-square within each time period.
#[derive(Debug, Clone)]
pub struct PeriodResiduals {
    pub segments: Vec<PeriodSegment>,
    /// Largest |residual| across all segments, for a shared colour scale.
    pub max_abs_residual: f64,
}

/// Splits trips by time period and tests purpose × mode independence in each.
///
/// Trips whose purpose or mode code is not declared in the mappings, or whose
/// departure time falls in no period, are left out. Segments with fewer than
/// two purposes or modes are reported as insufficient and skipped.
#[tracing::instrument(skip_all, fields(trips = trips.len()))]
pub fn period_residuals(trips: &[ClassifiedTrip<'_>], catalog: &Catalog) -> PeriodResiduals {
    let mut segments = Vec::new();
    let mut max_abs_residual: f64 = 0.0;

    for period in catalog.periods.names() {
        let pairs: Vec<(&str, &str)> = trips
            .iter()
            .filter(|t| t.period == Some(period))
            .filter_map(|t| {
                let purpose = catalog.purposes.lookup(t.record.trip_purpose?)?;
                let mode = catalog.modes.lookup(t.record.mode_primary?)?;
                Some((purpose, mode))
            })
            .collect();

        let observed = crosstab(pairs.iter().copied(), Normalize::None, None);
        let result = chi_square(&observed);

        match &result {
            Ok(test) => {
                max_abs_residual = max_abs_residual.max(test.residuals.max_abs());
                info!(
                    period,
                    trips = pairs.len(),
                    chi2 = test.statistic,
                    dof = test.dof,
                    cramers_v = test.cramers_v,
                    p_value = test.p_value,
                    "Period tested"
                );
            }
            Err(e) => warn!(period, trips = pairs.len(), error = %e, "Skipping period"),
        }

        segments.push(PeriodSegment {
            period: period.to_string(),
            trips: pairs.len(),
            result,
        });
    }

    PeriodResiduals {
        segments,
        max_abs_residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::TripRecord;

    const TOLERANCE: f64 = 1e-3;

    fn table(cells: Vec<Vec<f64>>) -> ContingencyTable {
        let rows = (0..cells.len()).map(|i| format!("r{i}")).collect();
        let cols = (0..cells[0].len()).map(|j| format!("c{j}")).collect();
        ContingencyTable::new(rows, cols, cells)
    }

    #[test]
    fn test_expected_and_residual_for_2x2() {
        let observed = table(vec![vec![10.0, 30.0], vec![40.0, 20.0]]);
        let test = chi_square(&observed).unwrap();

        assert!((test.expected.cell(0, 0) - 20.0).abs() < TOLERANCE);
        assert!((test.residuals.cell(0, 0) - (-2.236)).abs() < TOLERANCE);
        assert_eq!(test.dof, 1);
        // Yates-corrected: 9.5^2 * (1/20 + 1/20 + 1/30 + 1/30)
        assert!((test.statistic - 15.0417).abs() < TOLERANCE);
        // erfc(sqrt(15.0417 / 2))
        assert!((test.p_value - 1.0516e-4).abs() < 1e-7);
    }

    #[test]
    fn test_independent_table_has_p_value_one() {
        let observed = table(vec![vec![10.0, 20.0, 30.0], vec![20.0, 40.0, 60.0]]);
        let test = chi_square(&observed).unwrap();

        assert!(test.statistic.abs() < 1e-9);
        assert!((test.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_uncorrected_statistic_for_larger_table() {
        let observed = table(vec![vec![10.0, 30.0, 20.0], vec![40.0, 20.0, 30.0]]);
        let test = chi_square(&observed).unwrap();

        let expected_stat: f64 = (0..2)
            .flat_map(|i| (0..3).map(move |j| (i, j)))
            .map(|(i, j)| test.residuals.cell(i, j).powi(2))
            .sum();
        assert_eq!(test.dof, 2);
        assert!((test.statistic - expected_stat).abs() < 1e-9);
        assert!((test.cramers_v - (test.statistic / 150.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let observed = table(vec![vec![5.0, 7.0]]);
        assert_eq!(
            chi_square(&observed).unwrap_err(),
            AnalysisError::InsufficientData { rows: 1, cols: 2 }
        );
    }

    #[test]
    fn test_empty_columns_do_not_count_toward_shape() {
        let observed = table(vec![vec![5.0, 0.0], vec![7.0, 0.0]]);
        assert_eq!(
            chi_square(&observed).unwrap_err(),
            AnalysisError::InsufficientData { rows: 2, cols: 1 }
        );
    }

    fn trip(purpose: i64, mode: i64, time: i64) -> TripRecord {
        TripRecord {
            origin_zone: Some(1),
            dest_zone: Some(1),
            mode_primary: Some(mode),
            trip_purpose: Some(purpose),
            depart_time: Some(time),
        }
    }

    #[test]
    fn test_period_residuals_skips_thin_segments() {
        let catalog = Catalog::standard().unwrap();
        let records = vec![
            // Morning: two purposes × two modes.
            trip(10, 1, 700),
            trip(10, 1, 710),
            trip(10, 3, 720),
            trip(20, 3, 730),
            trip(20, 6, 740),
            // Day: a single purpose.
            trip(40, 1, 1000),
            trip(40, 3, 1100),
            // Unmapped purpose code is left out even though it falls back to "Autre".
            trip(999, 1, 1000),
        ];
        let trips = catalog.classify_all(&records);

        let result = period_residuals(&trips, &catalog);

        assert_eq!(result.segments.len(), 4);
        assert_eq!(result.segments[0].period, "Matin pointe");
        assert!(result.segments[0].result.is_ok());
        assert_eq!(result.segments[1].trips, 2);
        assert!(matches!(
            result.segments[1].result,
            Err(AnalysisError::InsufficientData { rows: 1, .. })
        ));
        assert!(result.segments[3].result.is_err());
        assert!(result.max_abs_residual > 0.0);
    }
}
