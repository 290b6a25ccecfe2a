//! Two-way contingency tables over category labels.

use std::collections::BTreeMap;

/// How cell counts are turned into percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalize {
    /// Raw counts.
    #[default]
    None,
    /// Each row sums to 100.
    ByRow,
    /// Each column sums to 100.
    ByColumn,
    /// The whole table sums to 100.
    ByTotal,
}

/// Explicit row and column order to reindex a table into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOrder {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
}

impl CategoryOrder {
    pub fn new<R, C>(rows: impl IntoIterator<Item = R>, cols: impl IntoIterator<Item = C>) -> Self
    where
        R: Into<String>,
        C: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            cols: cols.into_iter().map(Into::into).collect(),
        }
    }
}

/// A dense table of values indexed by (row label, column label).
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    rows: Vec<String>,
    cols: Vec<String>,
    cells: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// # Panics
    ///
    /// Panics if `cells` is not `rows.len()` × `cols.len()`.
    pub fn new(rows: Vec<String>, cols: Vec<String>, cells: Vec<Vec<f64>>) -> Self {
        assert_eq!(cells.len(), rows.len(), "row count mismatch");
        assert!(
            cells.iter().all(|r| r.len() == cols.len()),
            "column count mismatch"
        );
        Self { rows, cols, cells }
    }

    /// Counts co-occurrences of `(row, column)` labels.
    ///
    /// Only labels that occur are present; both axes are sorted.
    pub fn from_pairs<I, R, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
        R: AsRef<str>,
        C: AsRef<str>,
    {
        let mut counts: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (r, c) in pairs {
            *counts
                .entry(r.as_ref().to_string())
                .or_default()
                .entry(c.as_ref().to_string())
                .or_default() += 1.0;
        }

        let mut cols: Vec<String> = counts
            .values()
            .flat_map(|inner| inner.keys().cloned())
            .collect();
        cols.sort();
        cols.dedup();

        let cells = counts
            .values()
            .map(|inner| {
                cols.iter()
                    .map(|c| inner.get(c).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        Self::new(counts.into_keys().collect(), cols, cells)
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn cols(&self) -> &[String] {
        &self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    pub fn row_index(&self, row: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    pub fn col_index(&self, col: &str) -> Option<usize> {
        self.cols.iter().position(|c| c == col)
    }

    pub fn cell(&self, i: usize, j: usize) -> f64 {
        self.cells[i][j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.cells[i]
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        Some(self.cells[self.row_index(row)?][self.col_index(col)?])
    }

    pub fn row_totals(&self) -> Vec<f64> {
        self.cells.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<f64> {
        (0..self.cols.len())
            .map(|j| self.cells.iter().map(|r| r[j]).sum())
            .collect()
    }

    pub fn grand_total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }

    /// Applies `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            cells: self
                .cells
                .iter()
                .map(|r| r.iter().map(|&v| f(v)).collect())
                .collect(),
        }
    }

    /// Converts counts to percentages. A row, column, or table with a zero
    /// total yields `NaN` cells.
    pub fn normalized(&self, mode: Normalize) -> Self {
        let pct = |v: f64, total: f64| {
            if total == 0.0 {
                f64::NAN
            } else {
                v / total * 100.0
            }
        };

        match mode {
            Normalize::None => self.clone(),
            Normalize::ByRow => {
                let totals = self.row_totals();
                self.with_cells(|i, _, v| pct(v, totals[i]))
            }
            Normalize::ByColumn => {
                let totals = self.col_totals();
                self.with_cells(|_, j, v| pct(v, totals[j]))
            }
            Normalize::ByTotal => {
                let total = self.grand_total();
                self.with_cells(|_, _, v| pct(v, total))
            }
        }
    }

    fn with_cells(&self, f: impl Fn(usize, usize, f64) -> f64) -> Self {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, r)| r.iter().enumerate().map(|(j, &v)| f(i, j, v)).collect())
            .collect();
        Self {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            cells,
        }
    }

    /// Reorders both axes to `order`. Labels missing from the table appear
    /// with zero counts; labels not listed in `order` are dropped.
    pub fn reindex(&self, order: &CategoryOrder) -> Self {
        let row_src: Vec<Option<usize>> = order.rows.iter().map(|r| self.row_index(r)).collect();
        let col_src: Vec<Option<usize>> = order.cols.iter().map(|c| self.col_index(c)).collect();

        let cells = row_src
            .iter()
            .map(|ri| {
                col_src
                    .iter()
                    .map(|cj| match (ri, cj) {
                        (Some(i), Some(j)) => self.cells[*i][*j],
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect();

        Self::new(order.rows.clone(), order.cols.clone(), cells)
    }

    /// Drops rows and columns whose total is zero.
    pub fn without_empty(&self) -> Self {
        let row_totals = self.row_totals();
        let col_totals = self.col_totals();
        let keep_rows: Vec<usize> =
            (0..self.rows.len()).filter(|&i| row_totals[i] != 0.0).collect();
        let keep_cols: Vec<usize> =
            (0..self.cols.len()).filter(|&j| col_totals[j] != 0.0).collect();

        Self::new(
            keep_rows.iter().map(|&i| self.rows[i].clone()).collect(),
            keep_cols.iter().map(|&j| self.cols[j].clone()).collect(),
            keep_rows
                .iter()
                .map(|&i| keep_cols.iter().map(|&j| self.cells[i][j]).collect())
                .collect(),
        )
    }

    /// Appends a `name` row of column totals and a `name` column of row totals.
    pub fn with_margins(&self, name: &str) -> Self {
        let row_totals = self.row_totals();
        let mut cells: Vec<Vec<f64>> = self
            .cells
            .iter()
            .zip(&row_totals)
            .map(|(r, &t)| {
                let mut r = r.clone();
                r.push(t);
                r
            })
            .collect();

        let mut bottom = self.col_totals();
        bottom.push(self.grand_total());
        cells.push(bottom);

        let mut rows = self.rows.clone();
        rows.push(name.to_string());
        let mut cols = self.cols.clone();
        cols.push(name.to_string());

        Self::new(rows, cols, cells)
    }

    /// Largest absolute finite cell value, `0.0` for an empty table.
    pub fn max_abs(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }
}

/// Builds a contingency table from `(row, column)` label pairs.
///
/// With an explicit `order`, counts are reindexed into it before
/// normalization, so absent categories show as `0` (or `NaN` when their whole
/// row/column is empty under that normalization).
pub fn crosstab<I, R, C>(
    pairs: I,
    normalize: Normalize,
    order: Option<&CategoryOrder>,
) -> ContingencyTable
where
    I: IntoIterator<Item = (R, C)>,
    R: AsRef<str>,
    C: AsRef<str>,
{
    let counts = ContingencyTable::from_pairs(pairs);
    let counts = match order {
        Some(order) => counts.reindex(order),
        None => counts,
    };
    counts.normalized(normalize)
}

/// Counts co-occurrences of raw integer codes, with both axes in ascending
/// numeric order.
pub fn code_crosstab<I>(pairs: I) -> ContingencyTable
where
    I: IntoIterator<Item = (i64, i64)>,
{
    let pairs: Vec<(i64, i64)> = pairs.into_iter().collect();

    let mut rows: Vec<i64> = pairs.iter().map(|&(r, _)| r).collect();
    rows.sort_unstable();
    rows.dedup();
    let mut cols: Vec<i64> = pairs.iter().map(|&(_, c)| c).collect();
    cols.sort_unstable();
    cols.dedup();

    let order = CategoryOrder::new(
        rows.iter().map(i64::to_string),
        cols.iter().map(i64::to_string),
    );
    crosstab(
        pairs.iter().map(|(r, c)| (r.to_string(), c.to_string())),
        Normalize::None,
        Some(&order),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    /// Rows A, B × columns X, Y with counts [[10, 30], [40, 20]].
    fn sample_pairs() -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        pairs.extend(std::iter::repeat_n(("A", "X"), 10));
        pairs.extend(std::iter::repeat_n(("A", "Y"), 30));
        pairs.extend(std::iter::repeat_n(("B", "X"), 40));
        pairs.extend(std::iter::repeat_n(("B", "Y"), 20));
        pairs
    }

    #[test]
    fn test_counts_and_totals() {
        let t = crosstab(sample_pairs(), Normalize::None, None);

        assert_eq!(t.rows(), ["A", "B"]);
        assert_eq!(t.cols(), ["X", "Y"]);
        assert_eq!(t.get("A", "X"), Some(10.0));
        assert_eq!(t.get("B", "Y"), Some(20.0));
        assert_eq!(t.row_totals(), vec![40.0, 60.0]);
        assert_eq!(t.col_totals(), vec![50.0, 50.0]);
        assert_eq!(t.grand_total(), 100.0);
    }

    #[test]
    fn test_labels_are_sorted_and_absent_ones_omitted() {
        let t = ContingencyTable::from_pairs([("b", "z"), ("a", "y"), ("b", "y")]);
        assert_eq!(t.rows(), ["a", "b"]);
        assert_eq!(t.cols(), ["y", "z"]);
        assert_eq!(t.get("a", "z"), Some(0.0));
        assert_eq!(t.get("c", "z"), None);
    }

    #[test]
    fn test_row_normalized_rows_sum_to_100() {
        let t = crosstab(sample_pairs(), Normalize::ByRow, None);
        for total in t.row_totals() {
            assert!((total - 100.0).abs() < TOLERANCE);
        }
        assert!((t.get("A", "X").unwrap() - 25.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_column_normalized_columns_sum_to_100() {
        let t = crosstab(sample_pairs(), Normalize::ByColumn, None);
        for total in t.col_totals() {
            assert!((total - 100.0).abs() < TOLERANCE);
        }
        assert!((t.get("B", "X").unwrap() - 80.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_total_normalized_sums_to_100() {
        let t = crosstab(sample_pairs(), Normalize::ByTotal, None);
        assert!((t.grand_total() - 100.0).abs() < TOLERANCE);
        assert!((t.get("A", "Y").unwrap() - 30.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_explicit_order_reindexes_fills_and_drops() {
        let order = CategoryOrder::new(["B", "C"], ["Y", "X", "W"]);
        let t = crosstab(sample_pairs(), Normalize::None, Some(&order));

        assert_eq!(t.rows(), ["B", "C"]);
        assert_eq!(t.cols(), ["Y", "X", "W"]);
        assert_eq!(t.row(0), [20.0, 40.0, 0.0]);
        assert_eq!(t.row(1), [0.0, 0.0, 0.0]);
        assert_eq!(t.get("A", "X"), None);
    }

    #[test]
    fn test_explicit_order_missing_row_is_nan_when_row_normalized() {
        let order = CategoryOrder::new(["A", "C"], ["X", "Y", "W"]);
        let t = crosstab(sample_pairs(), Normalize::ByRow, Some(&order));

        assert_eq!(t.get("A", "W"), Some(0.0));
        assert!(t.get("C", "X").unwrap().is_nan());
    }

    #[test]
    fn test_margins() {
        let t = crosstab(sample_pairs(), Normalize::None, None).with_margins("TOTAL");

        assert_eq!(t.shape(), (3, 3));
        assert_eq!(t.get("A", "TOTAL"), Some(40.0));
        assert_eq!(t.get("TOTAL", "Y"), Some(50.0));
        assert_eq!(t.get("TOTAL", "TOTAL"), Some(100.0));
    }

    #[test]
    fn test_without_empty_drops_zero_lines() {
        let order = CategoryOrder::new(["A", "C", "B"], ["W", "X", "Y"]);
        let t = crosstab(sample_pairs(), Normalize::None, Some(&order)).without_empty();

        assert_eq!(t.rows(), ["A", "B"]);
        assert_eq!(t.cols(), ["X", "Y"]);
    }

    #[test]
    fn test_code_crosstab_orders_numerically() {
        let table = code_crosstab([(100, 3), (50, 1), (100, 1), (845, 21), (50, 1)]);

        assert_eq!(table.rows(), &["50", "100", "845"]);
        assert_eq!(table.cols(), &["1", "3", "21"]);
        assert_eq!(table.get("50", "1"), Some(2.0));
        assert_eq!(table.get("845", "3"), Some(0.0));
        assert_eq!(table.grand_total(), 5.0);
    }

    #[test]
    fn test_repeated_pairs_accumulate() {
        let table = ContingencyTable::from_pairs([("A", "X"), ("A", "X"), ("A", "Y")]);
        assert_eq!(table.get("A", "X"), Some(2.0));
        assert_eq!(table.get("A", "Y"), Some(1.0));
    }

    #[test]
    fn test_max_abs_ignores_nan() {
        let t = ContingencyTable::new(
            vec!["r".into()],
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![-3.5, f64::NAN, 2.0]],
        );
        assert_eq!(t.max_abs(), 3.5);
    }
}
