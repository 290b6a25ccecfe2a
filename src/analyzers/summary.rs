//! Per-sector modal summary metrics derived from a sector × mode table.

use serde::{Serialize, Serializer};

use crate::analyzers::contingency::{CategoryOrder, ContingencyTable, Normalize, crosstab};
use crate::classify::{ClassifiedTrip, ModeRoles};

pub const SUSTAINABLE: &str = "Durable (TC+Actif)";
pub const NOT_SUSTAINABLE: &str = "Auto/Autres";

/// Modal summary for one sector. Shares are percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSummary {
    pub sector: String,
    pub trips: f64,
    pub dominant_mode: String,
    pub dominant_share: f64,
    pub sustainable_share: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub auto_sustainable_ratio: f64,
    pub diversity: f64,
}

/// JSON has no infinity; an undefined ratio is written as the string `"inf"`.
fn serialize_ratio<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    if value.is_infinite() {
        s.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
    } else {
        s.serialize_f64(*value)
    }
}

/// Column with the largest share; the first one wins a tie.
pub fn dominant<'t>(labels: &'t [String], shares: &[f64]) -> Option<(&'t str, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (j, &v) in shares.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((j, v));
        }
    }
    best.map(|(j, v)| (labels[j].as_str(), v))
}

/// `auto / (transit + active)`, or `+inf` when nobody uses a sustainable mode.
pub fn auto_sustainable_ratio(auto: f64, transit: f64, active: f64) -> f64 {
    let sustainable = transit + active;
    if sustainable > 0.0 {
        auto / sustainable
    } else {
        f64::INFINITY
    }
}

/// Shannon entropy `-Σ p ln p` of a row of percentage shares, skipping zeros.
pub fn shannon_diversity(shares_pct: &[f64]) -> f64 {
    shares_pct
        .iter()
        .map(|v| v / 100.0)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Summarizes every sector row of a sector × mode count table.
///
/// Rows without trips are skipped. A role column absent from the table counts
/// as a 0% share.
pub fn summarize(counts: &ContingencyTable, roles: &ModeRoles) -> Vec<SectorSummary> {
    let pct = counts.normalized(Normalize::ByRow);
    let totals = counts.row_totals();
    let share = |i: usize, col: &str| pct.col_index(col).map_or(0.0, |j| pct.cell(i, j));

    pct.rows()
        .iter()
        .enumerate()
        .filter(|&(i, _)| totals[i] > 0.0)
        .filter_map(|(i, sector)| {
            let (dominant_mode, dominant_share) = dominant(pct.cols(), pct.row(i))?;
            let auto = share(i, &roles.auto);
            let transit = share(i, &roles.transit);
            let active = share(i, &roles.active);

            Some(SectorSummary {
                sector: sector.clone(),
                trips: totals[i],
                dominant_mode: dominant_mode.to_string(),
                dominant_share,
                sustainable_share: transit + active,
                auto_sustainable_ratio: auto_sustainable_ratio(auto, transit, active),
                diversity: shannon_diversity(pct.row(i)),
            })
        })
        .collect()
}

/// Row-normalized sector × {not sustainable, sustainable} table, with rows in
/// `sectors` order. Trips whose sector is not listed are left out.
pub fn sustainable_table(
    trips: &[ClassifiedTrip<'_>],
    roles: &ModeRoles,
    sectors: &[String],
) -> ContingencyTable {
    let order = CategoryOrder::new(sectors, [NOT_SUSTAINABLE, SUSTAINABLE]);
    crosstab(
        trips.iter().map(|t| {
            let group = if t.mode == roles.transit || t.mode == roles.active {
                SUSTAINABLE
            } else {
                NOT_SUSTAINABLE
            };
            (t.origin_sector, group)
        }),
        Normalize::ByRow,
        Some(&order),
    )
}
