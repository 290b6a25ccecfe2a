//! Departure-hour profiles by category.

use crate::analyzers::contingency::{CategoryOrder, ContingencyTable, Normalize, crosstab};
use crate::classify::ClassifiedTrip;

/// Hours covered by the encoded day, `0..=29`.
pub const ENCODED_HOURS: std::ops::Range<u32> = 0..30;

/// Share of each category's trips departing in each hour (fractions in
/// `[0, 1]`, each row summing to 1). Columns are the encoded hours that occur,
/// ascending; a category with no trip in an hour gets 0.
///
/// Trips with a missing or invalid departure time are left out.
pub fn share_by_hour<'c, F>(trips: &[ClassifiedTrip<'c>], category: F) -> ContingencyTable
where
    F: Fn(&ClassifiedTrip<'c>) -> &'c str,
{
    let pairs: Vec<(&str, u32)> = trips
        .iter()
        .filter_map(|t| Some((category(t), t.encoded_hour()?)))
        .collect();

    let mut hours: Vec<u32> = pairs.iter().map(|&(_, h)| h).collect();
    hours.sort_unstable();
    hours.dedup();

    let mut categories: Vec<&str> = pairs.iter().map(|&(c, _)| c).collect();
    categories.sort_unstable();
    categories.dedup();

    let order = CategoryOrder::new(categories, hours.iter().map(u32::to_string));
    crosstab(
        pairs.iter().map(|&(c, h)| (c, h.to_string())),
        Normalize::ByRow,
        Some(&order),
    )
    .map(|v| v / 100.0)
}

/// Trip counts per wall-clock hour for each category, over hours `0..=23`.
///
/// Only trips inside a declared time period are counted.
pub fn counts_by_clock_hour<'c, F>(trips: &[ClassifiedTrip<'c>], category: F) -> ContingencyTable
where
    F: Fn(&ClassifiedTrip<'c>) -> &'c str,
{
    let pairs: Vec<(&str, String)> = trips
        .iter()
        .filter(|t| t.period.is_some())
        .filter_map(|t| Some((category(t), t.clock_hour()?.to_string())))
        .collect();

    let mut categories: Vec<&str> = pairs.iter().map(|(c, _)| *c).collect();
    categories.sort_unstable();
    categories.dedup();

    let order = CategoryOrder::new(categories, (0..24).map(|h: u32| h.to_string()));
    crosstab(pairs, Normalize::None, Some(&order))
}

/// Total trips per wall-clock hour, reindexed over [`ENCODED_HOURS`] with 0
/// fill. Only trips inside a declared time period are counted.
pub fn totals_by_hour(trips: &[ClassifiedTrip<'_>]) -> Vec<(u32, u64)> {
    let mut totals: Vec<(u32, u64)> = ENCODED_HOURS.map(|h| (h, 0)).collect();
    for hour in trips
        .iter()
        .filter(|t| t.period.is_some())
        .filter_map(ClassifiedTrip::clock_hour)
    {
        totals[hour as usize].1 += 1;
    }
    totals
}
