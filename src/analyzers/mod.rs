//! Aggregation and statistics over classified trips.
//!
//! Contingency tables are the common currency: chi-square residuals, sector
//! summaries and hourly profiles are all computed from them. Flow links and
//! zone correlations work from the classified trips directly.

pub mod chisquare;
pub mod contingency;
pub mod flows;
pub mod geo;
pub mod hourly;
pub mod summary;
pub mod types;
pub mod utility;
pub mod zones;
