//! Mapping raw survey codes to named categories.
//!
//! [`CategoryMapping`] handles code-set mappings (zone → sector, mode, purpose)
//! and [`TimePeriods`] the interval-based departure-time periods. [`Catalog`]
//! bundles the mappings in effect for a run and classifies trip records.

pub mod catalog;
pub mod classified;
pub mod mapping;
pub mod time;

pub use catalog::{Catalog, MappingConfig, ModeRoles, Zone};
pub use classified::ClassifiedTrip;
pub use mapping::CategoryMapping;
pub use time::{DepartTime, TimePeriod, TimePeriods};
