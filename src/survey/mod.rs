//! Survey input: trip records, CSV parsing, and valid-code row filtering.

pub mod filter;
pub mod reader;
pub mod record;

pub use filter::{FilterSummary, filter_rows};
pub use reader::read_trips;
pub use record::TripRecord;
