use crate::classify::time::DepartTime;
use crate::survey::record::TripRecord;

/// A trip with its derived category labels.
///
/// Labels borrow from the [`Catalog`](crate::classify::Catalog) that produced
/// them; a classified trip never outlives the run's mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedTrip<'c> {
    pub record: TripRecord,
    pub origin_sector: &'c str,
    pub dest_sector: &'c str,
    pub mode: &'c str,
    pub purpose: &'c str,
    /// `None` when the departure time is missing, invalid, or outside every period.
    pub period: Option<&'c str>,
    pub depart: Option<DepartTime>,
}

impl ClassifiedTrip<'_> {
    /// Wall-clock departure hour, `0..=23`.
    pub fn clock_hour(&self) -> Option<u32> {
        self.depart.map(DepartTime::clock_hour)
    }

    /// Departure hour as encoded, `0..=29`.
    pub fn encoded_hour(&self) -> Option<u32> {
        self.depart.map(DepartTime::encoded_hour)
    }
}
