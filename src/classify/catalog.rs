//! Built-in mapping tables for the 2022 origin-destination survey and the
//! [`Catalog`] that bundles them for a run.
//!
//! The tables can be replaced wholesale, per mapping, from a JSON file:
//!
//! ```json
//! {
//!   "modes": [
//!     { "name": "Auto", "codes": [1, 2] },
//!     { "name": "Transport en commun", "codes": [3, 4, 5] }
//!   ],
//!   "time_periods": [ { "name": "AM", "start": 600, "end": 900 } ]
//! }
//! ```
//!
//! Keys left out of the file keep their built-in table.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::classify::classified::ClassifiedTrip;
use crate::classify::mapping::{CategoryMapping, MappingEntry};
use crate::classify::time::{DepartTime, TimePeriod, TimePeriods};
use crate::error::MappingError;
use crate::survey::record::TripRecord;

pub const SECTOR_FALLBACK: &str = "Autre";
pub const MODE_FALLBACK: &str = "Autres";
pub const PURPOSE_FALLBACK: &str = "Autre";

pub const SECTORS: &[(&str, &[i64])] = &[
    ("Centre-ville", &[1, 50, 100, 240, 600, 800]),
    (
        "Banlieue intérieure",
        &[120, 140, 180, 200, 260, 625, 650, 700, 820],
    ),
    (
        "Banlieue extérieure",
        &[300, 400, 425, 500, 350, 360, 450, 560, 750, 840, 845],
    ),
];

pub const MODES: &[(&str, &[i64])] = &[
    ("Auto", &[1, 2]),
    ("Transport en commun", &[3, 4, 5]),
    ("Modes actifs", &[6, 7, 14, 15]),
    (
        "Autres",
        &[8, 9, 10, 11, 13, 16, 18, 21, 22, 23, 24, 77],
    ),
];

pub const PURPOSES: &[(&str, &[i64])] = &[
    ("Travail", &[10, 11, 12]),
    ("Études", &[20, 30]),
    ("Achats", &[40, 41]),
    ("Loisirs", &[44, 45, 46]),
    ("Retour", &[80]),
    ("Passagers", &[51, 52]),
    ("Autre", &[43, 777, 888]),
];

/// `(name, start, end)` in encoded `HHMM`; the evening runs past midnight.
pub const TIME_PERIODS: &[(&str, u32, u32)] = &[
    ("Matin pointe", 600, 900),
    ("Jour", 900, 1600),
    ("PM pointe", 1600, 1900),
    ("Soir", 1900, 2800),
];

/// `(zone, name, latitude, longitude)` for each report zone.
pub const ZONES: &[(i64, &str, f64, f64)] = &[
    (1, "Ottawa Centre", 45.4215, -75.6972),
    (50, "Ottawa Inner Area", 45.4050, -75.6800),
    (100, "Ottawa East", 45.4350, -75.6500),
    (120, "Beacon Hill", 45.3900, -75.6700),
    (140, "Alta Vista", 45.3850, -75.6600),
    (180, "Hunt Club", 45.3650, -75.6700),
    (200, "Merivale", 45.3700, -75.7200),
    (240, "Ottawa West", 45.3800, -75.7400),
    (260, "Bayshore/Cedarview", 45.3500, -75.7600),
    (300, "Orleans", 45.4700, -75.5200),
    (350, "Rural East", 45.5200, -75.5500),
    (360, "Rural Southeast", 45.3200, -75.5800),
    (400, "South Gloucester/Letrim", 45.3500, -75.5500),
    (425, "South Nepean", 45.3000, -75.7000),
    (450, "Rural Southwest", 45.2500, -75.7500),
    (500, "Kanata/Stittsville", 45.3500, -75.9000),
    (560, "Rural West", 45.4000, -75.9500),
    (600, "Île de Hull", 45.4300, -75.7100),
    (625, "Hull Périphérie", 45.4500, -75.7500),
    (650, "Plateau", 45.4800, -75.7300),
    (700, "Aylmer", 45.4000, -75.8500),
    (750, "Rural Northwest", 45.5500, -75.9000),
    (800, "Gatineau Centre", 45.4650, -75.7200),
    (820, "Gatineau Est", 45.4800, -75.6800),
    (840, "Rural Northeast", 45.5500, -75.6000),
    (845, "Masson-Angers", 45.6000, -75.5500),
];

/// Zone whose centroid anchors the distance-to-downtown variable.
pub const DOWNTOWN_ZONE: i64 = 1;

/// Codes accepted in the raw `modeprimary` column.
pub const VALID_MODE_CODES: &[i64] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 14, 15, 16, 18, 21, 22, 23, 24, 77,
];

/// Codes accepted in the raw `originreportzone` column.
pub fn valid_origin_zones() -> Vec<i64> {
    ZONES.iter().map(|z| z.0).collect()
}

/// A report zone with its centroid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Which mode categories play the auto / transit / active roles in the
/// sector summary metrics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModeRoles {
    pub auto: String,
    pub transit: String,
    pub active: String,
}

impl Default for ModeRoles {
    fn default() -> Self {
        Self {
            auto: "Auto".to_string(),
            transit: "Transport en commun".to_string(),
            active: "Modes actifs".to_string(),
        }
    }
}

/// Mapping override file contents. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    pub sectors: Option<Vec<MappingEntry>>,
    pub modes: Option<Vec<MappingEntry>>,
    pub purposes: Option<Vec<MappingEntry>>,
    pub time_periods: Option<Vec<TimePeriod>>,
    pub zones: Option<Vec<Zone>>,
    pub mode_roles: Option<ModeRoles>,
}

impl MappingConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mapping file '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse mapping file '{path}'"))?;
        Ok(config)
    }
}

/// All mappings in effect for one analysis run.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub sectors: CategoryMapping,
    pub modes: CategoryMapping,
    pub purposes: CategoryMapping,
    pub periods: TimePeriods,
    pub zones: Vec<Zone>,
    pub roles: ModeRoles,
}

fn builtin(
    name: &str,
    table: &[(&str, &[i64])],
    fallback: &str,
) -> Result<CategoryMapping, MappingError> {
    CategoryMapping::new(
        name,
        table.iter().map(|(label, codes)| (*label, codes.iter().copied())),
        fallback,
    )
}

impl Catalog {
    /// The built-in survey tables.
    pub fn standard() -> Result<Self, MappingError> {
        Self::from_config(MappingConfig::default())
    }

    /// Built-in tables with any mapping present in `config` substituted.
    pub fn from_config(config: MappingConfig) -> Result<Self, MappingError> {
        let sectors = match config.sectors {
            Some(entries) => CategoryMapping::from_entries("sector", entries, SECTOR_FALLBACK)?,
            None => builtin("sector", SECTORS, SECTOR_FALLBACK)?,
        };
        let modes = match config.modes {
            Some(entries) => CategoryMapping::from_entries("mode", entries, MODE_FALLBACK)?,
            None => builtin("mode", MODES, MODE_FALLBACK)?,
        };
        let purposes = match config.purposes {
            Some(entries) => CategoryMapping::from_entries("purpose", entries, PURPOSE_FALLBACK)?,
            None => builtin("purpose", PURPOSES, PURPOSE_FALLBACK)?,
        };
        let periods = match config.time_periods {
            Some(periods) => TimePeriods::new(periods)?,
            None => TimePeriods::new(
                TIME_PERIODS
                    .iter()
                    .map(|&(name, start, end)| TimePeriod::new(name, start, end)),
            )?,
        };
        let zones = config.zones.unwrap_or_else(|| {
            ZONES
                .iter()
                .map(|&(id, name, lat, lon)| Zone {
                    id,
                    name: name.to_string(),
                    lat,
                    lon,
                })
                .collect()
        });

        Ok(Self {
            sectors,
            modes,
            purposes,
            periods,
            zones,
            roles: config.mode_roles.unwrap_or_default(),
        })
    }

    /// Loads `path` when given, otherwise the built-in tables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => MappingConfig::load(path)?,
            None => MappingConfig::default(),
        };
        Ok(Self::from_config(config)?)
    }

    pub fn zone(&self, id: i64) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Derives the category labels of one trip. Pure: same record, same result.
    pub fn classify<'c>(&'c self, trip: &TripRecord) -> ClassifiedTrip<'c> {
        let depart = DepartTime::from_code(trip.depart_time);
        ClassifiedTrip {
            record: *trip,
            origin_sector: self.sectors.classify(trip.origin_zone),
            dest_sector: self.sectors.classify(trip.dest_zone),
            mode: self.modes.classify(trip.mode_primary),
            purpose: self.purposes.classify(trip.trip_purpose),
            period: self.periods.classify(depart),
            depart,
        }
    }

    pub fn classify_all<'c>(&'c self, trips: &[TripRecord]) -> Vec<ClassifiedTrip<'c>> {
        trips.iter().map(|t| self.classify(t)).collect()
    }
}
