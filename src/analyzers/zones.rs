//! Zone-level modal shares against distance to downtown, with Pearson
//! correlations and a least-squares fit.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::analyzers::geo::haversine_km;
use crate::analyzers::utility::{covariance, mean, stddev};
use crate::classify::{Catalog, ClassifiedTrip};
use crate::error::AnalysisError;

/// Numeric variables of a [`ZoneProfile`], in matrix order.
pub const VARIABLES: [&str; 4] = ["distance_km", "part_auto", "part_tc", "part_actifs"];

pub const GLOBAL_GROUP: &str = "Global";

/// Modal shares (percentages) of trips originating in one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneProfile {
    pub zone_id: i64,
    pub zone_name: String,
    pub sector: Option<String>,
    pub distance_km: f64,
    pub part_auto: f64,
    pub part_tc: f64,
    pub part_actifs: f64,
    pub total_trips: u64,
}

impl ZoneProfile {
    /// Value of `VARIABLES[i]`.
    pub fn variable(&self, i: usize) -> f64 {
        match i {
            0 => self.distance_km,
            1 => self.part_auto,
            2 => self.part_tc,
            _ => self.part_actifs,
        }
    }
}

/// Builds one profile per catalog zone that has at least one trip with a
/// known mode code, measuring distance from the `downtown` zone.
///
/// # Errors
///
/// [`AnalysisError::UnknownZone`] if `downtown` is not in the zone table.
pub fn zone_profiles(
    trips: &[ClassifiedTrip<'_>],
    catalog: &Catalog,
    downtown: i64,
) -> Result<Vec<ZoneProfile>, AnalysisError> {
    let centre = catalog
        .zone(downtown)
        .ok_or(AnalysisError::UnknownZone { zone: downtown })?;
    let roles = &catalog.roles;

    let mut profiles = Vec::new();
    for zone in &catalog.zones {
        let zone_trips: Vec<&ClassifiedTrip<'_>> = trips
            .iter()
            .filter(|t| t.record.origin_zone == Some(zone.id) && t.record.mode_primary.is_some())
            .collect();
        if zone_trips.is_empty() {
            continue;
        }

        let total = zone_trips.len() as f64;
        let part = |label: &str| {
            zone_trips.iter().filter(|t| t.mode == label).count() as f64 / total * 100.0
        };

        profiles.push(ZoneProfile {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            sector: catalog.sectors.lookup(zone.id).map(str::to_string),
            distance_km: haversine_km(centre.lat, centre.lon, zone.lat, zone.lon),
            part_auto: part(&roles.auto),
            part_tc: part(&roles.transit),
            part_actifs: part(&roles.active),
            total_trips: zone_trips.len() as u64,
        });
    }

    Ok(profiles)
}

/// Pearson correlation coefficient, `None` for fewer than two points or a
/// constant series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(x), mean(y));
    let (sx, sy) = (stddev(x, mx), stddev(y, my));
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some(covariance(x, mx, y, my) / (sx * sy))
}

/// Two-sided p-value of the t-test for a Pearson `r` over `n` points.
///
/// Two points always fit a line exactly, so `n == 2` gives `1.0`.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    let dof = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    let t = r * (dof / denom).sqrt();
    StudentsT::new(0.0, 1.0, dof).map_or(f64::NAN, |dist| 2.0 * dist.sf(t.abs()))
}

/// Star notation for a p-value: `***` below 0.001, `**` below 0.01, `*`
/// below 0.05, empty otherwise.
pub fn significance(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        ""
    }
}

/// One cell of a correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub group: String,
    pub x: &'static str,
    pub y: &'static str,
    pub n: usize,
    pub r: Option<f64>,
    pub p_value: Option<f64>,
    pub significance: &'static str,
}

fn matrix_entries(group: &str, profiles: &[&ZoneProfile]) -> Vec<CorrelationEntry> {
    let series: Vec<Vec<f64>> = (0..VARIABLES.len())
        .map(|i| profiles.iter().map(|p| p.variable(i)).collect())
        .collect();

    let mut entries = Vec::new();
    for i in 0..VARIABLES.len() {
        for j in (i + 1)..VARIABLES.len() {
            let r = pearson(&series[i], &series[j]);
            let p_value = r.map(|r| correlation_p_value(r, profiles.len()));
            entries.push(CorrelationEntry {
                group: group.to_string(),
                x: VARIABLES[i],
                y: VARIABLES[j],
                n: profiles.len(),
                r,
                p_value,
                significance: p_value.map_or("", significance),
            });
        }
    }
    entries
}

/// Pairwise correlations over all zones, then within each sector of
/// `sectors` that has more than two zones.
pub fn correlations(profiles: &[ZoneProfile], sectors: &[String]) -> Vec<CorrelationEntry> {
    let all: Vec<&ZoneProfile> = profiles.iter().collect();
    let mut entries = matrix_entries(GLOBAL_GROUP, &all);

    for sector in sectors {
        let members: Vec<&ZoneProfile> = profiles
            .iter()
            .filter(|p| p.sector.as_deref() == Some(sector.as_str()))
            .collect();
        if members.len() > 2 {
            entries.extend(matrix_entries(sector, &members));
        }
    }
    entries
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub r_squared: f64,
    /// Two-sided p-value for a zero slope.
    pub p_value: f64,
    pub n: usize,
}

/// Fits `y` on `x`; `None` for fewer than two points or constant `x` or `y`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<Regression> {
    let r = pearson(x, y)?;
    let (mx, my) = (mean(x), mean(y));
    let sx = stddev(x, mx);
    let slope = covariance(x, mx, y, my) / (sx * sx);

    Some(Regression {
        slope,
        intercept: my - slope * mx,
        r,
        r_squared: r * r,
        p_value: correlation_p_value(r, x.len()),
        n: x.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::TripRecord;

    const TOLERANCE: f64 = 1e-9;

    fn trip(zone: i64, mode: Option<i64>) -> TripRecord {
        TripRecord {
            origin_zone: Some(zone),
            dest_zone: Some(1),
            mode_primary: mode,
            trip_purpose: Some(10),
            depart_time: Some(800),
        }
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < TOLERANCE);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_linear_regression() {
        let fit = linear_regression(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < TOLERANCE);
        assert!((fit.intercept - 1.0).abs() < TOLERANCE);
        assert!((fit.r_squared - 1.0).abs() < TOLERANCE);
        assert!(fit.p_value < 1e-6);
        assert_eq!(fit.n, 4);
    }

    #[test]
    fn test_regression_p_value_matches_correlation_test() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let fit = linear_regression(&x, &y).unwrap();

        // r = 0.8 over 5 points: t = 0.8 * sqrt(3 / 0.36) = 2.3094, p = 0.1041
        assert!((fit.r - 0.8).abs() < TOLERANCE);
        assert!((fit.p_value - 0.1041).abs() < 1e-3);
        assert_eq!(significance(fit.p_value), "");
    }

    #[test]
    fn test_correlation_p_value_edges() {
        assert_eq!(correlation_p_value(1.0, 2), 1.0);
        assert_eq!(correlation_p_value(-1.0, 10), 0.0);
        assert!((correlation_p_value(0.0, 10) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_significance_marks() {
        assert_eq!(significance(0.0005), "***");
        assert_eq!(significance(0.001), "**");
        assert_eq!(significance(0.009), "**");
        assert_eq!(significance(0.04), "*");
        assert_eq!(significance(0.05), "");
    }

    #[test]
    fn test_zone_profiles_shares_and_distance() {
        let catalog = Catalog::standard().unwrap();
        let records = vec![
            trip(1, Some(1)),
            trip(1, Some(3)),
            trip(1, Some(6)),
            trip(1, Some(99)),
            trip(1, None),
            trip(845, Some(2)),
        ];
        let trips = catalog.classify_all(&records);

        let profiles = zone_profiles(&trips, &catalog, 1).unwrap();

        assert_eq!(profiles.len(), 2);
        let centre = &profiles[0];
        assert_eq!(centre.zone_name, "Ottawa Centre");
        assert_eq!(centre.sector.as_deref(), Some("Centre-ville"));
        assert_eq!(centre.total_trips, 4);
        assert_eq!(centre.distance_km, 0.0);
        assert_eq!(centre.part_auto, 25.0);
        assert_eq!(centre.part_tc, 25.0);
        assert_eq!(centre.part_actifs, 25.0);

        let masson = &profiles[1];
        assert_eq!(masson.sector.as_deref(), Some("Banlieue extérieure"));
        assert_eq!(masson.part_auto, 100.0);
        assert!(masson.distance_km > 20.0);
    }

    #[test]
    fn test_zone_profiles_unknown_downtown() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(
            zone_profiles(&[], &catalog, 2),
            Err(AnalysisError::UnknownZone { zone: 2 })
        );
    }

    #[test]
    fn test_correlations_skip_small_sectors() {
        let profile = |id: i64, sector: &str, d: f64, auto: f64| ZoneProfile {
            zone_id: id,
            zone_name: id.to_string(),
            sector: Some(sector.to_string()),
            distance_km: d,
            part_auto: auto,
            part_tc: 100.0 - auto,
            part_actifs: (id % 3) as f64,
            total_trips: 10,
        };
        let profiles = vec![
            profile(1, "A", 0.0, 20.0),
            profile(2, "A", 5.0, 50.0),
            profile(3, "A", 10.0, 80.0),
            profile(4, "B", 15.0, 90.0),
        ];
        let sectors = vec!["A".to_string(), "B".to_string()];

        let entries = correlations(&profiles, &sectors);

        assert_eq!(entries.len(), 12);
        assert!(entries.iter().all(|e| e.group != "B"));
        let a = entries
            .iter()
            .find(|e| e.group == "A" && e.x == "distance_km" && e.y == "part_auto")
            .unwrap();
        assert!((a.r.unwrap() - 1.0).abs() < TOLERANCE);
        assert!(a.p_value.unwrap() < 0.001);
        assert_eq!(a.significance, "***");
        assert_eq!(a.n, 3);
    }
}
