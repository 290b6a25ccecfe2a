/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_km(45.4215, -75.6972, 45.4215, -75.6972), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_km(45.0, -75.0, 46.0, -75.0);
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let a = haversine_km(45.4215, -75.6972, 45.6000, -75.5500);
        let b = haversine_km(45.6000, -75.5500, 45.4215, -75.6972);
        assert!((a - b).abs() < 1e-9);
        assert!(a > 20.0 && a < 25.0, "got {a}");
    }
}
