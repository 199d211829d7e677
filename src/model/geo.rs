use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.;

///
/// Where (we believe) a client address is located. All fields are optional -
/// an unresolvable address yields an empty location and never blocks a login.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoLocation {
    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

///
/// Great-circle distance between two coordinate pairs.
///
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.).sin().powi(2);
    let c = 2. * a.sqrt().atan2((1. - a).sqrt());

    EARTH_RADIUS_KM * c
}

///
/// A login is suspicious when it originates from a different country AND is
/// further from the previous login than the configured threshold. Missing
/// coordinates on either side mean we can't tell, so it isn't flagged.
///
pub fn is_suspicious(current: &GeoLocation, previous: &GeoLocation, threshold_km: f64) -> bool {
    let (from, to) = match (previous.coordinates(), current.coordinates()) {
        (Some(from), Some(to)) => (from, to),
        _ => return false,
    };

    if current.country.is_none() || previous.country.is_none() || current.country == previous.country {
        return false
    }

    haversine_km(from, to) > threshold_km
}


#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::{assert_gt, assert_lt};

    const LONDON: (f64, f64) = (51.5074, -0.1278);
    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const NEW_YORK: (f64, f64) = (40.7128, -74.0060);

    fn located(country: &str, coords: (f64, f64)) -> GeoLocation {
        GeoLocation {
            country: Some(country.to_string()),
            latitude: Some(coords.0),
            longitude: Some(coords.1),
            ..GeoLocation::default()
        }
    }

    #[test]
    fn should_measure_known_distances() {
        let distance = haversine_km(LONDON, NEW_YORK);
        assert_gt!(distance, 5500.);
        assert_lt!(distance, 5600.);

        let distance = haversine_km(LONDON, PARIS);
        assert_gt!(distance, 330.);
        assert_lt!(distance, 350.);
    }

    #[test]
    fn should_flag_a_distant_foreign_login() {
        assert!(is_suspicious(&located("US", NEW_YORK), &located("GB", LONDON), 1000.));
    }

    #[test]
    fn should_not_flag_a_nearby_foreign_login() {
        assert!(!is_suspicious(&located("FR", PARIS), &located("GB", LONDON), 1000.));
    }

    #[test]
    fn should_not_flag_the_same_country() {
        assert!(!is_suspicious(&located("US", NEW_YORK), &located("US", LONDON), 1000.));
    }

    #[test]
    fn should_not_flag_when_coordinates_are_missing() {
        let unknown = GeoLocation { country: Some("US".to_string()), ..GeoLocation::default() };
        assert!(!is_suspicious(&unknown, &located("GB", LONDON), 1000.));
        assert!(!is_suspicious(&located("US", NEW_YORK), &GeoLocation::default(), 1000.));
    }
}
