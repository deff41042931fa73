//! Haversine travel-time matrix provider.
//!
//! Uses great-circle distance and an assumed walking/transit speed to
//! estimate travel time. Ignores the road network, which is fine here: the
//! solver only needs a consistent pairwise estimate.

use crate::traits::TravelTimeProvider;

/// Average travel speed assumption for time estimation.
const DEFAULT_SPEED_KMPH: f64 = 20.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based travel-time matrix provider.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average travel speed in km/h.
    pub speed_kmph: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmph: DEFAULT_SPEED_KMPH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmph: f64) -> Self {
        Self { speed_kmph }
    }

    /// Calculate haversine distance between two points in kilometers.
    fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lon1) = from;
        let (lat2, lon2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lon = (lon2 - lon1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time in whole minutes, rounding up
    /// so short hops never collapse to zero.
    fn km_to_minutes(&self, km: f64) -> i32 {
        let hours = km / self.speed_kmph;
        (hours * 60.0).ceil() as i32
    }
}

impl TravelTimeProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<i32>> {
        let n = locations.len();
        let mut matrix = vec![vec![0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    let km = Self::haversine_km(*from, *to);
                    matrix[i][j] = self.km_to_minutes(km);
                }
            }
        }

        matrix
    }
}
