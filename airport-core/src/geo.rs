//! Distances between airports.
//!
//! Uses the Vincenty inverse solution on the WGS-84 ellipsoid. The iteration
//! does not converge for nearly antipodal points; those fall back to the
//! spherical haversine distance.

use serde::{Deserialize, Serialize};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;
const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Whole kilometres between two points, truncated.
pub fn distance_km(a: Coordinates, b: Coordinates) -> i64 {
    let meters = vincenty_meters(a, b).unwrap_or_else(|| haversine_km(a, b) * 1000.0);
    (meters / 1000.0).trunc() as i64
}

pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

fn vincenty_meters(a: Coordinates, b: Coordinates) -> Option<f64> {
    let minor = (1.0 - WGS84_F) * WGS84_A;
    let l = (b.lon - a.lon).to_radians();
    let u1 = ((1.0 - WGS84_F) * a.lat.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * b.lat.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos_sq_alpha = 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - minor * minor) / (minor * minor);
            let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
            return Some(minor * big_a * (sigma - delta_sigma));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANAA: Coordinates = Coordinates { lat: -17.3595, lon: -145.494 };
    const AALBORG: Coordinates = Coordinates { lat: 57.0952, lon: 9.85606 };

    #[test]
    fn test_anaa_to_aalborg() {
        assert_eq!(distance_km(ANAA, AALBORG), 15142);
    }

    #[test]
    fn test_distance_is_symmetric() {
        assert_eq!(distance_km(ANAA, AALBORG), distance_km(AALBORG, ANAA));
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_km(ANAA, ANAA), 0);
    }

    #[test]
    fn test_antipodal_points_fall_back_to_sphere() {
        let a = Coordinates { lat: 0.0, lon: 0.0 };
        let b = Coordinates { lat: 0.5, lon: 179.7 };
        let km = distance_km(a, b);
        assert!(km > 19_900 && km < 20_100, "got {}", km);
    }

    #[test]
    fn test_haversine_roughly_matches_ellipsoid() {
        let sphere = haversine_km(ANAA, AALBORG);
        assert!((sphere - 15142.0).abs() < 10.0);
    }
}
