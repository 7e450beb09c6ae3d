//! Path length of a drive.
//!
//! Distances are ellipsoidal (WGS84 geodesic), not haversine.

use geo::{Distance, Geodesic, Point};
use log::{debug, warn};

use crate::series::DriveSeries;
use crate::GpsPoint;

/// Geodesic distance between two GPS points in meters.
pub fn geodesic_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Geodesic::distance(point1, point2)
}

/// Sum of geodesic distances between consecutive points, in meters.
///
/// Duplicate fixes contribute 0. A segment touching an invalid coordinate is
/// skipped rather than poisoning the total with NaN.
pub fn path_length(points: &[GpsPoint]) -> f64 {
    let mut skipped = 0usize;
    let total: f64 = points
        .windows(2)
        .filter_map(|w| {
            if w[0].is_valid() && w[1].is_valid() {
                Some(geodesic_distance(&w[0], &w[1]))
            } else {
                skipped += 1;
                None
            }
        })
        .sum();

    if skipped > 0 {
        warn!(
            "[Distance] Skipped {} segments with invalid coordinates",
            skipped
        );
    }
    total
}

/// Total distance driven in kilometers.
///
/// Series with fewer than two samples have driven nowhere and return 0.
pub fn total_distance_km(series: &DriveSeries) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let km = path_length(&series.positions()) / 1000.0;
    debug!("[Distance] {:.3} km over {} fixes", km, series.len());
    km
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::series_from;
    use approx::assert_relative_eq;

    #[test]
    fn test_short_series_have_no_distance() {
        assert_eq!(total_distance_km(&DriveSeries::default()), 0.0);
        assert_eq!(total_distance_km(&series_from(&[3.0], &[1.0])), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // A degree of latitude at the equator is ~110.57 km on WGS84
        let d = geodesic_distance(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(1.0, 0.0));
        assert_relative_eq!(d, 110_574.0, max_relative = 1e-3);
    }

    #[test]
    fn test_reversed_drive_has_same_length() {
        let series = series_from(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0; 5]);
        let forward = total_distance_km(&series);
        let backward = total_distance_km(&series.reversed());
        assert!(forward > 0.0);
        assert_relative_eq!(forward, backward, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_fix_adds_nothing() {
        let a = GpsPoint::new(-27.70, -51.10);
        let b = GpsPoint::new(-27.71, -51.10);
        let with_dup = path_length(&[a, a, b]);
        let without = path_length(&[a, b]);
        assert_relative_eq!(with_dup, without, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_segment_skipped() {
        let a = GpsPoint::new(-27.70, -51.10);
        let bad = GpsPoint::new(f64::NAN, -51.10);
        let b = GpsPoint::new(-27.71, -51.10);
        let total = path_length(&[a, bad, b]);
        assert_eq!(total, 0.0);
        assert!(path_length(&[a, b, bad]).is_finite());
    }
}
