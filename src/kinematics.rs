//! Per-sample signals derived from a GPS drive series.
//!
//! The first sample of every derived column is NaN: there is no previous
//! sample to difference against, and consumers must treat it as absent.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{DriveMetricsError, Result};
use crate::series::DriveSeries;

/// What to do with a sample whose elapsed time is zero (or negative), where
/// `Δspeed / elapsed_time` has no finite value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroElapsedPolicy {
    /// Leave the sample's acceleration as NaN (absent).
    #[default]
    Skip,
    /// Divide by this many seconds instead.
    Floor(f64),
    /// Fail with [`DriveMetricsError::ZeroElapsedTime`].
    Reject,
}

impl ZeroElapsedPolicy {
    /// A floor must be a positive, finite number of seconds.
    pub fn validate(&self) -> Result<()> {
        if let ZeroElapsedPolicy::Floor(epsilon) = *self {
            if !epsilon.is_finite() || epsilon <= 0.0 {
                return Err(DriveMetricsError::InvalidConfig {
                    message: format!("zero elapsed floor must be positive, got {}", epsilon),
                });
            }
        }
        Ok(())
    }
}

/// Derived columns aligned row-for-row with the source [`DriveSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedGps {
    /// m/s², `(speed[i] - speed[i-1]) / elapsed_time[i]`
    pub acceleration: Vec<f64>,
    /// Degrees, `bearing[i] - bearing[i-1]` with no 0/360 unwrapping
    pub bearing_turn: Vec<f64>,
}

impl DerivedGps {
    pub fn derive(series: &DriveSeries, policy: ZeroElapsedPolicy) -> Result<Self> {
        Ok(Self {
            acceleration: derive_acceleration(series, policy)?,
            bearing_turn: bearing_turns(series),
        })
    }

    pub fn len(&self) -> usize {
        self.acceleration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceleration.is_empty()
    }
}

/// Acceleration from consecutive speed samples.
///
/// A sample whose elapsed time is not positive, or so small that the quotient
/// overflows, is handled by `policy`. The result never holds ±inf.
pub fn derive_acceleration(series: &DriveSeries, policy: ZeroElapsedPolicy) -> Result<Vec<f64>> {
    policy.validate()?;
    let samples = series.samples();
    let mut acceleration = Vec::with_capacity(samples.len());
    if samples.is_empty() {
        return Ok(acceleration);
    }
    acceleration.push(f64::NAN);

    let mut guarded = 0usize;
    for (i, w) in samples.windows(2).enumerate() {
        let index = i + 1;
        let delta_v = w[1].speed - w[0].speed;
        let dt = w[1].elapsed_time;

        let raw = delta_v / dt;
        let value = if dt <= 0.0 || raw.is_infinite() {
            guarded += 1;
            match policy {
                ZeroElapsedPolicy::Skip => f64::NAN,
                ZeroElapsedPolicy::Floor(epsilon) => delta_v / dt.max(epsilon),
                ZeroElapsedPolicy::Reject => {
                    return Err(DriveMetricsError::ZeroElapsedTime { index })
                }
            }
        } else {
            raw
        };
        // A floored quotient can still overflow on absurd speed jumps.
        acceleration.push(if value.is_infinite() { f64::NAN } else { value });
    }

    if guarded > 0 {
        warn!(
            "[Kinematics] {} samples with unusable elapsed time handled by {:?}",
            guarded, policy
        );
    }
    Ok(acceleration)
}

/// Sample-to-sample heading change.
///
/// A turn across north (350° to 10°) reads as -340°, not +20°.
pub fn bearing_turns(series: &DriveSeries) -> Vec<f64> {
    let bearings = series.bearings();
    if bearings.is_empty() {
        return Vec::new();
    }
    std::iter::once(f64::NAN)
        .chain(bearings.windows(2).map(|w| w[1] - w[0]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::series_from;
    use crate::series::GpsSample;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_speed_has_no_acceleration() {
        let series = series_from(&[12.0; 6], &[0.5, 1.0, 0.2, 2.0, 1.0, 1.0]);
        let accel = derive_acceleration(&series, ZeroElapsedPolicy::Skip).unwrap();
        assert_eq!(accel.len(), 6);
        assert!(accel[0].is_nan());
        for a in &accel[1..] {
            assert_relative_eq!(*a, 0.0);
        }
    }

    #[test]
    fn test_acceleration_uses_current_elapsed_time() {
        let series = series_from(&[0.0, 4.0, 1.0], &[1.0, 2.0, 0.5]);
        let accel = derive_acceleration(&series, ZeroElapsedPolicy::Skip).unwrap();
        assert_relative_eq!(accel[1], 2.0);
        assert_relative_eq!(accel[2], -6.0);
    }

    #[test]
    fn test_zero_elapsed_policies() {
        let series = series_from(&[0.0, 2.0, 3.0], &[1.0, 0.0, 1.0]);

        let skipped = derive_acceleration(&series, ZeroElapsedPolicy::Skip).unwrap();
        assert!(skipped[1].is_nan());
        assert_relative_eq!(skipped[2], 1.0);

        let floored = derive_acceleration(&series, ZeroElapsedPolicy::Floor(0.1)).unwrap();
        assert_relative_eq!(floored[1], 20.0);
        assert!(floored.iter().all(|a| !a.is_infinite()));

        let rejected = derive_acceleration(&series, ZeroElapsedPolicy::Reject);
        assert!(matches!(
            rejected,
            Err(DriveMetricsError::ZeroElapsedTime { index: 1 })
        ));
    }

    #[test]
    fn test_invalid_floor_rejected() {
        let series = series_from(&[0.0, 5.0], &[1.0, 0.0]);
        for epsilon in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                derive_acceleration(&series, ZeroElapsedPolicy::Floor(epsilon)),
                Err(DriveMetricsError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_subnormal_elapsed_never_yields_infinity() {
        let series = series_from(&[0.0, 5.0], &[1.0, 1e-320]);

        let skipped = derive_acceleration(&series, ZeroElapsedPolicy::Skip).unwrap();
        assert!(skipped[1].is_nan());

        let floored = derive_acceleration(&series, ZeroElapsedPolicy::Floor(0.1)).unwrap();
        assert_relative_eq!(floored[1], 50.0);

        assert!(matches!(
            derive_acceleration(&series, ZeroElapsedPolicy::Reject),
            Err(DriveMetricsError::ZeroElapsedTime { index: 1 })
        ));
    }

    #[test]
    fn test_guarded_sample_is_not_an_episode() {
        use crate::episodes::{Crossing, EpisodeDetector};

        let mut elapsed = [1.0; 7];
        elapsed[6] = 1e-320;
        let series = series_from(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0], &elapsed);
        let accel = derive_acceleration(&series, ZeroElapsedPolicy::Skip).unwrap();
        let report = EpisodeDetector::new(3.0, Crossing::Above, 5.0)
            .detect_columns(&accel, &series.elapsed_times());
        assert_eq!(report.episode_count, 0);
    }

    #[test]
    fn test_bearing_turn_is_not_unwrapped() {
        let mut samples = series_from(&[10.0; 3], &[1.0; 3]).samples().to_vec();
        let bearings = [350.0, 10.0, 40.0];
        for (sample, bearing) in samples.iter_mut().zip(bearings) {
            *sample = GpsSample { bearing, ..*sample };
        }
        let turns = bearing_turns(&DriveSeries::new(samples));
        assert!(turns[0].is_nan());
        assert_relative_eq!(turns[1], -340.0);
        assert_relative_eq!(turns[2], 30.0);
    }

    #[test]
    fn test_empty_series() {
        let derived =
            DerivedGps::derive(&DriveSeries::default(), ZeroElapsedPolicy::Reject).unwrap();
        assert!(derived.is_empty());
        assert!(derived.bearing_turn.is_empty());
    }
}
