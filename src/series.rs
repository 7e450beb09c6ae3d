//! GPS drive series: the immutable source of truth for one recorded drive.
//!
//! A [`DriveSeries`] owns its samples and is never mutated by the engine.
//! Derivations read it and hand back new columns (see
//! [`crate::kinematics::DerivedGps`]) so the same series can be re-run with
//! different thresholds.

use serde::{Deserialize, Serialize};

use crate::{Bounds, GpsPoint};

/// One GPS/kinematics row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    /// Seconds since epoch
    pub timestamp: f64,
    /// Seconds since the previous sample (the first row carries a sentinel)
    pub elapsed_time: f64,
    pub position: GpsPoint,
    /// Meters per second
    pub speed: f64,
    /// Meters
    pub elevation: f64,
    /// Compass heading of travel in degrees, [0, 360)
    pub bearing: f64,
    pub hdop: f64,
    pub pdop: f64,
    pub vdop: f64,
}

/// Dilution-of-precision channel reported by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DopChannel {
    Horizontal,
    Positional,
    Vertical,
}

impl DopChannel {
    pub const ALL: [DopChannel; 3] = [
        DopChannel::Horizontal,
        DopChannel::Positional,
        DopChannel::Vertical,
    ];

    /// Column name used by the GPS table.
    pub fn column_name(&self) -> &'static str {
        match self {
            DopChannel::Horizontal => "hdop",
            DopChannel::Positional => "pdop",
            DopChannel::Vertical => "vdop",
        }
    }

    fn read(&self, sample: &GpsSample) -> f64 {
        match self {
            DopChannel::Horizontal => sample.hdop,
            DopChannel::Positional => sample.pdop,
            DopChannel::Vertical => sample.vdop,
        }
    }
}

/// Ordered GPS samples for a single drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveSeries {
    samples: Vec<GpsSample>,
}

impl DriveSeries {
    pub fn new(samples: Vec<GpsSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[GpsSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// A copy of this series in reverse sample order.
    pub fn reversed(&self) -> Self {
        let mut samples = self.samples.clone();
        samples.reverse();
        Self { samples }
    }

    pub fn positions(&self) -> Vec<GpsPoint> {
        self.samples.iter().map(|s| s.position).collect()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    pub fn elapsed_times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.elapsed_time).collect()
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.speed).collect()
    }

    pub fn elevations(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.elevation).collect()
    }

    pub fn bearings(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.bearing).collect()
    }

    pub fn dop(&self, channel: DopChannel) -> Vec<f64> {
        self.samples.iter().map(|s| channel.read(s)).collect()
    }

    /// Whether timestamps never decrease from one sample to the next.
    pub fn is_time_ordered(&self) -> bool {
        self.samples
            .windows(2)
            .all(|w| w[1].timestamp >= w[0].timestamp)
    }

    /// Bounding box of the valid fixes, for map rendering.
    pub fn bounds(&self) -> Option<Bounds> {
        let valid: Vec<GpsPoint> = self
            .samples
            .iter()
            .map(|s| s.position)
            .filter(|p| p.is_valid())
            .collect();
        Bounds::from_points(&valid)
    }
}

/// Mean of the non-NaN values, NaN when there are none.
pub(crate) fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

impl From<Vec<GpsSample>> for DriveSeries {
    fn from(samples: Vec<GpsSample>) -> Self {
        Self::new(samples)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a series along a meridian from parallel speed/elapsed columns.
    /// Positions advance roughly 11m north per sample.
    pub fn series_from(speeds: &[f64], elapsed: &[f64]) -> DriveSeries {
        let mut timestamp = 1_600_000_000.0;
        let samples = speeds
            .iter()
            .zip(elapsed)
            .enumerate()
            .map(|(i, (&speed, &elapsed_time))| {
                if i > 0 {
                    timestamp += elapsed_time;
                }
                GpsSample {
                    timestamp,
                    elapsed_time,
                    position: GpsPoint::new(-27.70 + i as f64 * 0.0001, -51.10),
                    speed,
                    elevation: 600.0 + i as f64,
                    bearing: 0.0,
                    hdop: 1.0,
                    pdop: 1.5,
                    vdop: 1.2,
                }
            })
            .collect();
        DriveSeries::new(samples)
    }
}
