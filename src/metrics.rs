//! Drive-level metrics.
//!
//! Runs every derivation over one drive and collects the scalars the
//! dashboard shows, plus the derived columns and episode detail for charts.
//!
//! ## Example
//! ```rust
//! use drive_metrics::{compute_metrics, DriveSeries, MetricsConfig};
//!
//! let metrics = compute_metrics(&DriveSeries::default(), &MetricsConfig::default()).unwrap();
//! assert_eq!(metrics.total_distance_km, 0.0);
//! assert!(metrics.max_speed.is_nan());
//! ```

use log::info;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::distance::total_distance_km;
use crate::episodes::{EpisodeDetector, EpisodeKind, EpisodeReport};
use crate::error::Result;
use crate::kinematics::DerivedGps;
use crate::precision::{audit_precision, PrecisionReport};
use crate::series::{nan_mean, DriveSeries};
use crate::{Bounds, MetricsConfig};

/// Speed, elevation and duration summary of a drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveSummary {
    pub sample_count: usize,
    /// m/s, NaN for an empty drive
    pub max_speed: f64,
    /// m/s, NaN for an empty drive
    pub avg_speed: f64,
    /// Meters, NaN for an empty drive
    pub max_elevation: f64,
    /// Meters, NaN for an empty drive
    pub min_elevation: f64,
    /// Latest minus earliest timestamp, 0 for fewer than two samples
    pub total_time_seconds: f64,
}

/// Scalar metrics for one drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveMetrics {
    pub total_distance_km: f64,
    pub max_speed: f64,
    pub avg_speed: f64,
    pub max_elevation: f64,
    pub min_elevation: f64,
    pub total_time_seconds: f64,
    pub aggressive_accel_count: u32,
    pub aggressive_decel_count: u32,
    pub sharp_turn_count: u32,
    /// Seconds with poor horizontal precision
    pub poor_precision_seconds: f64,
    pub sample_count: usize,
    /// All three DOP channels
    pub precision: PrecisionReport,
    pub bounds: Option<Bounds>,
}

/// Metrics plus the derived columns and episode detail behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveReport {
    pub metrics: DriveMetrics,
    pub derived: DerivedGps,
    pub acceleration_episodes: EpisodeReport,
    pub deceleration_episodes: EpisodeReport,
    pub turn_episodes: EpisodeReport,
}

impl DriveReport {
    pub fn episodes(&self, kind: EpisodeKind) -> &EpisodeReport {
        match kind {
            EpisodeKind::AggressiveAcceleration => &self.acceleration_episodes,
            EpisodeKind::AggressiveDeceleration => &self.deceleration_episodes,
            EpisodeKind::SharpTurn => &self.turn_episodes,
        }
    }
}

fn nan_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NAN, f64::max)
}

fn nan_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NAN, f64::min)
}

/// Speed, elevation and duration summary.
pub fn summarize(series: &DriveSeries) -> DriveSummary {
    let samples = series.samples();
    let total_time_seconds = if samples.len() < 2 {
        0.0
    } else {
        let timestamps = || samples.iter().map(|s| s.timestamp);
        nan_max(timestamps()) - nan_min(timestamps())
    };

    let elevations = series.elevations();
    DriveSummary {
        sample_count: samples.len(),
        max_speed: nan_max(samples.iter().map(|s| s.speed)),
        avg_speed: nan_mean(&series.speeds()),
        max_elevation: nan_max(elevations.iter().copied()),
        min_elevation: nan_min(elevations.iter().copied()),
        total_time_seconds,
    }
}

/// Run one detector kind over its signal from the derived columns.
pub fn detect_episodes(
    series: &DriveSeries,
    derived: &DerivedGps,
    kind: EpisodeKind,
    config: &MetricsConfig,
) -> EpisodeReport {
    let (signal, threshold) = match kind {
        EpisodeKind::AggressiveAcceleration | EpisodeKind::AggressiveDeceleration => {
            (&derived.acceleration, config.accel_threshold)
        }
        EpisodeKind::SharpTurn => (&derived.bearing_turn, config.turn_threshold),
    };
    EpisodeDetector::for_kind(kind, threshold, config.cooldown_seconds)
        .detect_columns(signal, &series.elapsed_times())
}

/// Run the full engine over one drive.
pub fn analyze_drive(series: &DriveSeries, config: &MetricsConfig) -> Result<DriveReport> {
    config.validate()?;

    let summary = summarize(series);
    let derived = DerivedGps::derive(series, config.zero_elapsed_policy)?;

    let deceleration_episodes =
        detect_episodes(series, &derived, EpisodeKind::AggressiveDeceleration, config);
    let acceleration_episodes =
        detect_episodes(series, &derived, EpisodeKind::AggressiveAcceleration, config);
    let turn_episodes = detect_episodes(series, &derived, EpisodeKind::SharpTurn, config);

    let precision = audit_precision(series, config.dop_threshold);

    let metrics = DriveMetrics {
        total_distance_km: total_distance_km(series),
        max_speed: summary.max_speed,
        avg_speed: summary.avg_speed,
        max_elevation: summary.max_elevation,
        min_elevation: summary.min_elevation,
        total_time_seconds: summary.total_time_seconds,
        aggressive_accel_count: acceleration_episodes.episode_count,
        aggressive_decel_count: deceleration_episodes.episode_count,
        sharp_turn_count: turn_episodes.episode_count,
        poor_precision_seconds: precision.horizontal.poor_seconds,
        sample_count: summary.sample_count,
        precision,
        bounds: series.bounds(),
    };

    info!(
        "[Metrics] {} samples, {:.2} km, accel={} decel={} turns={}, poor precision {:.1}s",
        metrics.sample_count,
        metrics.total_distance_km,
        metrics.aggressive_accel_count,
        metrics.aggressive_decel_count,
        metrics.sharp_turn_count,
        metrics.poor_precision_seconds
    );

    Ok(DriveReport {
        metrics,
        derived,
        acceleration_episodes,
        deceleration_episodes,
        turn_episodes,
    })
}

/// Scalar metrics only.
pub fn compute_metrics(series: &DriveSeries, config: &MetricsConfig) -> Result<DriveMetrics> {
    analyze_drive(series, config).map(|report| report.metrics)
}

/// Evaluate several drives, keeping each drive's own result.
pub fn summarize_drives(
    drives: &[(String, DriveSeries)],
    config: &MetricsConfig,
) -> Vec<(String, Result<DriveMetrics>)> {
    drives
        .iter()
        .map(|(id, series)| (id.clone(), compute_metrics(series, config)))
        .collect()
}

/// Evaluate several drives in parallel. Each drive is still processed on a
/// single thread.
#[cfg(feature = "parallel")]
pub fn summarize_drives_parallel(
    drives: &[(String, DriveSeries)],
    config: &MetricsConfig,
) -> Vec<(String, Result<DriveMetrics>)> {
    if drives.len() < 2 {
        return summarize_drives(drives, config);
    }
    drives
        .par_iter()
        .map(|(id, series)| (id.clone(), compute_metrics(series, config)))
        .collect()
}
