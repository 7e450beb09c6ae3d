//! # Drive Metrics
//!
//! Driving-quality metrics derived from vehicle sensor logs.
//!
//! This library provides:
//! - Total geodesic distance over a GPS trace
//! - Acceleration and heading change derived from consecutive fixes
//! - Debounced counting of aggressive acceleration, braking and sharp turns
//! - Time spent with degraded GNSS precision
//! - Road-surface label joining for inertial sensor streams
//!
//! Every derivation reads an immutable [`DriveSeries`] and returns new values,
//! so the same drive can be re-evaluated with different thresholds.
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate several drives at once with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use drive_metrics::{analyze_drive, DriveSeries, GpsPoint, GpsSample, MetricsConfig};
//!
//! let samples: Vec<GpsSample> = (0..10)
//!     .map(|i| GpsSample {
//!         timestamp: 1_600_000_000.0 + i as f64,
//!         elapsed_time: 1.0,
//!         position: GpsPoint::new(-27.70 + i as f64 * 0.0001, -51.10),
//!         speed: 11.0,
//!         elevation: 600.0,
//!         bearing: 0.0,
//!         hdop: 0.8,
//!         pdop: 1.2,
//!         vdop: 0.9,
//!     })
//!     .collect();
//!
//! let series = DriveSeries::new(samples);
//! let report = analyze_drive(&series, &MetricsConfig::default()).unwrap();
//! println!("Distance: {:.2} km", report.metrics.total_distance_km);
//! assert_eq!(report.metrics.aggressive_accel_count, 0);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{DriveMetricsError, OptionExt, Result};

// GPS drive series (source of truth for one drive)
pub mod series;
pub use series::{DopChannel, DriveSeries, GpsSample};

// Inertial sensor frames and channel naming
pub mod inertial;
pub use inertial::{Axis, InertialChannel, InertialFrame, MountLocation, SensorKind};

// Geodesic path length
pub mod distance;
pub use distance::{geodesic_distance, path_length, total_distance_km};

// Acceleration and heading change
pub mod kinematics;
pub use kinematics::{bearing_turns, derive_acceleration, DerivedGps, ZeroElapsedPolicy};

// Debounced threshold-crossing detection
pub mod episodes;
pub use episodes::{
    Crossing, EpisodeDetector, EpisodeEvent, EpisodeKind, EpisodeReport,
    DEFAULT_COOLDOWN_SECONDS,
};

// GNSS precision auditing
pub mod precision;
pub use precision::{
    audit_precision, poor_precision_seconds, ChannelPrecision, PrecisionReport,
    POOR_DOP_THRESHOLD,
};

// Road annotation labels
pub mod labels;
pub use labels::{
    join_labels, CategoricalColumn, LabelFrame, LabelGroup, LabelSet, LabeledInertialFrame,
};

// Drive-level metrics
pub mod metrics;
pub use metrics::{
    analyze_drive, compute_metrics, summarize, summarize_drives, DriveMetrics, DriveReport,
    DriveSummary,
};
#[cfg(feature = "parallel")]
pub use metrics::summarize_drives_parallel;

// CSV ingestion
pub mod loader;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use drive_metrics::GpsPoint;
/// let point = GpsPoint::new(-27.6993, -51.1039);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Thresholds for the drive metrics engine.
///
/// Missing fields take their defaults when deserialized, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Acceleration magnitude (m/s²) above which acceleration or braking is
    /// aggressive.
    /// Default: 3.0
    pub accel_threshold: f64,

    /// Heading change (degrees between consecutive fixes) above which a turn
    /// is sharp.
    /// Default: 90.0
    pub turn_threshold: f64,

    /// Seconds that must pass between two crossings for both to count.
    /// Default: 5.0
    pub cooldown_seconds: f64,

    /// Dilution of precision above which a fix is poor.
    /// Default: 20.0
    pub dop_threshold: f64,

    /// Handling of samples with zero elapsed time during acceleration
    /// derivation.
    /// Default: skip (acceleration left absent)
    pub zero_elapsed_policy: ZeroElapsedPolicy,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            accel_threshold: 3.0,
            turn_threshold: 90.0,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            dop_threshold: POOR_DOP_THRESHOLD,
            zero_elapsed_policy: ZeroElapsedPolicy::Skip,
        }
    }
}

impl MetricsConfig {
    /// Reject negative or non-finite thresholds.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("accel_threshold", self.accel_threshold),
            ("turn_threshold", self.turn_threshold),
            ("cooldown_seconds", self.cooldown_seconds),
            ("dop_threshold", self.dop_threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(DriveMetricsError::InvalidConfig {
                    message: format!("{} must be a non-negative number, got {}", name, value),
                });
            }
        }
        self.zero_elapsed_policy.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
