//! GNSS precision auditing.
//!
//! Unlike driving events, degraded precision is a duration: every sample over
//! the threshold contributes its full elapsed time, with no debouncing.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::series::{nan_mean, DopChannel, DriveSeries};

/// Dilution of precision above this is considered a poor fix.
pub const POOR_DOP_THRESHOLD: f64 = 20.0;

/// Seconds spent with `|dop| > threshold`.
///
/// Rows are weighted by their own elapsed time. Rows without an elapsed time
/// contribute nothing.
pub fn poor_precision_seconds(dop: &[f64], elapsed: &[f64], threshold: f64) -> f64 {
    dop.iter()
        .zip(elapsed)
        .filter(|(value, dt)| value.abs() > threshold && !dt.is_nan())
        .map(|(_, dt)| *dt)
        .sum()
}

/// Precision summary for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPrecision {
    pub channel: DopChannel,
    /// Mean DOP, NaN for an empty series
    pub mean: f64,
    /// Seconds with DOP above the threshold
    pub poor_seconds: f64,
}

/// Precision summary for all three DOP channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionReport {
    pub threshold: f64,
    pub horizontal: ChannelPrecision,
    pub positional: ChannelPrecision,
    pub vertical: ChannelPrecision,
}

impl PrecisionReport {
    pub fn channel(&self, channel: DopChannel) -> &ChannelPrecision {
        match channel {
            DopChannel::Horizontal => &self.horizontal,
            DopChannel::Positional => &self.positional,
            DopChannel::Vertical => &self.vertical,
        }
    }
}

/// Audit one channel of a drive.
pub fn audit_channel(
    series: &DriveSeries,
    channel: DopChannel,
    threshold: f64,
) -> ChannelPrecision {
    let values = series.dop(channel);
    let elapsed = series.elapsed_times();
    ChannelPrecision {
        channel,
        mean: nan_mean(&values),
        poor_seconds: poor_precision_seconds(&values, &elapsed, threshold),
    }
}

/// Audit all DOP channels of a drive.
pub fn audit_precision(series: &DriveSeries, threshold: f64) -> PrecisionReport {
    let report = PrecisionReport {
        threshold,
        horizontal: audit_channel(series, DopChannel::Horizontal, threshold),
        positional: audit_channel(series, DopChannel::Positional, threshold),
        vertical: audit_channel(series, DopChannel::Vertical, threshold),
    };
    debug!(
        "[Precision] poor hdop {:.1}s, pdop {:.1}s, vdop {:.1}s",
        report.horizontal.poor_seconds,
        report.positional.poor_seconds,
        report.vertical.poor_seconds
    );
    report
}
