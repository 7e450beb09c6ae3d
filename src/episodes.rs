//! Debounced threshold-crossing detection.
//!
//! A hard brake sampled at 10 Hz crosses the threshold on many consecutive
//! samples but is one event. The detector keeps a running clock of time since
//! the last crossing sample; a crossing only counts as a new episode when
//! strictly more than `cooldown` seconds have accumulated.
//!
//! ## Algorithm
//! For each `(value, elapsed_time)` in order:
//! 1. add `elapsed_time` to the clock (a missing value adds nothing)
//! 2. if `value` crosses the threshold, record the clock as the sample's
//!    `time_since_last_event` and reset the clock to 0
//!
//! Episodes are the crossings whose recorded time exceeds the cooldown.
//! The clock starts at 0 at the first sample, so an early crossing only counts
//! once the drive has been running longer than the cooldown.
//!
//! ## Example
//! ```rust
//! use drive_metrics::episodes::{Crossing, EpisodeDetector};
//!
//! let detector = EpisodeDetector::new(3.0, Crossing::Above, 5.0);
//! let accel = [0.0, 0.5, 0.2, 0.1, 0.0, 0.3, 4.0, 4.5, 0.0];
//! let report = detector.detect_columns(&accel, &[1.0; 9]);
//! assert_eq!(report.crossings(), 2);
//! assert_eq!(report.episode_count, 1);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

/// Standard debounce window used by every driving-event detector, in seconds.
pub const DEFAULT_COOLDOWN_SECONDS: f64 = 5.0;

/// Which side of the threshold counts as a crossing.
///
/// Thresholds are magnitudes; the direction is carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    /// `value > threshold`
    Above,
    /// `value < -threshold`
    Below,
    /// `|value| > threshold`
    MagnitudeAbove,
}

impl Crossing {
    /// NaN never crosses.
    pub fn crosses(&self, value: f64, threshold: f64) -> bool {
        match self {
            Crossing::Above => value > threshold,
            Crossing::Below => value < -threshold,
            Crossing::MagnitudeAbove => value.abs() > threshold,
        }
    }
}

/// Driving events counted by the metrics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeKind {
    AggressiveAcceleration,
    AggressiveDeceleration,
    SharpTurn,
}

/// One sample that crossed the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEvent {
    /// Row index in the source series
    pub sample_index: usize,
    /// Signal value at that row
    pub signal_value: f64,
    /// Seconds accumulated since the previous crossing (or drive start)
    pub time_since_last_event: f64,
    /// Whether this crossing opened a new episode
    pub is_episode: bool,
}

/// Result of one detector pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    /// Every crossing sample, in series order
    pub events: Vec<EpisodeEvent>,
    /// Number of debounced episodes
    pub episode_count: u32,
}

impl EpisodeReport {
    /// Number of raw crossing samples, before debouncing.
    pub fn crossings(&self) -> usize {
        self.events.len()
    }

    /// Crossings that started a new episode.
    pub fn episodes(&self) -> impl Iterator<Item = &EpisodeEvent> {
        self.events.iter().filter(|e| e.is_episode)
    }
}

/// Debounced threshold-crossing counter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetector {
    /// Magnitude the signal must pass
    pub threshold: f64,
    pub crossing: Crossing,
    /// Seconds that must strictly elapse between episodes
    pub cooldown: f64,
}

impl EpisodeDetector {
    pub fn new(threshold: f64, crossing: Crossing, cooldown: f64) -> Self {
        Self {
            threshold,
            crossing,
            cooldown,
        }
    }

    /// Detector for one kind of driving event over its natural signal:
    /// acceleration for (de)acceleration, bearing change for turns.
    pub fn for_kind(kind: EpisodeKind, threshold: f64, cooldown: f64) -> Self {
        let crossing = match kind {
            EpisodeKind::AggressiveAcceleration => Crossing::Above,
            EpisodeKind::AggressiveDeceleration => Crossing::Below,
            EpisodeKind::SharpTurn => Crossing::MagnitudeAbove,
        };
        Self::new(threshold, crossing, cooldown)
    }

    /// Run over `(signal_value, elapsed_time)` pairs in series order.
    pub fn detect<I>(&self, samples: I) -> EpisodeReport
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut events = Vec::new();
        let mut since_last = 0.0;

        for (sample_index, (value, elapsed)) in samples.into_iter().enumerate() {
            // A missing elapsed time adds nothing to the clock.
            if !elapsed.is_nan() {
                since_last += elapsed;
            }
            if self.crossing.crosses(value, self.threshold) {
                events.push(EpisodeEvent {
                    sample_index,
                    signal_value: value,
                    time_since_last_event: since_last,
                    is_episode: since_last > self.cooldown,
                });
                since_last = 0.0;
            }
        }

        let episode_count = events.iter().filter(|e| e.is_episode).count() as u32;
        debug!(
            "[Episodes] {:?} {} over {} crossings -> {} episodes",
            self.crossing,
            self.threshold,
            events.len(),
            episode_count
        );

        EpisodeReport {
            events,
            episode_count,
        }
    }

    /// Run over parallel signal and elapsed-time columns. Extra trailing
    /// entries in the longer column are ignored.
    pub fn detect_columns(&self, values: &[f64], elapsed: &[f64]) -> EpisodeReport {
        self.detect(values.iter().copied().zip(elapsed.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(crossing: Crossing) -> EpisodeDetector {
        EpisodeDetector::new(3.0, crossing, DEFAULT_COOLDOWN_SECONDS)
    }

    #[test]
    fn test_crossing_directions() {
        assert!(Crossing::Above.crosses(3.1, 3.0));
        assert!(!Crossing::Above.crosses(3.0, 3.0));
        assert!(!Crossing::Above.crosses(-9.0, 3.0));

        assert!(Crossing::Below.crosses(-3.1, 3.0));
        assert!(!Crossing::Below.crosses(-3.0, 3.0));
        assert!(!Crossing::Below.crosses(9.0, 3.0));

        assert!(Crossing::MagnitudeAbove.crosses(-91.0, 90.0));
        assert!(Crossing::MagnitudeAbove.crosses(91.0, 90.0));

        assert!(!Crossing::MagnitudeAbove.crosses(f64::NAN, 90.0));
        assert!(!Crossing::Below.crosses(f64::NAN, 3.0));
    }

    #[test]
    fn test_isolated_crossing_is_one_episode() {
        let mut signal = vec![0.0; 20];
        signal[10] = 4.0;
        let report = detector(Crossing::Above).detect_columns(&signal, &[1.0; 20]);

        assert_eq!(report.episode_count, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].sample_index, 10);
        assert_eq!(report.events[0].time_since_last_event, 11.0);
    }

    #[test]
    fn test_burst_is_debounced() {
        // 8 samples at 0.5s apart inside one 4s burst
        let mut signal = vec![0.0; 12];
        for value in signal.iter_mut().skip(4) {
            *value = -5.0;
        }
        let elapsed = vec![0.5; 12];
        let elapsed = [vec![10.0], elapsed[1..].to_vec()].concat();

        let report = detector(Crossing::Below).detect_columns(&signal, &elapsed);
        assert_eq!(report.crossings(), 8);
        assert_eq!(report.episode_count, 1);
        assert_eq!(report.episodes().next().unwrap().sample_index, 4);
        assert!(report.events[1..]
            .iter()
            .all(|e| e.time_since_last_event == 0.5 && !e.is_episode));
    }

    #[test]
    fn test_second_episode_after_cooldown() {
        let mut signal = vec![0.0; 20];
        signal[6] = 4.0;
        signal[13] = 4.0;
        let report = detector(Crossing::Above).detect_columns(&signal, &[1.0; 20]);
        assert_eq!(report.episode_count, 2);
        assert_eq!(report.events[1].time_since_last_event, 7.0);
    }

    #[test]
    fn test_exact_cooldown_does_not_count() {
        let mut signal = vec![0.0; 20];
        signal[6] = 4.0;
        signal[11] = 4.0;
        let report = detector(Crossing::Above).detect_columns(&signal, &[1.0; 20]);

        assert_eq!(report.crossings(), 2);
        assert_eq!(report.events[1].time_since_last_event, 5.0);
        assert_eq!(report.episode_count, 1);
    }

    #[test]
    fn test_early_crossing_is_not_counted() {
        let signal = [0.0, 4.0, 0.0, 0.0];
        let report = detector(Crossing::Above).detect_columns(&signal, &[1.0; 4]);
        assert_eq!(report.crossings(), 1);
        assert_eq!(report.events[0].time_since_last_event, 2.0);
        assert_eq!(report.episode_count, 0);
    }

    #[test]
    fn test_suppressed_crossing_still_resets_clock() {
        // Crossings every 3s never let the clock reach the cooldown again
        let mut signal = vec![0.0; 30];
        for i in (7..30).step_by(3) {
            signal[i] = 100.0;
        }
        let turn = EpisodeDetector::for_kind(EpisodeKind::SharpTurn, 90.0, 5.0);
        let report = turn.detect_columns(&signal, &[1.0; 30]);
        assert_eq!(report.crossings(), 8);
        assert_eq!(report.episode_count, 1);
    }

    #[test]
    fn test_for_kind_directions() {
        let accel = EpisodeDetector::for_kind(EpisodeKind::AggressiveAcceleration, 3.0, 5.0);
        let decel = EpisodeDetector::for_kind(EpisodeKind::AggressiveDeceleration, 3.0, 5.0);
        assert_eq!(accel.crossing, Crossing::Above);
        assert_eq!(decel.crossing, Crossing::Below);
    }

    #[test]
    fn test_missing_elapsed_adds_nothing() {
        let signal = [0.0, 0.0, 0.0, 4.0];
        let elapsed = [f64::NAN, 3.0, 3.0, 1.0];
        let report = detector(Crossing::Above).detect_columns(&signal, &elapsed);
        assert_eq!(report.events[0].time_since_last_event, 7.0);
        assert_eq!(report.episode_count, 1);
    }

    #[test]
    fn test_uneven_columns_use_shorter_length() {
        let signal = [0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0];
        let report = detector(Crossing::Above).detect_columns(&signal, &[1.0; 6]);
        assert_eq!(report.crossings(), 1);
        assert_eq!(report.events[0].sample_index, 5);
        assert_eq!(report.episode_count, 1);
    }

    #[test]
    fn test_empty_signal() {
        let report = detector(Crossing::Above).detect(std::iter::empty::<(f64, f64)>());
        assert_eq!(report, EpisodeReport::default());
    }
}
