//! Inertial sensor streams (accelerometer, gyroscope, magnetometer,
//! temperature) recorded at several mounting points on the vehicle.
//!
//! Channels are stored column-wise under the names used by the source tables:
//! `{kind}_{axis}_{location}`, e.g. `acc_x_dashboard`, or `{kind}_{location}`
//! for the axis-less temperature sensor.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DriveMetricsError, OptionExt, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Acc,
    Gyro,
    Mag,
    Temp,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Acc,
        SensorKind::Gyro,
        SensorKind::Mag,
        SensorKind::Temp,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            SensorKind::Acc => "acc",
            SensorKind::Gyro => "gyro",
            SensorKind::Mag => "mag",
            SensorKind::Temp => "temp",
        }
    }

    /// Temperature is a scalar; the rest are triaxial.
    pub fn has_axes(&self) -> bool {
        !matches!(self, SensorKind::Temp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn suffix(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountLocation {
    Dashboard,
    AboveSuspension,
    BelowSuspension,
}

impl MountLocation {
    pub const ALL: [MountLocation; 3] = [
        MountLocation::Dashboard,
        MountLocation::AboveSuspension,
        MountLocation::BelowSuspension,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            MountLocation::Dashboard => "dashboard",
            MountLocation::AboveSuspension => "above_suspension",
            MountLocation::BelowSuspension => "below_suspension",
        }
    }
}

/// One named inertial column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InertialChannel {
    pub kind: SensorKind,
    pub axis: Option<Axis>,
    pub location: MountLocation,
}

impl InertialChannel {
    pub fn new(kind: SensorKind, axis: Option<Axis>, location: MountLocation) -> Self {
        Self {
            kind,
            axis,
            location,
        }
    }

    pub fn column_name(&self) -> String {
        self.to_string()
    }

    /// Parse a column name such as `gyro_z_below_suspension`.
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, rest) = SensorKind::ALL.iter().find_map(|kind| {
            name.strip_prefix(kind.prefix())
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| (*kind, rest))
        })?;

        let (axis, rest) = if kind.has_axes() {
            let (axis, rest) = Axis::ALL.iter().find_map(|axis| {
                rest.strip_prefix(axis.suffix())
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| (*axis, rest))
            })?;
            (Some(axis), rest)
        } else {
            (None, rest)
        };

        let location = MountLocation::ALL
            .iter()
            .find(|location| location.suffix() == rest)?;
        Some(Self::new(kind, axis, *location))
    }
}

impl fmt::Display for InertialChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.axis {
            Some(axis) => write!(
                f,
                "{}_{}_{}",
                self.kind.prefix(),
                axis.suffix(),
                self.location.suffix()
            ),
            None => write!(f, "{}_{}", self.kind.prefix(), self.location.suffix()),
        }
    }
}

/// Column-oriented inertial table keyed by row position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InertialFrame {
    timestamps: Vec<f64>,
    /// Column names in insertion order
    names: Vec<String>,
    columns: HashMap<String, Vec<f64>>,
}

impl InertialFrame {
    pub fn new(timestamps: Vec<f64>) -> Self {
        Self {
            timestamps,
            ..Self::default()
        }
    }

    /// Add or replace a column. Its length must match the timestamps.
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.timestamps.len() {
            return Err(DriveMetricsError::MalformedInput {
                table: "inertial".to_string(),
                column: name.to_string(),
                message: format!(
                    "has {} rows, expected {}",
                    values.len(),
                    self.timestamps.len()
                ),
            });
        }
        if self.columns.insert(name.to_string(), values).is_none() {
            self.names.push(name.to_string());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn channel(&self, channel: &InertialChannel) -> Option<&[f64]> {
        self.column(&channel.column_name())
    }

    /// Recognised sensor channels, in column order.
    pub fn channels(&self) -> Vec<InertialChannel> {
        self.names
            .iter()
            .filter_map(|name| InertialChannel::parse(name))
            .collect()
    }

    /// Mounting points present in the frame.
    pub fn locations(&self) -> Vec<MountLocation> {
        let mut locations: Vec<MountLocation> =
            self.channels().iter().map(|c| c.location).collect();
        locations.sort();
        locations.dedup();
        locations
    }

    /// The x, y and z columns of a triaxial sensor at one location.
    pub fn axis_triplet(&self, kind: SensorKind, location: MountLocation) -> Result<[&[f64]; 3]> {
        let column = move |axis: Axis| {
            let channel = InertialChannel::new(kind, Some(axis), location);
            self.channel(&channel)
                .ok_or_missing_column("inertial", &channel.column_name())
        };
        Ok([column(Axis::X)?, column(Axis::Y)?, column(Axis::Z)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        let acc = InertialChannel::new(SensorKind::Acc, Some(Axis::X), MountLocation::Dashboard);
        assert_eq!(acc.column_name(), "acc_x_dashboard");

        let temp = InertialChannel::new(SensorKind::Temp, None, MountLocation::BelowSuspension);
        assert_eq!(temp.column_name(), "temp_below_suspension");
    }

    #[test]
    fn test_parse_round_trips_every_channel() {
        for kind in SensorKind::ALL {
            for location in MountLocation::ALL {
                let axes: Vec<Option<Axis>> = if kind.has_axes() {
                    Axis::ALL.iter().copied().map(Some).collect()
                } else {
                    vec![None]
                };
                for axis in axes {
                    let channel = InertialChannel::new(kind, axis, location);
                    assert_eq!(InertialChannel::parse(&channel.column_name()), Some(channel));
                }
            }
        }
    }

    #[test]
    fn test_parse_rejects_other_columns() {
        assert_eq!(InertialChannel::parse("timestamp"), None);
        assert_eq!(InertialChannel::parse("acc_w_dashboard"), None);
        assert_eq!(InertialChannel::parse("acc_x_roof"), None);
        assert_eq!(InertialChannel::parse("temp_x_dashboard"), None);
    }

    #[test]
    fn test_frame_columns() {
        let frame = InertialFrame::new(vec![0.0, 0.01, 0.02])
            .with_column("acc_x_dashboard", vec![0.1, 0.2, 0.3])
            .unwrap()
            .with_column("acc_y_dashboard", vec![0.0; 3])
            .unwrap()
            .with_column("acc_z_dashboard", vec![9.8; 3])
            .unwrap()
            .with_column("temp_above_suspension", vec![31.0; 3])
            .unwrap()
            .with_column("speed", vec![1.0; 3])
            .unwrap();

        assert_eq!(frame.len(), 3);
        assert_eq!(frame.channels().len(), 4);
        assert_eq!(
            frame.locations(),
            vec![MountLocation::Dashboard, MountLocation::AboveSuspension]
        );

        let [x, _, z] = frame
            .axis_triplet(SensorKind::Acc, MountLocation::Dashboard)
            .unwrap();
        assert_eq!(x, &[0.1, 0.2, 0.3]);
        assert_eq!(z[0], 9.8);

        assert!(matches!(
            frame.axis_triplet(SensorKind::Gyro, MountLocation::Dashboard),
            Err(DriveMetricsError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_column_length_checked() {
        let result = InertialFrame::new(vec![0.0, 1.0]).with_column("acc_x_dashboard", vec![1.0]);
        assert!(matches!(
            result,
            Err(DriveMetricsError::MalformedInput { .. })
        ));
    }
}
