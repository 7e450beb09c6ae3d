//! Road annotation labels.
//!
//! Label tables encode each annotation group one-hot across several flag
//! columns (`dirt_road`, `cobblestone_road`, `asphalt_road`, ...). Joining
//! collapses every group to a single categorical column and attaches it to the
//! inertial frame by row position.
//!
//! ## Invariant
//! The inertial and label tables must have the same length and row order.
//! Lengths are checked; row order cannot be and is the caller's guarantee.
//!
//! ## Tie-break
//! Each row takes the flag column with the largest value; on ties the
//! first-listed column wins. A row with no flag set therefore resolves to the
//! group's first column.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{DriveMetricsError, Result};
use crate::inertial::InertialFrame;

/// One annotation group and its mutually exclusive flag columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelGroup {
    pub name: String,
    pub columns: Vec<String>,
}

/// Ordered set of annotation groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    groups: Vec<LabelGroup>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: &str, columns: &[&str]) -> Result<Self> {
        if columns.is_empty() {
            return Err(DriveMetricsError::InvalidConfig {
                message: format!("label group '{}' has no flag columns", name),
            });
        }
        self.groups.push(LabelGroup {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        Ok(self)
    }

    pub fn groups(&self) -> &[LabelGroup] {
        &self.groups
    }

    /// Groups found in the road-surface annotation tables.
    pub fn road_surface() -> Self {
        let groups = [
            ("Road type", &["dirt_road", "cobblestone_road", "asphalt_road"][..]),
            ("Pavement", &["paved_road", "unpaved_road"][..]),
            (
                "Speed bump",
                &["no_speed_bump", "speed_bump_asphalt", "speed_bump_cobblestone"][..],
            ),
            (
                "Left side condition",
                &["good_road_left", "regular_road_left", "bad_road_left"][..],
            ),
            (
                "Right side condition",
                &["good_road_right", "regular_road_right", "bad_road_right"][..],
            ),
        ];
        Self {
            groups: groups
                .iter()
                .map(|(name, columns)| LabelGroup {
                    name: name.to_string(),
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }
}

/// Column-oriented table of one-hot flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelFrame {
    rows: usize,
    columns: HashMap<String, Vec<f64>>,
}

impl LabelFrame {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: HashMap::new(),
        }
    }

    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.rows {
            return Err(DriveMetricsError::MalformedInput {
                table: "labels".to_string(),
                column: name.to_string(),
                message: format!("has {} rows, expected {}", values.len(), self.rows),
            });
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }
}

/// A categorical column stored as codes into its category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub categories: Vec<String>,
    pub codes: Vec<usize>,
}

impl CategoricalColumn {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn label(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .map(|&code| self.categories[code].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(|&code| self.categories[code].as_str())
    }
}

/// Inertial frame with one label column per annotation group.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledInertialFrame {
    pub frame: InertialFrame,
    /// (group name, labels) in label-set order
    pub labels: Vec<(String, CategoricalColumn)>,
}

impl LabeledInertialFrame {
    pub fn label_column(&self, group: &str) -> Option<&CategoricalColumn> {
        self.labels
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, column)| column)
    }
}

/// Index of the largest value, first wins on ties, NaN ignored.
/// Returns 0 when every value is NaN.
pub fn stable_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &value) in values.iter().enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Collapse one group's flag columns into a categorical column.
pub fn resolve_group(labels: &LabelFrame, group: &LabelGroup) -> Result<CategoricalColumn> {
    if group.columns.is_empty() {
        return Err(DriveMetricsError::InvalidConfig {
            message: format!("label group '{}' has no flag columns", group.name),
        });
    }
    let flags: Vec<&[f64]> = group
        .columns
        .iter()
        .map(|column| {
            labels
                .column(column)
                .ok_or_else(|| DriveMetricsError::UnknownLabelColumn {
                    group: group.name.clone(),
                    column: column.clone(),
                })
        })
        .collect::<Result<_>>()?;

    let mut row_flags = vec![0.0; flags.len()];
    let mut ambiguous = 0usize;
    let codes: Vec<usize> = (0..labels.len())
        .map(|row| {
            for (slot, column) in row_flags.iter_mut().zip(&flags) {
                *slot = column[row];
            }
            if row_flags.iter().filter(|&&v| v > 0.0).count() != 1 {
                ambiguous += 1;
            }
            stable_argmax(&row_flags)
        })
        .collect();

    if ambiguous > 0 {
        warn!(
            "[Labels] '{}': {} of {} rows do not have exactly one flag set",
            group.name,
            ambiguous,
            labels.len()
        );
    }

    Ok(CategoricalColumn {
        categories: group.columns.clone(),
        codes,
    })
}

/// Attach one categorical column per label group to the inertial frame.
pub fn join_labels(
    inertial: InertialFrame,
    labels: &LabelFrame,
    label_set: &LabelSet,
) -> Result<LabeledInertialFrame> {
    if inertial.len() != labels.len() {
        return Err(DriveMetricsError::LengthMismatch {
            inertial_rows: inertial.len(),
            label_rows: labels.len(),
        });
    }

    let resolved = label_set
        .groups()
        .iter()
        .map(|group| Ok((group.name.clone(), resolve_group(labels, group)?)))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "[Labels] Joined {} groups onto {} inertial rows",
        resolved.len(),
        inertial.len()
    );

    Ok(LabeledInertialFrame {
        frame: inertial,
        labels: resolved,
    })
}
