//! CSV ingestion for the GPS, inertial and label tables of a drive.
//!
//! Only the columns the engine consumes are required; extra columns are
//! ignored for the GPS table and kept for the inertial table. Empty numeric
//! cells load as NaN.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{Reader, StringRecord};
use log::{info, warn};
use serde::Deserialize;

use crate::error::{DriveMetricsError, OptionExt, Result};
use crate::inertial::InertialFrame;
use crate::labels::LabelFrame;
use crate::series::{DriveSeries, GpsSample};
use crate::GpsPoint;

/// Columns the GPS table must provide.
pub const GPS_COLUMNS: &[&str] = &[
    "timestamp",
    "elapsed_time_seconds",
    "latitude",
    "longitude",
    "speed_meters_per_second",
    "elevation",
    "bearing",
    "hdop",
    "pdop",
    "vdop",
];

#[derive(Debug, Deserialize)]
struct GpsRecord {
    timestamp: Option<f64>,
    elapsed_time_seconds: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    speed_meters_per_second: Option<f64>,
    elevation: Option<f64>,
    bearing: Option<f64>,
    hdop: Option<f64>,
    pdop: Option<f64>,
    vdop: Option<f64>,
}

impl From<GpsRecord> for GpsSample {
    fn from(record: GpsRecord) -> Self {
        let value = |cell: Option<f64>| cell.unwrap_or(f64::NAN);
        GpsSample {
            timestamp: value(record.timestamp),
            elapsed_time: value(record.elapsed_time_seconds),
            position: GpsPoint::new(value(record.latitude), value(record.longitude)),
            speed: value(record.speed_meters_per_second),
            elevation: value(record.elevation),
            bearing: value(record.bearing),
            hdop: value(record.hdop),
            pdop: value(record.pdop),
            vdop: value(record.vdop),
        }
    }
}

fn malformed(table: &str, column: &str, message: String) -> DriveMetricsError {
    DriveMetricsError::MalformedInput {
        table: table.to_string(),
        column: column.to_string(),
        message,
    }
}

fn require_columns(table: &str, headers: &StringRecord, required: &[&str]) -> Result<()> {
    for column in required {
        headers
            .iter()
            .position(|h| h == *column)
            .ok_or_missing_column(table, column)?;
    }
    Ok(())
}

fn parse_cell(table: &str, column: &str, row: usize, text: &str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(f64::NAN);
    }
    text.parse::<f64>().map_err(|e| {
        malformed(
            table,
            column,
            format!("row {}: cannot parse '{}' as a number ({})", row + 1, text, e),
        )
    })
}

/// Read every column of a numeric table into column vectors.
fn read_numeric_columns<R: Read>(
    table: &str,
    mut reader: Reader<R>,
) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for ((column, values), cell) in headers.iter().zip(columns.iter_mut()).zip(record.iter()) {
            values.push(parse_cell(table, column, row, cell)?);
        }
    }
    Ok((headers, columns))
}

/// Load a GPS/kinematics table.
pub fn load_gps_csv<R: Read>(reader: R) -> Result<DriveSeries> {
    let mut reader = Reader::from_reader(reader);
    require_columns("gps", reader.headers()?, GPS_COLUMNS)?;

    let samples = reader
        .deserialize::<GpsRecord>()
        .enumerate()
        .map(|(row, record)| {
            record.map(GpsSample::from).map_err(|e| {
                malformed("gps", "*", format!("row {}: {}", row + 1, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let series = DriveSeries::new(samples);
    if !series.is_time_ordered() {
        warn!("[Loader] GPS timestamps are not monotonically non-decreasing");
    }
    info!("[Loader] Loaded {} GPS samples", series.len());
    Ok(series)
}

pub fn load_gps_csv_from_path<P: AsRef<Path>>(path: P) -> Result<DriveSeries> {
    load_gps_csv(File::open(path)?)
}

/// Load an inertial table. Requires a `timestamp` column; every other column
/// is kept as a numeric channel.
pub fn load_inertial_csv<R: Read>(reader: R) -> Result<InertialFrame> {
    let reader = Reader::from_reader(reader);
    let (mut headers, mut columns) = read_numeric_columns("inertial", reader)?;

    let ts_index = headers
        .iter()
        .position(|h| h == "timestamp")
        .ok_or_missing_column("inertial", "timestamp")?;
    headers.remove(ts_index);
    let mut frame = InertialFrame::new(columns.remove(ts_index));

    for (name, values) in headers.iter().zip(columns) {
        frame.insert_column(name, values)?;
    }

    if frame.channels().is_empty() {
        warn!("[Loader] Inertial table has no recognised sensor channels");
    }
    info!(
        "[Loader] Loaded {} inertial rows with {} columns",
        frame.len(),
        frame.column_names().len()
    );
    Ok(frame)
}

pub fn load_inertial_csv_from_path<P: AsRef<Path>>(path: P) -> Result<InertialFrame> {
    load_inertial_csv(File::open(path)?)
}

/// Load a one-hot label table. Every column is read as a numeric flag.
pub fn load_label_csv<R: Read>(reader: R) -> Result<LabelFrame> {
    let reader = Reader::from_reader(reader);
    let (headers, columns) = read_numeric_columns("labels", reader)?;

    let rows = columns.first().map(Vec::len).unwrap_or(0);
    let mut frame = LabelFrame::new(rows);
    for (name, values) in headers.iter().zip(columns) {
        frame.insert_column(name, values)?;
    }
    info!("[Loader] Loaded {} label rows", frame.len());
    Ok(frame)
}

pub fn load_label_csv_from_path<P: AsRef<Path>>(path: P) -> Result<LabelFrame> {
    load_label_csv(File::open(path)?)
}
