use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use drive_metrics::loader::{
    load_gps_csv_from_path, load_inertial_csv_from_path, load_label_csv_from_path,
};
use drive_metrics::{analyze_drive, join_labels, EpisodeKind, LabelSet, MetricsConfig};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(about = "Compute driving-quality metrics for one recorded drive")]
struct Args {
    /// GPS/kinematics CSV table
    #[arg(long)]
    gps: PathBuf,

    /// Inertial sensor CSV table (requires --labels)
    #[arg(long, requires = "labels")]
    inertial: Option<PathBuf>,

    /// One-hot road annotation CSV table, row-aligned with --inertial
    #[arg(long, requires = "inertial")]
    labels: Option<PathBuf>,

    /// JSON file with threshold overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Acceleration magnitude (m/s²) for aggressive acceleration and braking
    #[arg(long)]
    accel_threshold: Option<f64>,

    /// Heading change (degrees) for a sharp turn
    #[arg(long)]
    turn_threshold: Option<f64>,

    /// Minimum seconds between two counted episodes
    #[arg(long)]
    cooldown: Option<f64>,

    /// Dilution of precision above which a fix is poor
    #[arg(long)]
    dop_threshold: Option<f64>,

    /// Include every threshold crossing in the output
    #[arg(long, default_value_t = false)]
    events: bool,
}

fn load_config(args: &Args) -> anyhow::Result<MetricsConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MetricsConfig::default(),
    };

    if let Some(v) = args.accel_threshold {
        config.accel_threshold = v;
    }
    if let Some(v) = args.turn_threshold {
        config.turn_threshold = v;
    }
    if let Some(v) = args.cooldown {
        config.cooldown_seconds = v;
    }
    if let Some(v) = args.dop_threshold {
        config.dop_threshold = v;
    }
    config.validate()?;
    Ok(config)
}

/// Per-group category counts for a labelled inertial stream.
fn label_counts(inertial: &Path, labels: &Path) -> anyhow::Result<serde_json::Value> {
    let frame = load_inertial_csv_from_path(inertial)
        .with_context(|| format!("loading {}", inertial.display()))?;
    let label_frame = load_label_csv_from_path(labels)
        .with_context(|| format!("loading {}", labels.display()))?;
    let joined = join_labels(frame, &label_frame, &LabelSet::road_surface())?;

    let mut groups = serde_json::Map::new();
    for (group, column) in &joined.labels {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in column.iter() {
            *counts.entry(label).or_default() += 1;
        }
        groups.insert(group.clone(), json!(counts));
    }
    Ok(json!({
        "rows": joined.frame.len(),
        "channels": joined.frame.channels().len(),
        "groups": groups,
    }))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let series = load_gps_csv_from_path(&args.gps)
        .with_context(|| format!("loading {}", args.gps.display()))?;
    let report = analyze_drive(&series, &config)?;

    let mut output = json!({
        "config": config,
        "metrics": report.metrics,
    });

    if args.events {
        let events = |kind: EpisodeKind| &report.episodes(kind).events;
        output["events"] = json!({
            "aggressive_acceleration": events(EpisodeKind::AggressiveAcceleration),
            "aggressive_deceleration": events(EpisodeKind::AggressiveDeceleration),
            "sharp_turn": events(EpisodeKind::SharpTurn),
        });
    }

    if let (Some(inertial), Some(labels)) = (&args.inertial, &args.labels) {
        output["labels"] = label_counts(inertial, labels)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
