//! JSON input and output for polygon sets and analysis results.
//!
//! Input sets look like
//! `{"name": "parcels", "features": [{"id": 3, "exterior": [[0, 0], [4, 0], [4, 4]]}]}`;
//! `name`, `id` and `interiors` are optional.

use crate::error::Result;
use crate::evaluation::matching::MatchResult;
use crate::evaluation::report::AccuracyReport;
use crate::polygon::{Feature, PolygonSet, Role};
use crate::utils::{round_to, REPORT_PRECISION};
use anyhow::anyhow;
use geo::MultiPolygon;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const SUMMARY_TABLE_NAME: &str = "Accuracy_Summary_Table";

#[derive(Debug)]
pub struct IoOptions<'a> {
    pub ground_truth_path: &'a str,
    pub predictions_path: &'a str,
    pub summary_path: Option<&'a str>,
    pub scores_path: Option<&'a str>,
    pub overlap_path: Option<&'a str>,
    pub log_config_path: &'a str,
}

impl<'a> IoOptions<'a> {
    pub fn new(args: &'a clap::ArgMatches) -> anyhow::Result<Self> {
        let ground_truth_path = args
            .value_of("ground-truth")
            .ok_or_else(|| anyhow!("Missing ground-truth file"))?;
        let predictions_path = args
            .value_of("predictions")
            .ok_or_else(|| anyhow!("Missing predictions file"))?;
        Ok(Self {
            ground_truth_path,
            predictions_path,
            summary_path: args.value_of("summary"),
            scores_path: args.value_of("scores"),
            overlap_path: args.value_of("overlap"),
            log_config_path: args
                .value_of("log-config")
                .unwrap_or(crate::cli::DEFAULT_LOG_CONFIG),
        })
    }
}

#[derive(Deserialize)]
struct FeatureRecord {
    #[serde(default)]
    id: Option<u64>,
    exterior: Vec<(f64, f64)>,
    #[serde(default)]
    interiors: Vec<Vec<(f64, f64)>>,
}

#[derive(Deserialize)]
struct PolygonSetRecord {
    #[serde(default)]
    name: Option<String>,
    features: Vec<FeatureRecord>,
}

pub fn load_polygon_set(path: &Path, role: Role) -> Result<PolygonSet> {
    let default_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| role.to_string());
    let set = parse_polygon_set(BufReader::new(File::open(path)?), &default_name, role)?;
    info!(
        "Loaded {} {} polygons from {}",
        set.len(),
        role,
        path.display()
    );
    Ok(set)
}

/// Features without an `id` get their position in the file.
pub fn parse_polygon_set<R: Read>(reader: R, default_name: &str, role: Role) -> Result<PolygonSet> {
    let record: PolygonSetRecord = serde_json::from_reader(reader)?;
    let features = record
        .features
        .iter()
        .enumerate()
        .map(|(n, f)| Feature::from_rings(f.id.unwrap_or(n as u64), &f.exterior, &f.interiors))
        .collect::<Vec<Feature>>();
    let name = record.name.unwrap_or_else(|| default_name.to_string());
    Ok(PolygonSet::new(name, role, features))
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    metric: &'a str,
    value: f64,
}

#[derive(Serialize)]
struct SummaryTable<'a> {
    name: &'a str,
    rows: Vec<SummaryRow<'a>>,
}

pub fn write_summary<W: Write>(writer: W, report: &AccuracyReport) -> Result<()> {
    let table = SummaryTable {
        name: SUMMARY_TABLE_NAME,
        rows: report
            .rows()
            .iter()
            .map(|(metric, value)| SummaryRow {
                metric: metric.as_str(),
                value: *value,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &table)?;
    Ok(())
}

#[derive(Serialize)]
struct ScoreRecord {
    id: u64,
    iou_score: f64,
    matched_ground_truth: Option<u64>,
}

#[derive(Serialize)]
struct ScoreLayer {
    name: String,
    features: Vec<ScoreRecord>,
}

/// One record per prediction, aligned with prediction order.
pub fn write_scores<W: Write>(writer: W, predictions_name: &str, matches: &[MatchResult]) -> Result<()> {
    let layer = ScoreLayer {
        name: format!("IoU_Scores_{}", predictions_name),
        features: matches
            .iter()
            .map(|m| ScoreRecord {
                id: m.prediction_id,
                iou_score: round_to(m.iou_score, REPORT_PRECISION),
                matched_ground_truth: m.matched_ground_truth_id,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &layer)?;
    Ok(())
}

#[derive(Serialize)]
struct OverlapLayer<'a> {
    name: String,
    geometry: &'a MultiPolygon<f64>,
}

pub fn write_overlap<W: Write>(writer: W, ground_truth_name: &str, overlap: &MultiPolygon<f64>) -> Result<()> {
    let layer = OverlapLayer {
        name: format!("Area_Overlap_{}", ground_truth_name),
        geometry: overlap,
    };
    serde_json::to_writer_pretty(writer, &layer)?;
    Ok(())
}

/// Creates `path` and hands a buffered writer to `write`.
pub fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    debug!("wrote {}", path.display());
    Ok(())
}
