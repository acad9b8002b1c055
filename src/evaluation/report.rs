use super::area::AreaMetrics;
use super::matching::ObjectMetrics;
use crate::error::{EvalError, Result};
use crate::utils::{round_to, REPORT_PRECISION};
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Area,
    Object,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Area => write!(f, "Area-based"),
            Block::Object => write!(f, "Object-based"),
        }
    }
}

/// A metric block that was requested but could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFailure {
    pub block: Block,
    pub cause: String,
}

impl fmt::Display for BlockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.block, self.cause)
    }
}

/// Metric name/value pairs in a fixed order: area block first, then object
/// block. Values are rounded to [`REPORT_PRECISION`] places.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracyReport {
    rows: Vec<(String, f64)>,
}

impl AccuracyReport {
    fn push(&mut self, name: impl Into<String>, value: f64) {
        self.rows.push((name.into(), round_to(value, REPORT_PRECISION)));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.rows.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn rows(&self) -> &[(String, f64)] {
        &self.rows
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|(n, _)| n.len())
            .max()
            .unwrap_or(0)
            .max("Metric".len());
        writeln!(f, "{:<width$}  Value", "Metric", width = width)?;
        for (name, value) in &self.rows {
            writeln!(f, "{:<width$}  {:.4}", name, value, width = width)?;
        }
        Ok(())
    }
}

pub struct MetricsReporter;

impl MetricsReporter {
    /// Merges the outcome of each requested block. `None` means the block was
    /// not requested; an `Err` becomes a [`BlockFailure`] and contributes no rows.
    pub fn merge(
        area: Option<&Result<AreaMetrics>>,
        object: Option<&Result<ObjectMetrics>>,
    ) -> (AccuracyReport, Vec<BlockFailure>) {
        let mut report = AccuracyReport::default();
        let mut failures = Vec::new();

        match area {
            Some(Ok(metrics)) => {
                report.push("Area_IoU", metrics.iou);
                report.push("Area_Dice", metrics.dice);
                report.push("Area_Precision", metrics.precision);
                report.push("Area_Recall", metrics.recall);
            }
            Some(Err(err)) => failures.push(failure(Block::Area, err)),
            None => {}
        }

        match object {
            Some(Ok(metrics)) => {
                let counts = &metrics.counts;
                report.push("Object_mIoU", metrics.mean_iou);
                report.push("Object_F1_Score", metrics.f1);
                report.push("Object_Precision", metrics.precision);
                report.push("Object_Recall", metrics.recall);
                report.push(
                    format!("TP_at_{:?}", metrics.threshold),
                    counts.true_positive as f64,
                );
                report.push("FP", counts.false_positive as f64);
                report.push("FN", counts.false_negative as f64);
                report.push("GT_Count", metrics.ground_truth_count as f64);
                report.push("PD_Count", metrics.prediction_count as f64);
            }
            Some(Err(err)) => failures.push(failure(Block::Object, err)),
            None => {}
        }

        (report, failures)
    }
}

fn failure(block: Block, err: &EvalError) -> BlockFailure {
    BlockFailure {
        block,
        cause: err.to_string(),
    }
}

/// One-line summary used for logging a finished block.
pub fn area_summary(metrics: &AreaMetrics) -> String {
    let parts = [
        ("IoU", metrics.iou),
        ("Dice", metrics.dice),
        ("Prec", metrics.precision),
        ("Rec", metrics.recall),
    ];
    format!(
        "Area results: {}",
        parts
            .iter()
            .map(|(name, value)| format!("{}: {:.4}", name, value))
            .join(" | ")
    )
}

pub fn object_summary(metrics: &ObjectMetrics) -> String {
    let parts = [
        ("mIoU", metrics.mean_iou),
        ("F1", metrics.f1),
        ("Prec", metrics.precision),
        ("Rec", metrics.recall),
    ];
    format!(
        "Object results: {} | TP: {}",
        parts
            .iter()
            .map(|(name, value)| format!("{}: {:.4}", name, value))
            .join(" | "),
        metrics.counts.true_positive
    )
}
