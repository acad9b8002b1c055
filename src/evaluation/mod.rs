pub mod area;
pub mod matching;
pub mod options;
pub mod report;

use crate::error::{EvalError, Result};
use crate::geometry::GeometryProvider;
use crate::macros::LogType;
use crate::polygon::{PolygonSet, Role};
use area::AreaAggregateMetric;
use geo::MultiPolygon;
use log::{error, info};
use matching::{MatchResult, ObjectMatcher};
use options::EvalOptions;
use report::{area_summary, object_summary, AccuracyReport, BlockFailure, MetricsReporter};

pub struct AnalysisRequest<'a> {
    pub ground_truth: Option<&'a PolygonSet>,
    pub predictions: Option<&'a PolygonSet>,
    pub options: EvalOptions,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(ground_truth: &'a PolygonSet, predictions: &'a PolygonSet, options: EvalOptions) -> Self {
        Self {
            ground_truth: Some(ground_truth),
            predictions: Some(predictions),
            options,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: AccuracyReport,
    /// Per-prediction best IoU, present when the object block succeeded.
    pub matches: Option<Vec<MatchResult>>,
    /// Dissolved overlap region, present when the area block succeeded.
    pub overlap: Option<MultiPolygon<f64>>,
    pub failures: Vec<BlockFailure>,
}

impl Analysis {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validates the request and runs the selected metric blocks.
///
/// Validation problems are returned as a single [`EvalError::Config`]. Once
/// validation passes, each block fails on its own: a geometry error in one
/// block is recorded in [`Analysis::failures`] and the other block still
/// reports.
pub fn run_analysis<G: GeometryProvider>(
    provider: &G,
    request: &AnalysisRequest,
) -> Result<Analysis> {
    let (ground_truth, predictions) = validate(request)?;
    let opts = &request.options;
    info!(
        "Running analysis of {} ({} polygons) against {} ({} polygons), threshold {}",
        predictions.name(),
        predictions.len(),
        ground_truth.name(),
        ground_truth.len(),
        opts.threshold
    );

    let area = if opts.run_area {
        info!("Running area-based calculations");
        let res = measure_time!(
            "area block",
            || AreaAggregateMetric::new(provider).run(ground_truth.features(), predictions.features()),
            LogType::Debug
        );
        match &res {
            Ok(metrics) => info!("{}", area_summary(metrics)),
            Err(err) => error!("Area-based error: {}", err),
        }
        Some(res)
    } else {
        None
    };

    let object = if opts.run_object {
        info!("Running object-based calculations");
        let res = measure_time!(
            "object block",
            || ObjectMatcher::new(provider, opts.threshold)
                .run(ground_truth.features(), predictions.features()),
            LogType::Debug
        );
        match &res {
            Ok(metrics) => info!("{}", object_summary(metrics)),
            Err(err) => error!("Object-based error: {}", err),
        }
        Some(res)
    } else {
        None
    };

    let (report, failures) = MetricsReporter::merge(area.as_ref(), object.as_ref());
    Ok(Analysis {
        report,
        matches: object.and_then(|res| res.ok()).map(|m| m.matches),
        overlap: area.and_then(|res| res.ok()).map(|m| m.overlap),
        failures,
    })
}

fn validate<'a>(request: &AnalysisRequest<'a>) -> Result<(&'a PolygonSet, &'a PolygonSet)> {
    let opts = &request.options;
    let (ground_truth, predictions) = match (request.ground_truth, request.predictions) {
        (Some(gt), Some(pd)) => (gt, pd),
        _ => {
            return Err(EvalError::config(
                "both a ground-truth and a prediction set are required",
            ))
        }
    };
    for (set, role) in &[
        (ground_truth, Role::GroundTruth),
        (predictions, Role::Prediction),
    ] {
        if set.role() != *role {
            return Err(EvalError::config(format!(
                "set '{}' holds {}, expected {}",
                set.name(),
                set.role(),
                role
            )));
        }
        if set.is_empty() {
            return Err(EvalError::config(format!("{} set '{}' is empty", role, set.name())));
        }
        if let Some(id) = set.duplicate_id() {
            return Err(EvalError::config(format!(
                "{} set '{}' has duplicate feature id {}",
                role,
                set.name(),
                id
            )));
        }
    }
    if !(0. ..=1.).contains(&opts.threshold) {
        return Err(EvalError::config(format!(
            "threshold must be within [0, 1], got {}",
            opts.threshold
        )));
    }
    if !opts.run_area && !opts.run_object {
        return Err(EvalError::config("no metric block selected"));
    }
    Ok((ground_truth, predictions))
}
