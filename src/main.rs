extern crate log;
extern crate log4rs;

use anyhow::{anyhow, Result};
use log::{error, info, warn, LevelFilter};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use polygon_iou::cli::build_app;
use polygon_iou::dataset::{
    load_polygon_set, write_file, write_overlap, write_scores, write_summary, IoOptions,
};
use polygon_iou::{run_analysis, AnalysisRequest, EvalOptions, GeoProvider, Role};
use std::path::Path;

const LOG_PATTERN: &str = "[{d(%H:%M:%S)}] {h({l})} {m}{n}";

fn main() -> Result<()> {
    let args = build_app().get_matches();
    let io = IoOptions::new(&args)?;
    init_logging(io.log_config_path)?;
    let opts = EvalOptions::new(&args)?;

    info!("Initializing full accuracy analysis...");
    let ground_truth = load_polygon_set(Path::new(io.ground_truth_path), Role::GroundTruth)?;
    let predictions = load_polygon_set(Path::new(io.predictions_path), Role::Prediction)?;

    let request = AnalysisRequest::new(&ground_truth, &predictions, opts);
    let analysis = match run_analysis(&GeoProvider, &request) {
        Ok(analysis) => analysis,
        Err(err) => {
            error!("{}", err);
            return Err(err.into());
        }
    };

    print!("{}", analysis.report);

    if let Some(path) = io.summary_path {
        write_file(Path::new(path), |w| write_summary(w, &analysis.report))?;
        info!("Summary table written to {}", path);
    }
    if let Some(path) = io.scores_path {
        match &analysis.matches {
            Some(matches) => {
                write_file(Path::new(path), |w| {
                    write_scores(w, predictions.name(), matches)
                })?;
                info!("Per-polygon scores written to {}", path);
            }
            None => warn!("No object-based results, {} not written", path),
        }
    }
    if let Some(path) = io.overlap_path {
        match &analysis.overlap {
            Some(overlap) => {
                write_file(Path::new(path), |w| {
                    write_overlap(w, ground_truth.name(), overlap)
                })?;
                info!("Overlap geometry written to {}", path);
            }
            None => warn!("No area-based results, {} not written", path),
        }
    }

    if analysis.report.is_empty() {
        return Err(anyhow!("Every requested metric block failed"));
    }
    info!("Analysis complete.");
    Ok(())
}

fn init_logging(config_path: &str) -> Result<()> {
    if Path::new(config_path).exists() {
        return log4rs::init_file(config_path, Default::default());
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}
