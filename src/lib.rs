//! Accuracy metrics for predicted polygons against ground truth.
//!
//! Two independent metric blocks are provided: a greedy object matcher
//! (per-prediction IoU, TP/FP/FN, precision, recall, F1, mIoU) and an
//! area-level overlap measure over the dissolved intersection of both sets.
//! [`evaluation::run_analysis`] validates a request, runs the selected blocks
//! and merges their results into one ordered [`evaluation::report::AccuracyReport`].

#[macro_use]
pub mod macros;

pub mod cli;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod geometry;
pub mod polygon;
pub mod spatial_index;
pub mod utils;

pub use error::{EvalError, Result};
pub use evaluation::options::EvalOptions;
pub use evaluation::{run_analysis, Analysis, AnalysisRequest};
pub use geometry::{GeoProvider, GeometryProvider};
pub use polygon::{Feature, PolygonSet, Role};
