use crate::error::Result;
use crate::geometry::GeometryProvider;
use crate::polygon::Feature;
use crate::utils::ratio;
use geo::{Area, MultiPolygon};

/// Dataset-level overlap between the two polygon sets.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaMetrics {
    pub area_ground_truth: f64,
    pub area_predictions: f64,
    pub area_overlap: f64,
    pub iou: f64,
    pub dice: f64,
    pub precision: f64,
    pub recall: f64,
    /// Dissolved ground truth ∩ prediction region, for rendering.
    pub overlap: MultiPolygon<f64>,
}

pub struct AreaAggregateMetric<'a, G: GeometryProvider> {
    provider: &'a G,
}

impl<'a, G: GeometryProvider> AreaAggregateMetric<'a, G> {
    pub fn new(provider: &'a G) -> Self {
        Self { provider }
    }

    /// Overlap inside either set is not corrected: the set totals are plain
    /// sums of the polygon areas.
    pub fn run(&self, ground_truth: &[Feature], predictions: &[Feature]) -> Result<AreaMetrics> {
        let area_ground_truth = self.total_area(ground_truth)?;
        let area_predictions = self.total_area(predictions)?;

        let overlap = self.provider.dissolve_union(ground_truth, predictions)?;
        let area_overlap = overlap.unsigned_area();

        let union = area_ground_truth + area_predictions - area_overlap;
        Ok(AreaMetrics {
            area_ground_truth,
            area_predictions,
            area_overlap,
            iou: ratio(area_overlap, union),
            dice: ratio(2. * area_overlap, area_ground_truth + area_predictions),
            precision: ratio(area_overlap, area_predictions),
            recall: ratio(area_overlap, area_ground_truth),
            overlap,
        })
    }

    fn total_area(&self, features: &[Feature]) -> Result<f64> {
        features.iter().map(|f| self.provider.area(f)).sum()
    }
}
