//! Object-level matching of predictions to ground-truth polygons.
//!
//! Matching is greedy and first-come: predictions are visited in input order
//! and each one claims the still-free ground-truth polygon it overlaps best.
//! When several predictions compete for the same ground truth the outcome can
//! be worse than a maximum-weight bipartite assignment.

use crate::error::Result;
use crate::geometry::GeometryProvider;
use crate::polygon::Feature;
use crate::spatial_index::SpatialIndex;
use crate::utils::ratio;
use log::{debug, trace};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub prediction_id: u64,
    pub matched_ground_truth_id: Option<u64>,
    /// Best IoU found for the prediction, recorded even when below threshold.
    pub iou_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMetrics {
    pub threshold: f64,
    pub ground_truth_count: usize,
    pub prediction_count: usize,
    pub counts: ClassificationCounts,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub mean_iou: f64,
    /// One entry per prediction, in prediction order.
    pub matches: Vec<MatchResult>,
}

impl ObjectMetrics {
    pub fn best_ious(&self) -> Vec<f64> {
        self.matches.iter().map(|m| m.iou_score).collect()
    }
}

pub struct ObjectMatcher<'a, G: GeometryProvider> {
    provider: &'a G,
    threshold: f64,
}

impl<'a, G: GeometryProvider> ObjectMatcher<'a, G> {
    pub fn new(provider: &'a G, threshold: f64) -> Self {
        Self {
            provider,
            threshold,
        }
    }

    pub fn run(&self, ground_truth: &[Feature], predictions: &[Feature]) -> Result<ObjectMetrics> {
        let boxes = ground_truth
            .iter()
            .map(|g| self.provider.bounding_box(g))
            .collect::<Result<Vec<_>>>()?;
        let index = SpatialIndex::build(boxes);
        debug!("indexed {} ground-truth polygons", index.len());

        let mut gt_areas: Vec<Option<f64>> = vec![None; ground_truth.len()];
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut matches = Vec::with_capacity(predictions.len());

        for pred in predictions {
            let pred_area = self.provider.area(pred)?;
            let candidates = index.query(&self.provider.bounding_box(pred)?);
            trace!("prediction {}: {} candidates", pred.id, candidates.len());

            let mut best_iou = 0.;
            let mut best_pos: Option<usize> = None;
            for pos in candidates {
                if consumed.contains(&pos) {
                    continue;
                }
                let gt = &ground_truth[pos];
                let intersection = self.provider.intersection_area(pred, gt)?;
                if intersection <= 0. {
                    continue;
                }
                let gt_area = match gt_areas[pos] {
                    Some(area) => area,
                    None => {
                        let area = self.provider.area(gt)?;
                        gt_areas[pos] = Some(area);
                        area
                    }
                };
                let iou = ratio(intersection, pred_area + gt_area - intersection);
                if iou > best_iou {
                    best_iou = iou;
                    best_pos = Some(pos);
                }
            }

            let matched = match best_pos {
                Some(pos) if best_iou >= self.threshold => {
                    consumed.insert(pos);
                    Some(ground_truth[pos].id)
                }
                _ => None,
            };
            trace!(
                "prediction {}: best iou {:.4}, matched {:?}",
                pred.id,
                best_iou,
                matched
            );
            matches.push(MatchResult {
                prediction_id: pred.id,
                matched_ground_truth_id: matched,
                iou_score: best_iou,
            });
        }

        Ok(summarize(
            self.threshold,
            ground_truth.len(),
            predictions.len(),
            matches,
        ))
    }
}

fn summarize(
    threshold: f64,
    ground_truth_count: usize,
    prediction_count: usize,
    matches: Vec<MatchResult>,
) -> ObjectMetrics {
    let true_positive = matches
        .iter()
        .filter(|m| m.matched_ground_truth_id.is_some())
        .count();
    let counts = ClassificationCounts {
        true_positive,
        false_positive: prediction_count - true_positive,
        false_negative: ground_truth_count - true_positive,
    };
    let precision = ratio(true_positive as f64, prediction_count as f64);
    let recall = ratio(true_positive as f64, ground_truth_count as f64);
    let f1 = ratio(2. * precision * recall, precision + recall);
    let mean_iou = ratio(
        matches.iter().map(|m| m.iou_score).sum::<f64>(),
        matches.len() as f64,
    );

    ObjectMetrics {
        threshold,
        ground_truth_count,
        prediction_count,
        counts,
        precision,
        recall,
        f1,
        mean_iou,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::geometry::GeoProvider;
    use anyhow::Result;

    const EPS: f64 = 1e-9;

    fn scattered_scene() -> (Vec<Feature>, Vec<Feature>) {
        let gt = vec![
            Feature::rect(1, (0., 0.), (10., 10.)),
            Feature::rect(2, (20., 0.), (30., 10.)),
            Feature::rect(3, (40., 0.), (50., 10.)),
            Feature::rect(4, (60., 0.), (70., 10.)),
        ];
        let pred = vec![
            // iou 1.0 with 1
            Feature::rect(100, (0., 0.), (10., 10.)),
            // iou 0.6 with 2
            Feature::rect(101, (20., 0.), (30., 6.)),
            // iou 0.3 with 3
            Feature::rect(102, (40., 0.), (43., 10.)),
            // far away
            Feature::rect(103, (200., 200.), (210., 210.)),
            // iou 0.5 with 4
            Feature::rect(104, (60., 0.), (65., 10.)),
        ];
        (gt, pred)
    }

    #[test]
    fn identical_squares_match() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let pred = vec![Feature::rect(7, (0., 0.), (10., 10.))];
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&gt, &pred)?;

        assert_eq!(
            metrics.counts,
            ClassificationCounts {
                true_positive: 1,
                false_positive: 0,
                false_negative: 0
            }
        );
        assert!((metrics.mean_iou - 1.).abs() < EPS);
        assert!((metrics.f1 - 1.).abs() < EPS);
        assert_eq!(
            metrics.matches,
            vec![MatchResult {
                prediction_id: 7,
                matched_ground_truth_id: Some(1),
                iou_score: 1.,
            }]
        );
        Ok(())
    }

    #[test]
    fn half_size_prediction_meets_threshold_exactly() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let pred = vec![Feature::rect(2, (0., 0.), (5., 10.))];
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&gt, &pred)?;
        assert!((metrics.matches[0].iou_score - 0.5).abs() < EPS);
        assert_eq!(metrics.counts.true_positive, 1);
        Ok(())
    }

    #[test]
    fn empty_ground_truth() -> Result<()> {
        let provider = GeoProvider;
        let pred = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&[], &pred)?;
        assert_eq!(
            metrics.counts,
            ClassificationCounts {
                true_positive: 0,
                false_positive: 1,
                false_negative: 0
            }
        );
        assert_eq!(metrics.precision, 0.);
        assert_eq!(metrics.recall, 0.);
        assert_eq!(metrics.f1, 0.);
        assert_eq!(metrics.mean_iou, 0.);
        assert_eq!(metrics.best_ious(), vec![0.]);
        Ok(())
    }

    #[test]
    fn empty_predictions() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&gt, &[])?;
        assert_eq!(metrics.counts.false_negative, 1);
        assert_eq!(metrics.mean_iou, 0.);
        assert!(metrics.matches.is_empty());
        Ok(())
    }

    #[test]
    fn earlier_prediction_wins_contested_ground_truth() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let pred = vec![
            // iou 0.6
            Feature::rect(10, (0., 0.), (6., 10.)),
            // iou 0.9, but the ground truth is already taken
            Feature::rect(11, (0., 0.), (9., 10.)),
        ];
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&gt, &pred)?;
        assert_eq!(metrics.matches[0].matched_ground_truth_id, Some(1));
        assert!((metrics.matches[0].iou_score - 0.6).abs() < EPS);
        assert_eq!(metrics.matches[1].matched_ground_truth_id, None);
        // consumed ground truth is not a candidate anymore
        assert_eq!(metrics.matches[1].iou_score, 0.);
        assert_eq!(metrics.counts.true_positive, 1);
        assert_eq!(metrics.counts.false_positive, 1);
        Ok(())
    }

    #[test]
    fn below_threshold_prediction_does_not_consume() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let pred = vec![
            // iou 0.2
            Feature::rect(10, (0., 0.), (2., 10.)),
            // iou 0.8
            Feature::rect(11, (0., 0.), (8., 10.)),
        ];
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&gt, &pred)?;
        assert_eq!(metrics.matches[0].matched_ground_truth_id, None);
        assert!((metrics.matches[0].iou_score - 0.2).abs() < EPS);
        assert_eq!(metrics.matches[1].matched_ground_truth_id, Some(1));
        Ok(())
    }

    #[test]
    fn ties_keep_first_ground_truth() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![
            Feature::rect(5, (10., 0.), (20., 10.)),
            Feature::rect(6, (-10., 0.), (0., 10.)),
        ];
        // straddles both ground-truth squares symmetrically
        let pred = vec![Feature::rect(1, (-5., 0.), (15., 10.))];
        let metrics = ObjectMatcher::new(&provider, 0.).run(&gt, &pred)?;
        assert_eq!(metrics.matches[0].matched_ground_truth_id, Some(5));
        Ok(())
    }

    #[test]
    fn counts_stay_consistent() -> Result<()> {
        let provider = GeoProvider;
        let (gt, pred) = scattered_scene();
        let metrics = ObjectMatcher::new(&provider, 0.5).run(&gt, &pred)?;
        let c = metrics.counts;
        assert_eq!(c.true_positive + c.false_negative, gt.len());
        assert_eq!(c.true_positive + c.false_positive, pred.len());
        assert_eq!(c.true_positive, 3);
        assert!((metrics.precision - 0.6).abs() < EPS);
        assert!((metrics.recall - 0.75).abs() < EPS);
        assert!((metrics.mean_iou - (1. + 0.6 + 0.3 + 0. + 0.5) / 5.).abs() < EPS);
        for m in &metrics.matches {
            assert!((0. ..=1.).contains(&m.iou_score));
        }
        Ok(())
    }

    #[test]
    fn raising_threshold_never_adds_matches() -> Result<()> {
        let provider = GeoProvider;
        let (gt, pred) = scattered_scene();
        let mut previous = usize::MAX;
        for step in 0..=10 {
            let threshold = step as f64 / 10.;
            let tp = ObjectMatcher::new(&provider, threshold)
                .run(&gt, &pred)?
                .counts
                .true_positive;
            assert!(tp <= previous, "threshold {} gave {} > {}", threshold, tp, previous);
            previous = tp;
        }
        assert_eq!(previous, 1);
        Ok(())
    }

    #[test]
    fn repeated_runs_are_identical() -> Result<()> {
        let provider = GeoProvider;
        let (gt, pred) = scattered_scene();
        let matcher = ObjectMatcher::new(&provider, 0.5);
        assert_eq!(matcher.run(&gt, &pred)?, matcher.run(&gt, &pred)?);
        Ok(())
    }

    #[test]
    fn irregular_polygons_score_within_range() -> Result<()> {
        let provider = GeoProvider;
        let gt = vec![
            Feature::from_rings(1, &[(0., 0.), (10., 0.), (0., 10.)], &[]),
            Feature::from_rings(
                2,
                &[(20., 0.), (30., 0.), (30., 10.), (20., 10.)],
                &[vec![(22., 2.), (28., 2.), (28., 8.), (22., 8.)]],
            ),
            Feature::from_rings(
                3,
                &[(40., 0.), (50., 0.), (50., 4.), (44., 4.), (44., 10.), (40., 10.)],
                &[],
            ),
        ];
        let pred = vec![
            // covers the triangle twice over
            Feature::rect(10, (0., 0.), (10., 10.)),
            // covers the hole as well
            Feature::rect(11, (20., 0.), (30., 10.)),
            // only the foot of the L
            Feature::rect(12, (40., 0.), (50., 4.)),
            Feature::from_rings(13, &[(44., 4.), (44., 10.), (40., 10.)], &[]),
        ];
        let metrics = ObjectMatcher::new(&provider, 0.6).run(&gt, &pred)?;
        let ious = metrics.best_ious();
        assert!((ious[0] - 0.5).abs() < EPS);
        assert!((ious[1] - 0.64).abs() < EPS);
        assert!((ious[2] - 0.625).abs() < EPS);
        // the L is taken by the previous prediction
        assert_eq!(ious[3], 0.);
        for iou in &ious {
            assert!((0. ..=1.).contains(iou));
        }
        assert_eq!(metrics.counts.true_positive, 2);
        assert_eq!(metrics.matches[0].matched_ground_truth_id, None);
        Ok(())
    }

    #[test]
    fn self_intersecting_prediction_fails_the_block() {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let pred = vec![Feature::from_rings(
            5,
            &[(0., 0.), (10., 10.), (10., 0.), (0., 10.)],
            &[],
        )];
        match ObjectMatcher::new(&provider, 0.5).run(&gt, &pred) {
            Err(EvalError::Geometry { id, msg }) => {
                assert_eq!(id, 5);
                assert!(msg.contains("self-intersects"));
            }
            other => panic!("expected geometry error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_prediction_fails_the_block() {
        let provider = GeoProvider;
        let gt = vec![Feature::rect(1, (0., 0.), (10., 10.))];
        let pred = vec![Feature::from_rings(3, &[(0., 0.), (1., 1.)], &[])];
        assert!(ObjectMatcher::new(&provider, 0.5).run(&gt, &pred).is_err());
    }
}
