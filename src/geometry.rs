//! Geometry primitives consumed by the metric blocks.
//!
//! The matcher and the area metric only ever talk to [`GeometryProvider`], so
//! any polygon library that can answer the four operations below can stand in
//! for the default [`GeoProvider`].

use crate::error::{EvalError, Result};
use crate::polygon::{check_polygon, Feature};
use crate::spatial_index::SpatialIndex;
use geo::{Area, BooleanOps, BoundingRect, MultiPolygon, Rect};
use log::{debug, warn};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

pub trait GeometryProvider {
    /// Unsigned area, holes subtracted.
    fn area(&self, feature: &Feature) -> Result<f64>;

    fn bounding_box(&self, feature: &Feature) -> Result<Rect<f64>>;

    fn intersection_area(&self, a: &Feature, b: &Feature) -> Result<f64>;

    /// Intersects every ground-truth polygon with every prediction and
    /// dissolves the pieces into one non-overlapping region.
    fn dissolve_union(
        &self,
        ground_truth: &[Feature],
        predictions: &[Feature],
    ) -> Result<MultiPolygon<f64>>;
}

/// [`GeometryProvider`] backed by the `geo` boolean operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoProvider;

impl GeometryProvider for GeoProvider {
    fn area(&self, feature: &Feature) -> Result<f64> {
        check_polygon(feature)?;
        Ok(feature.geometry.unsigned_area())
    }

    fn bounding_box(&self, feature: &Feature) -> Result<Rect<f64>> {
        check_polygon(feature)?;
        feature
            .geometry
            .bounding_rect()
            .ok_or_else(|| EvalError::geometry(feature.id, "polygon has no coordinates"))
    }

    fn intersection_area(&self, a: &Feature, b: &Feature) -> Result<f64> {
        check_polygon(a)?;
        check_polygon(b)?;
        let shared = guarded(|| a.geometry.intersection(&b.geometry)).map_err(|msg| {
            EvalError::geometry(a.id, format!("intersection with {} failed: {}", b.id, msg))
        })?;
        Ok(shared.unsigned_area())
    }

    fn dissolve_union(
        &self,
        ground_truth: &[Feature],
        predictions: &[Feature],
    ) -> Result<MultiPolygon<f64>> {
        let boxes = ground_truth
            .iter()
            .map(|g| self.bounding_box(g))
            .collect::<Result<Vec<Rect<f64>>>>()?;
        let index = SpatialIndex::build(boxes);

        let mut pieces = Vec::new();
        for pred in predictions {
            let bbox = self.bounding_box(pred)?;
            for pos in index.query(&bbox) {
                let gt = &ground_truth[pos];
                let piece = guarded(|| gt.geometry.intersection(&pred.geometry)).map_err(|msg| {
                    EvalError::geometry(
                        pred.id,
                        format!("intersection with {} failed: {}", gt.id, msg),
                    )
                })?;
                if !piece.0.is_empty() {
                    pieces.push(piece);
                }
            }
        }
        debug!("dissolving {} overlap pieces", pieces.len());
        cascaded_union(pieces)
    }
}

/// Unions the pieces pairwise, halving the count each round.
fn cascaded_union(mut pieces: Vec<MultiPolygon<f64>>) -> Result<MultiPolygon<f64>> {
    while pieces.len() > 1 {
        let mut next = Vec::with_capacity((pieces.len() + 1) / 2);
        let mut iter = pieces.into_iter();
        while let Some(first) = iter.next() {
            match iter.next() {
                Some(second) => {
                    next.push(guarded(|| first.union(&second)).map_err(EvalError::Dissolve)?)
                }
                None => next.push(first),
            }
        }
        pieces = next;
    }
    Ok(pieces.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new())))
}

thread_local! {
    static GUARDED: Cell<bool> = Cell::new(false);
}

static QUIET_HOOK: Once = Once::new();

/// Wraps the current panic hook so it stays silent for panics raised inside
/// [`guarded`] on the same thread. Other panics reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !GUARDED.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

struct GuardedScope;

impl GuardedScope {
    fn enter() -> Self {
        GUARDED.with(|g| g.set(true));
        GuardedScope
    }
}

impl Drop for GuardedScope {
    fn drop(&mut self) {
        GUARDED.with(|g| g.set(false));
    }
}

/// Runs a boolean operation, turning a panic inside the sweep into an error
/// message scoped to the caller. The panic is logged instead of printed.
fn guarded<T>(op: impl FnOnce() -> T) -> std::result::Result<T, String> {
    install_quiet_hook();
    let res = {
        let _scope = GuardedScope::enter();
        panic::catch_unwind(AssertUnwindSafe(op))
    };
    res.map_err(|payload| {
        let msg = panic_message(payload.as_ref());
        warn!("boolean operation panicked: {}", msg);
        msg
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "boolean operation panicked".to_string()
    }
}
