use crate::error::{EvalError, Result};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, Polygon};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    GroundTruth,
    Prediction,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::GroundTruth => write!(f, "ground truth"),
            Role::Prediction => write!(f, "predictions"),
        }
    }
}

/// A polygon together with its stable identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: u64,
    pub geometry: Polygon<f64>,
}

impl Feature {
    pub fn new(id: u64, geometry: Polygon<f64>) -> Self {
        Self { id, geometry }
    }

    /// Builds a feature from raw rings; rings are closed if needed.
    pub fn from_rings(id: u64, exterior: &[(f64, f64)], interiors: &[Vec<(f64, f64)>]) -> Self {
        let interiors = interiors
            .iter()
            .map(|ring| LineString::from(ring.clone()))
            .collect::<Vec<LineString<f64>>>();
        Self::new(
            id,
            Polygon::new(LineString::from(exterior.to_vec()), interiors),
        )
    }

    /// Axis-aligned rectangle spanning `min` to `max`.
    pub fn rect(id: u64, min: (f64, f64), max: (f64, f64)) -> Self {
        Self::from_rings(
            id,
            &[(min.0, min.1), (max.0, min.1), (max.0, max.1), (min.0, max.1)],
            &[],
        )
    }
}

/// Ordered polygon collection. Iteration order is insertion order and drives
/// the greedy matching order.
#[derive(Debug, Clone)]
pub struct PolygonSet {
    name: String,
    role: Role,
    features: Vec<Feature>,
}

impl PolygonSet {
    pub fn new(name: impl Into<String>, role: Role, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            role,
            features,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// First identifier that occurs more than once, if any.
    pub fn duplicate_id(&self) -> Option<u64> {
        let mut seen = HashSet::with_capacity(self.features.len());
        self.features
            .iter()
            .map(|f| f.id)
            .find(|id| !seen.insert(*id))
    }
}

/// Rejects rings the area and boolean operations disagree on: non-finite
/// coordinates, fewer than three distinct vertices and self-intersections.
pub fn check_polygon(feature: &Feature) -> Result<()> {
    check_ring(feature.id, feature.geometry.exterior(), "exterior")?;
    for ring in feature.geometry.interiors() {
        check_ring(feature.id, ring, "interior")?;
    }
    Ok(())
}

fn check_ring(id: u64, ring: &LineString<f64>, kind: &str) -> Result<()> {
    if let Some(c) = ring.coords().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(EvalError::geometry(
            id,
            format!("non-finite coordinate ({}, {}) in {} ring", c.x, c.y, kind),
        ));
    }
    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }
    if distinct.len() < 3 {
        return Err(EvalError::geometry(
            id,
            format!(
                "{} ring has {} distinct vertices, at least 3 required",
                kind,
                distinct.len()
            ),
        ));
    }
    match self_intersection(ring) {
        Some(at) => Err(EvalError::geometry(
            id,
            format!("{} ring self-intersects at ({}, {})", kind, at.x, at.y),
        )),
        None => Ok(()),
    }
}

/// First crossing or touch between two edges of `ring`, apart from the shared
/// endpoint of neighbouring edges. Repeated vertices are ignored.
fn self_intersection(ring: &LineString<f64>) -> Option<Coord<f64>> {
    let edges = ring
        .lines()
        .filter(|l| l.start != l.end)
        .collect::<Vec<Line<f64>>>();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(edges[i], edges[j]) {
                Some(LineIntersection::Collinear { intersection }) => {
                    return Some(intersection.start)
                }
                Some(LineIntersection::SinglePoint { intersection, .. }) if !adjacent => {
                    return Some(intersection)
                }
                _ => {}
            }
        }
    }
    None
}
