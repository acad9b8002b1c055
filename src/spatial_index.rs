use geo::Rect;
use rstar::{RTree, RTreeObject, AABB};

/// Bounding box of one ground-truth polygon, keyed by its position in the set.
#[derive(Debug, Clone, PartialEq)]
struct IndexNode {
    pos: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for IndexNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.bbox)
    }
}

fn envelope_of(bbox: &Rect<f64>) -> AABB<[f64; 2]> {
    let (min, max) = (bbox.min(), bbox.max());
    AABB::from_corners([min.x, min.y], [max.x, max.y])
}

/// Bulk-loaded R-tree over ground-truth bounding boxes. Built once per
/// analysis run and never mutated afterwards.
pub struct SpatialIndex {
    tree: RTree<IndexNode>,
}

impl SpatialIndex {
    /// `boxes` yields the bounding box of each ground-truth polygon in set order.
    pub fn build(boxes: impl IntoIterator<Item = Rect<f64>>) -> Self {
        let nodes = boxes
            .into_iter()
            .enumerate()
            .map(|(pos, bbox)| IndexNode { pos, bbox })
            .collect::<Vec<IndexNode>>();
        Self {
            tree: RTree::bulk_load(nodes),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Positions of every indexed box intersecting `bbox` (touching counts),
    /// in ascending set order. No geometric test is done here.
    pub fn query(&self, bbox: &Rect<f64>) -> Vec<usize> {
        let env = envelope_of(bbox);
        let mut candidates = self
            .tree
            .locate_in_envelope_intersecting(&env)
            .map(|node| node.pos)
            .collect::<Vec<usize>>();
        candidates.sort_unstable();
        candidates
    }
}
