use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;

/// An entry in the contour R-tree, referencing a contour by its position in
/// the list it was built from.
#[derive(Debug, Clone)]
pub struct ContourEntry {
    pub contour_index: usize,
    pub bbox: BBox,
}

impl RTreeObject for ContourEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Bounding-box index over contours, used to drop holes that touch no solid
/// contour without testing every pair.
pub struct ContourIndex {
    tree: RTree<ContourEntry>,
}

impl ContourIndex {
    pub fn build(entries: Vec<ContourEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Contours whose bounding box touches `bbox`.
    pub fn query_intersecting(&self, bbox: &BBox) -> Vec<&ContourEntry> {
        let envelope = AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }
}
