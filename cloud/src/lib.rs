//! Point cloud operations: filtering, normal estimation, segmentation,
//! clustering and rigid registration.

pub mod filtering;
pub mod normals;
pub mod registration;
pub mod segmentation;

pub use filtering::*;
pub use normals::*;
pub use registration::*;
pub use segmentation::*;

pub use cvkit_core::{Error, PointCloud, Result};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// R-tree entry carrying the point's index in the owning cloud.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexedPoint {
    pub index: usize,
    pub pos: [f32; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        let dz = self.pos[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

pub(crate) fn build_index(pc: &PointCloud) -> RTree<IndexedPoint> {
    let entries: Vec<IndexedPoint> = pc
        .points
        .iter()
        .enumerate()
        .map(|(index, p)| IndexedPoint {
            index,
            pos: [p.x, p.y, p.z],
        })
        .collect();
    RTree::bulk_load(entries)
}
