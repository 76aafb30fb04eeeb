//! Point quadtree for rectangular range queries.
//!
//! Complements the uniform [`crate::SpatialGrid`]: the grid answers "who is
//! near this cell" for the tick pipeline, the quadtree answers "who is inside
//! this rectangle" for selection and debugging queries. Built on demand from
//! the current unit positions.

use crate::components::{Aabb, UnitId};
use glam::Vec2;

/// Entries a node holds before it splits.
pub const MAX_OBJECTS: usize = 10;
/// Maximum depth; nodes at this level never split.
pub const MAX_LEVELS: usize = 5;

#[derive(Debug, Clone)]
pub struct QuadTree {
    level: usize,
    bounds: Aabb,
    objects: Vec<(UnitId, Vec2)>,
    nodes: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    pub fn new(bounds: Aabb) -> Self {
        Self::with_level(0, bounds)
    }

    fn with_level(level: usize, bounds: Aabb) -> Self {
        Self {
            level,
            bounds,
            objects: Vec::new(),
            nodes: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.nodes = None;
    }

    /// Quadrant a point falls into: 0 top-right, 1 top-left, 2 bottom-left,
    /// 3 bottom-right. Points on a midpoint go right/bottom.
    fn quadrant(&self, p: Vec2) -> usize {
        let mid = self.bounds.center();
        match (p.x < mid.x, p.y < mid.y) {
            (false, true) => 0,
            (true, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
        }
    }

    fn split(&mut self) {
        let min = self.bounds.min;
        let half = self.bounds.size() * 0.5;
        let level = self.level + 1;
        let quad = |x: f32, y: f32| {
            QuadTree::with_level(level, Aabb::from_origin_size(x, y, half.x, half.y))
        };
        self.nodes = Some(Box::new([
            quad(min.x + half.x, min.y),
            quad(min.x, min.y),
            quad(min.x, min.y + half.y),
            quad(min.x + half.x, min.y + half.y),
        ]));
    }

    pub fn insert(&mut self, id: UnitId, position: Vec2) {
        let index = self.quadrant(position);
        if let Some(nodes) = self.nodes.as_mut() {
            nodes[index].insert(id, position);
            return;
        }

        self.objects.push((id, position));

        if self.objects.len() > MAX_OBJECTS && self.level < MAX_LEVELS {
            self.split();
            let objects = std::mem::take(&mut self.objects);
            for (id, position) in objects {
                self.insert(id, position);
            }
        }
    }

    /// Ids of every entry whose position lies inside `range` (edges inclusive).
    pub fn query_range(&self, range: &Aabb) -> Vec<UnitId> {
        let mut found = Vec::new();
        self.collect_range(range, &mut found);
        found
    }

    fn collect_range(&self, range: &Aabb, found: &mut Vec<UnitId>) {
        if !self.bounds.intersects(range) {
            return;
        }
        found.extend(
            self.objects
                .iter()
                .filter(|(_, p)| range.contains(*p))
                .map(|(id, _)| *id),
        );
        if let Some(nodes) = &self.nodes {
            for node in nodes.iter() {
                node.collect_range(range, found);
            }
        }
    }

    /// Total entries in the tree.
    pub fn len(&self) -> usize {
        self.objects.len()
            + self
                .nodes
                .as_ref()
                .map_or(0, |nodes| nodes.iter().map(QuadTree::len).sum())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth of the deepest node.
    pub fn depth(&self) -> usize {
        self.nodes
            .as_ref()
            .map_or(self.level, |nodes| nodes.iter().map(QuadTree::depth).max().unwrap_or(self.level))
    }
}
