//! Region quadtree over particle positions.
//!
//! The tree is rebuilt from scratch every tick and answers axis-aligned box
//! queries, so the force pass only visits particles near each other instead of
//! every pair.
//!
//! - A node is a leaf holding up to `capacity` points.
//! - The first insertion past capacity splits the node at its center into four
//!   quadrants (NW, NE, SW, SE); the node keeps the points it already had and
//!   later points go to the child that contains them.
//! - Nodes never merge back.
//! - At `max_depth` a node stops splitting and simply grows, so many coincident
//!   points cannot recurse without bound.

use particle_life_common::Vec2;

/// Axis-aligned rectangle given by its center and half extents.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Boundary {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
}

impl Boundary {
    pub fn new(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Boundary { center, half_width, half_height }
    }

    /// Boundary spanning `[0, width) x [0, height)`.
    pub fn arena(width: f32, height: f32) -> Self {
        Boundary::new(Vec2::new(width * 0.5, height * 0.5), width * 0.5, height * 0.5)
    }

    #[inline(always)]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.center.x - self.half_width, self.center.y - self.half_height)
    }

    #[inline(always)]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.center.x + self.half_width, self.center.y + self.half_height)
    }

    /// Half-open containment: min edges inclusive, max edges exclusive, so a
    /// point on a shared quadrant edge belongs to exactly one quadrant.
    #[inline(always)]
    pub fn contains(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
    }

    /// True rectangle intersection test.
    #[inline(always)]
    pub fn intersects(&self, other: &Boundary) -> bool {
        (self.center.x - other.center.x).abs() <= self.half_width + other.half_width
            && (self.center.y - other.center.y).abs() <= self.half_height + other.half_height
    }

    /// Same rectangle moved by `offset`.
    pub fn translated(&self, offset: Vec2) -> Boundary {
        Boundary::new(self.center + offset, self.half_width, self.half_height)
    }

    // Quadrants in NW, NE, SW, SE order (y grows downward, screen convention).
    fn quadrants(&self) -> [Boundary; 4] {
        let hw = self.half_width * 0.5;
        let hh = self.half_height * 0.5;
        let c = self.center;
        [
            Boundary::new(Vec2::new(c.x - hw, c.y - hh), hw, hh),
            Boundary::new(Vec2::new(c.x + hw, c.y - hh), hw, hh),
            Boundary::new(Vec2::new(c.x - hw, c.y + hh), hw, hh),
            Boundary::new(Vec2::new(c.x + hw, c.y + hh), hw, hh),
        ]
    }
}

/// A stored point: its position and the particle index it came from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadPoint {
    pub position: Vec2,
    pub index: usize,
}

#[derive(Debug)]
pub struct QuadTree {
    boundary: Boundary,
    capacity: usize,
    depth_left: u32,
    points: Vec<QuadPoint>,
    children: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    /// Creates an empty tree. `capacity` is clamped to at least one point per node.
    pub fn new(boundary: Boundary, capacity: usize, max_depth: u32) -> Self {
        QuadTree {
            boundary,
            capacity: capacity.max(1),
            depth_left: max_depth,
            points: Vec::new(),
            children: None,
        }
    }

    /// Builds a tree over the given positions, tagging each point with its slice index.
    pub fn build(boundary: Boundary, capacity: usize, max_depth: u32, positions: &[Vec2]) -> Self {
        let mut tree = QuadTree::new(boundary, capacity, max_depth);
        for (index, &position) in positions.iter().enumerate() {
            if !tree.insert(QuadPoint { position, index }) {
                log::warn!("Particle {} at {:?} lies outside the spatial index bounds.", index, position);
            }
        }
        tree
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// Points stored directly in this node (not in its children).
    pub fn points(&self) -> &[QuadPoint] {
        &self.points
    }

    /// Inserts a point. Returns `false` if the point lies outside this node.
    pub fn insert(&mut self, point: QuadPoint) -> bool {
        if !self.boundary.contains(point.position) {
            return false;
        }

        if self.children.is_none() && (self.points.len() < self.capacity || self.depth_left == 0) {
            self.points.push(point);
            return true;
        }

        if self.children.is_none() {
            self.subdivide();
        }

        match self.children.as_mut() {
            Some(children) => {
                if children.iter_mut().any(|child| child.insert(point)) {
                    return true;
                }
                // Float rounding at the split line can leave a point in no child.
                self.points.push(point);
                true
            }
            None => false,
        }
    }

    fn subdivide(&mut self) {
        let depth = self.depth_left.saturating_sub(1);
        let [nw, ne, sw, se] = self.boundary.quadrants();
        self.children = Some(Box::new([
            QuadTree::new(nw, self.capacity, depth),
            QuadTree::new(ne, self.capacity, depth),
            QuadTree::new(sw, self.capacity, depth),
            QuadTree::new(se, self.capacity, depth),
        ]));
    }

    /// Appends every stored point that lies inside `range` to `found`.
    pub fn query(&self, range: &Boundary, found: &mut Vec<QuadPoint>) {
        if !self.boundary.intersects(range) {
            return;
        }

        found.extend(self.points.iter().filter(|p| range.contains(p.position)));

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, found);
            }
        }
    }

    /// Total number of points in this subtree.
    pub fn len(&self) -> usize {
        self.points.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(QuadTree::len).sum())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
