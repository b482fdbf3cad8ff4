//! Spatial engine for a layered, sparse 2-D tile world.
//!
//! [`GridEngine`] is the single entry point. It owns the tiles (grouped into
//! fixed-size [`Region`]s), a global [`QuadTree`] plus one per layer, the
//! active-region set and a short-lived query cache, and keeps them mutually
//! consistent as entities are placed, moved and removed.
//!
//! Reads go through the cache first, then the appropriate index. Nothing in
//! this crate returns an error for a missing tile or an entity without a
//! position: those are steady-state conditions in a sparse world and come
//! back as empty results.

use serde::{Deserialize, Serialize};

pub mod cache;
pub mod engine;
pub mod pathfinding;
pub mod profiling;
pub mod quadtree;
pub mod region;
pub mod tile;

pub use acreage_core::id::{EntityId, RegionCoord, TileCoord};
pub use acreage_core::layer::{LayerKind, LayerRecord};
pub use acreage_core::position::WorldPos;
pub use cache::{QueryCache, QueryKey};
pub use engine::GridEngine;
pub use pathfinding::{PathOutcome, PathResult};
pub use profiling::GridStats;
pub use quadtree::QuadTree;
pub use region::Region;
pub use tile::{Tile, Traversal};

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle in world space. `(x, y)` is the minimum corner.
///
/// Point membership is half-open (`x <= px < x + width`), so a point on an
/// edge shared by two adjacent rectangles belongs to exactly one of them.
/// Rectangle intersection is closed, which only ever errs towards visiting
/// an extra node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The bounding square of a circle.
    pub fn around(cx: f64, cy: f64, radius: f64) -> Self {
        Self::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn contains_pos(&self, pos: WorldPos) -> bool {
        self.contains(pos.x, pos.y)
    }

    /// True unless one rectangle lies entirely to one side of the other.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x > self.right()
            || other.right() < self.x
            || other.y > self.bottom()
            || other.bottom() < self.y)
    }

    /// The split point used by [`quadrants`](Rect::quadrants).
    pub fn midpoint(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The four quadrants, in order NW, NE, SW, SE (y grows downward).
    /// Siblings share an edge computed by the same expression on both
    /// sides, so they never overlap.
    pub fn quadrants(&self) -> [Rect; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let (mx, my) = (self.x + hw, self.y + hh);
        [
            Rect::new(self.x, self.y, hw, hh),
            Rect::new(mx, self.y, hw, hh),
            Rect::new(self.x, my, hw, hh),
            Rect::new(mx, my, hw, hh),
        ]
    }

    /// Index into [`quadrants`](Rect::quadrants) of the quadrant a point
    /// falls in. Points outside the rectangle map to the nearest quadrant.
    pub fn quadrant_of(&self, pos: WorldPos) -> usize {
        let (mx, my) = self.midpoint();
        let east = pos.x >= mx;
        let south = pos.y >= my;
        match (south, east) {
            (false, false) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (true, true) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(9.999, 9.999));
        assert!(!r.contains(10.0, 5.0));
        assert!(!r.contains(5.0, 10.0));
        assert!(!r.contains(-0.001, 5.0));
    }

    #[test]
    fn intersects_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(a.intersects(&Rect::new(2.0, 2.0, 1.0, 1.0)));
        assert!(a.intersects(&Rect::new(-5.0, -5.0, 30.0, 30.0)));
        assert!(!a.intersects(&Rect::new(10.5, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(0.0, -3.0, 5.0, 2.0)));
    }

    #[test]
    fn quadrants_tile_parent() {
        let r = Rect::new(3.0, -2.0, 7.0, 5.0);
        let q = r.quadrants();

        let area: f64 = q.iter().map(|c| c.width * c.height).sum();
        assert!((area - r.width * r.height).abs() < 1e-9);
        assert_eq!(q[0].right(), q[1].x);
        assert_eq!(q[2].right(), q[3].x);
        assert_eq!(q[0].bottom(), q[2].y);
        assert_eq!(q[1].bottom(), q[3].y);
    }

    #[test]
    fn midpoint_belongs_to_exactly_one_quadrant() {
        let r = Rect::new(0.0, 0.0, 8.0, 8.0);
        let q = r.quadrants();
        let (mx, my) = r.midpoint();

        for p in [(mx, my), (mx, 1.0), (1.0, my), (0.0, 0.0)] {
            let owners = q.iter().filter(|c| c.contains(p.0, p.1)).count();
            assert_eq!(owners, 1, "point {p:?}");
            let idx = r.quadrant_of(WorldPos::new(p.0, p.1));
            assert!(q[idx].contains(p.0, p.1));
        }
    }

    #[test]
    fn around_bounds_circle() {
        let r = Rect::around(5.0, 5.0, 2.0);
        assert_eq!(r, Rect::new(3.0, 3.0, 4.0, 4.0));
        let point = Rect::around(1.0, 1.0, 0.0);
        assert_eq!((point.width, point.height), (0.0, 0.0));
    }
}
