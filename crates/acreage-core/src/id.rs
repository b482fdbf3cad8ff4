use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies an entity placed on the grid. Minted by the host's entity
    /// store; the grid only ever holds references to it.
    pub struct EntityId;
}

/// An integer tile coordinate. Tiles are keyed sparsely, so any `i32` pair
/// is a valid coordinate regardless of the nominal world size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

/// 8-connected offsets, cardinals first.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing a world-space point. Positions in `[N, N+1)`
    /// belong to tile `N` on both axes, including negative positions.
    /// Positions beyond the `i32` range saturate to the edge tile; NaN maps
    /// to 0. See [`in_tile_range`](Self::in_tile_range).
    pub fn containing(x: f64, y: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Whether [`containing`](Self::containing) maps `(x, y)` without
    /// saturating: both values finite and inside the `i32` tile range.
    pub fn in_tile_range(x: f64, y: f64) -> bool {
        let range = f64::from(i32::MIN)..f64::from(i32::MAX) + 1.0;
        range.contains(&x) && range.contains(&y)
    }

    /// Chebyshev (chessboard) distance to another coordinate.
    pub fn chebyshev_distance(&self, other: &TileCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Straight-line distance between tile origins.
    pub fn euclidean_distance(&self, other: &TileCoord) -> f64 {
        let dx = f64::from(self.x.abs_diff(other.x));
        let dy = f64::from(self.y.abs_diff(other.y));
        dx.hypot(dy)
    }

    /// The surrounding coordinates, cardinals first, paired with whether the
    /// step is diagonal. Neighbours past the `i32` edge are left out, so a
    /// tile on the edge has fewer than eight.
    pub fn neighbors_8(self) -> impl Iterator<Item = (TileCoord, bool)> {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let x = self.x.checked_add(dx)?;
            let y = self.y.checked_add(dy)?;
            Some((TileCoord::new(x, y), dx != 0 && dy != 0))
        })
    }
}

/// A chunk coordinate: `(tile.x div region_size, tile.y div region_size)`
/// using floor division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionCoord {
    pub x: i32,
    pub y: i32,
}

impl RegionCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk owning `tile`. `region_size` must be positive.
    pub fn of(tile: TileCoord, region_size: i32) -> Self {
        Self {
            x: tile.x.div_euclid(region_size),
            y: tile.y.div_euclid(region_size),
        }
    }

    /// The chunk containing a world-space point.
    pub fn containing(x: f64, y: f64, region_size: i32) -> Self {
        let size = f64::from(region_size);
        Self {
            x: (x / size).floor() as i32,
            y: (y / size).floor() as i32,
        }
    }

    /// Top-left tile of this chunk, saturating at the `i32` edge.
    pub fn origin(&self, region_size: i32) -> TileCoord {
        TileCoord::new(
            self.x.saturating_mul(region_size),
            self.y.saturating_mul(region_size),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_floors_positive_positions() {
        assert_eq!(TileCoord::containing(7.0, 7.0), TileCoord::new(7, 7));
        assert_eq!(TileCoord::containing(7.999, 7.5), TileCoord::new(7, 7));
        assert_eq!(TileCoord::containing(8.0, 0.1), TileCoord::new(8, 0));
    }

    #[test]
    fn containing_floors_negative_positions() {
        assert_eq!(TileCoord::containing(-0.5, -1.0), TileCoord::new(-1, -1));
        assert_eq!(TileCoord::containing(-1.01, 0.0), TileCoord::new(-2, 0));
    }

    #[test]
    fn chebyshev_distance() {
        let a = TileCoord::new(5, 5);
        let b = TileCoord::new(9, 7);
        assert_eq!(a.chebyshev_distance(&b), 4);
        assert_eq!(b.chebyshev_distance(&a), 4);
        assert_eq!(a.chebyshev_distance(&a), 0);
    }

    #[test]
    fn neighbors_8_marks_diagonals() {
        let center = TileCoord::new(0, 0);
        let neighbors: Vec<_> = center.neighbors_8().collect();
        assert_eq!(neighbors.len(), 8);
        assert_eq!(neighbors.iter().filter(|(_, diag)| *diag).count(), 4);
        assert!(neighbors.contains(&(TileCoord::new(1, 1), true)));
        assert!(neighbors.contains(&(TileCoord::new(0, -1), false)));
        assert!(!neighbors.iter().any(|(c, _)| *c == center));
    }

    #[test]
    fn distances_span_the_full_i32_range() {
        let min = TileCoord::new(i32::MIN, 0);
        let max = TileCoord::new(i32::MAX, 0);
        assert_eq!(min.chebyshev_distance(&max), u32::MAX);
        assert_eq!(max.chebyshev_distance(&min), u32::MAX);
        assert_eq!(min.euclidean_distance(&max), f64::from(u32::MAX));
    }

    #[test]
    fn neighbors_8_stop_at_the_i32_edge() {
        let corner = TileCoord::new(i32::MAX, i32::MIN);
        let neighbors: Vec<_> = corner.neighbors_8().collect();
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.contains(&(TileCoord::new(i32::MAX - 1, i32::MIN), false)));
        assert!(neighbors.contains(&(TileCoord::new(i32::MAX, i32::MIN + 1), false)));
        assert!(neighbors.contains(&(TileCoord::new(i32::MAX - 1, i32::MIN + 1), true)));

        let edge = TileCoord::new(i32::MAX, 0);
        assert_eq!(edge.neighbors_8().count(), 5);
    }

    #[test]
    fn tile_range_check() {
        assert!(TileCoord::in_tile_range(0.0, -5.5));
        assert!(TileCoord::in_tile_range(f64::from(i32::MIN), 2_147_483_647.9));
        assert!(!TileCoord::in_tile_range(1e12, 0.0));
        assert!(!TileCoord::in_tile_range(0.0, f64::NAN));
        assert!(!TileCoord::in_tile_range(f64::NEG_INFINITY, 0.0));
        assert_eq!(TileCoord::containing(1e12, -1e12), TileCoord::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn origin_saturates() {
        assert_eq!(
            RegionCoord::new(i32::MAX, i32::MIN).origin(16),
            TileCoord::new(i32::MAX, i32::MIN)
        );
    }

    #[test]
    fn region_of_uses_floor_division() {
        assert_eq!(RegionCoord::of(TileCoord::new(0, 15), 16), RegionCoord::new(0, 0));
        assert_eq!(RegionCoord::of(TileCoord::new(16, 31), 16), RegionCoord::new(1, 1));
        assert_eq!(RegionCoord::of(TileCoord::new(-1, -16), 16), RegionCoord::new(-1, -1));
        assert_eq!(RegionCoord::of(TileCoord::new(-17, 0), 16), RegionCoord::new(-2, 0));
    }

    #[test]
    fn region_containing_world_point() {
        assert_eq!(RegionCoord::containing(15.9, 16.0, 16), RegionCoord::new(0, 1));
        assert_eq!(RegionCoord::containing(-0.1, 0.0, 16), RegionCoord::new(-1, 0));
        assert_eq!(RegionCoord::new(2, -1).origin(16), TileCoord::new(32, -16));
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(TileCoord::new(0, 0), "origin");
        map.insert(TileCoord::new(1, 0), "east");
        assert_eq!(map[&TileCoord::new(0, 0)], "origin");
    }
}
