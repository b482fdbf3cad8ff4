//! A* over the 8-connected tile graph.
//!
//! The search is decoupled from tile storage: the caller supplies a
//! `step_cost` function returning the destination tile's movement cost
//! multiplier, or `None` when the tile cannot be entered (missing, or below
//! [`MIN_ACCESSIBILITY`](crate::tile::MIN_ACCESSIBILITY)). Axis-aligned
//! steps cost `1 * multiplier`, diagonal steps `sqrt(2) * multiplier`.
//!
//! The heuristic is straight-line distance, which never overestimates as
//! long as every multiplier is at least 1. Cheaper tiles still produce a
//! valid path, just not a guaranteed shortest one.

use acreage_core::id::TileCoord;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

const DIAGONAL: f64 = std::f64::consts::SQRT_2;

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// A path to the goal was found.
    Found,
    /// Start and goal are the same tile.
    Trivial,
    /// The open set ran dry: the goal cannot be reached.
    Unreachable,
    /// The expansion budget ran out before the goal was reached.
    BudgetExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Steps from start to goal, excluding the start and including the goal.
    /// Empty unless `outcome` is [`PathOutcome::Found`].
    pub path: Vec<TileCoord>,
    /// Total cost of `path`.
    pub cost: f64,
    /// Nodes expanded by the search.
    pub expanded: usize,
    pub outcome: PathOutcome,
}

impl PathResult {
    fn empty(expanded: usize, outcome: PathOutcome) -> Self {
        Self {
            path: Vec::new(),
            cost: 0.0,
            expanded,
            outcome,
        }
    }

    pub fn is_found(&self) -> bool {
        self.outcome == PathOutcome::Found
    }
}

/// Open-set entry. Orders so that `BinaryHeap` pops the lowest `f` first,
/// preferring deeper nodes (higher `g`) on ties, then the lower coordinate.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    f: f64,
    g: f64,
    coord: TileCoord,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

/// Find a path from `start` to `goal`, expanding at most `max_expansions`
/// nodes.
pub fn find_path(
    start: TileCoord,
    goal: TileCoord,
    max_expansions: usize,
    step_cost: impl Fn(TileCoord) -> Option<f64>,
) -> PathResult {
    if start == goal {
        return PathResult::empty(0, PathOutcome::Trivial);
    }

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<TileCoord, f64> = HashMap::new();
    let mut came_from: HashMap<TileCoord, TileCoord> = HashMap::new();
    let mut expanded = 0usize;

    best_g.insert(start, 0.0);
    open.push(Frontier {
        f: start.euclidean_distance(&goal),
        g: 0.0,
        coord: start,
    });

    while let Some(Frontier { g, coord, .. }) = open.pop() {
        if coord == goal {
            return PathResult {
                path: reconstruct(&came_from, start, goal),
                cost: g,
                expanded,
                outcome: PathOutcome::Found,
            };
        }
        // Superseded by a cheaper route pushed later.
        if best_g.get(&coord).is_some_and(|&known| g > known) {
            continue;
        }
        if expanded >= max_expansions {
            tracing::warn!(
                ?start,
                ?goal,
                max_expansions,
                "path search hit its expansion limit"
            );
            return PathResult::empty(expanded, PathOutcome::BudgetExhausted);
        }
        expanded += 1;

        for (next, diagonal) in coord.neighbors_8() {
            let Some(multiplier) = step_cost(next) else {
                continue;
            };
            let step = if diagonal { DIAGONAL } else { 1.0 };
            let tentative = g + step * multiplier;
            if best_g.get(&next).is_some_and(|&known| tentative >= known) {
                continue;
            }
            best_g.insert(next, tentative);
            came_from.insert(next, coord);
            open.push(Frontier {
                f: tentative + next.euclidean_distance(&goal),
                g: tentative,
                coord: next,
            });
        }
    }

    PathResult::empty(expanded, PathOutcome::Unreachable)
}

fn reconstruct(
    came_from: &HashMap<TileCoord, TileCoord>,
    start: TileCoord,
    goal: TileCoord,
) -> Vec<TileCoord> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
