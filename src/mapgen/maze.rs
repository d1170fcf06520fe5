//! Maze generator
//!
//! Randomized frontier growth, a modified Prim's algorithm over cells. Open
//! cells grow outward from one random start; each step picks a frontier
//! candidate with a bias controlled by `branch_rate` and either carves it or
//! hardens it to wall for good. Connectivity and the absence of loops hold
//! by construction, so no post-verification pass is needed.

use crate::map::{CellFlags, GridMap};
use crate::rng::MtRng;

const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// Maze generation parameters.
#[derive(Debug, Clone)]
pub struct MazeParams {
    /// Reshapes frontier selection: `pow(u, exp(-branch_rate))` over the
    /// candidate list. Positive values favor recently added candidates
    /// (long winding corridors), negative values favor old ones (dense
    /// branching), zero is uniform.
    pub branch_rate: f64,
}

impl Default for MazeParams {
    fn default() -> Self {
        Self { branch_rate: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Undecided,
    Frontier,
    Open,
    Wall,
}

/// Generate a perfect maze into `map`: every pair of open cells is connected
/// by exactly one path.
///
/// The map must be at least 3x3 so the border wall leaves interior room to
/// carve; smaller maps are a caller contract violation and panic.
pub fn generate_maze(map: &mut GridMap, rng: &mut MtRng, params: &MazeParams) {
    let width = map.width;
    let height = map.height;
    assert!(
        width >= 3 && height >= 3,
        "maze map dimensions out of range: need at least 3x3, got {width}x{height}"
    );
    let idx = |x: i32, y: i32| (y * width + x) as usize;

    let mut state = vec![CellState::Undecided; (width * height) as usize];
    // The outer border is wall from the start.
    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                state[idx(x, y)] = CellState::Wall;
            }
        }
    }

    let start_x = rng.int_range(1, width - 1);
    let start_y = rng.int_range(1, height - 1);
    state[idx(start_x, start_y)] = CellState::Open;

    let mut frontier: Vec<(i32, i32)> = Vec::new();
    push_frontier(&mut state, &mut frontier, width, start_x, start_y);

    let exponent = (-params.branch_rate).exp();
    while !frontier.is_empty() {
        let pick = (rng.rnd().powf(exponent) * frontier.len() as f64) as usize;
        let (x, y) = frontier.remove(pick.min(frontier.len() - 1));

        if can_carve(&state, width, x, y) {
            state[idx(x, y)] = CellState::Open;
            push_frontier(&mut state, &mut frontier, width, x, y);
        } else {
            state[idx(x, y)] = CellState::Wall;
        }
    }

    map.fill(CellFlags::empty());
    for y in 0..height {
        for x in 0..width {
            if state[idx(x, y)] == CellState::Open {
                map.set_flag(x, y, CellFlags::WALKABLE);
            }
        }
    }
}

/// Move undecided orthogonal neighbors of a freshly carved cell onto the
/// frontier list.
fn push_frontier(
    state: &mut [CellState],
    frontier: &mut Vec<(i32, i32)>,
    width: i32,
    x: i32,
    y: i32,
) {
    for (dx, dy) in ORTHOGONAL {
        let nx = x + dx;
        let ny = y + dy;
        let i = (ny * width + nx) as usize;
        if state[i] == CellState::Undecided {
            state[i] = CellState::Frontier;
            frontier.push((nx, ny));
        }
    }
}

/// A frontier cell may be carved when it keeps the open graph a tree:
/// exactly one open orthogonal neighbor (its parent), and none of the four
/// diagonal configurations where an open diagonal neighbor shares no open
/// orthogonal with this cell, which would make corridors touch corner to
/// corner.
fn can_carve(state: &[CellState], width: i32, x: i32, y: i32) -> bool {
    let open = |cx: i32, cy: i32| state[(cy * width + cx) as usize] == CellState::Open;

    let open_orthogonals = ORTHOGONAL
        .iter()
        .filter(|(dx, dy)| open(x + dx, y + dy))
        .count();
    if open_orthogonals != 1 {
        return false;
    }

    for (dx, dy) in DIAGONAL {
        if open(x + dx, y + dy) && !open(x + dx, y) && !open(x, y + dy) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::region::flood_fill;

    fn tree_stats(map: &GridMap) -> (usize, usize, usize) {
        let nodes = map.walkable_cells();
        // Count each walkable-adjacent pair once (east/south edges).
        let mut edges = 0;
        for pos in &nodes {
            if map.is_walkable(pos.x + 1, pos.y) {
                edges += 1;
            }
            if map.is_walkable(pos.x, pos.y + 1) {
                edges += 1;
            }
        }
        let mut reached = 0;
        if let Some(seed) = nodes.first() {
            flood_fill(
                map.width,
                map.height,
                seed.x,
                seed.y,
                |x, y| map.is_walkable(x, y),
                |_, _| reached += 1,
            );
        }
        (nodes.len(), edges, reached)
    }

    #[test]
    fn test_maze_is_a_tree() {
        for seed in [3u32, 77, 20_000] {
            let mut map = GridMap::new(41, 31);
            let mut rng = MtRng::new(seed);
            generate_maze(&mut map, &mut rng, &MazeParams::default());

            let (nodes, edges, reached) = tree_stats(&map);
            assert!(nodes > 0);
            assert_eq!(reached, nodes, "maze must be one connected component");
            assert_eq!(edges, nodes - 1, "maze must contain no loops");
        }
    }

    #[test]
    fn test_maze_has_no_diagonal_touching() {
        let mut map = GridMap::new(33, 33);
        let mut rng = MtRng::new(5);
        generate_maze(&mut map, &mut rng, &MazeParams::default());

        for y in 1..map.height - 1 {
            for x in 1..map.width - 1 {
                if !map.is_walkable(x, y) {
                    continue;
                }
                for (dx, dy) in DIAGONAL {
                    if map.is_walkable(x + dx, y + dy) {
                        assert!(
                            map.is_walkable(x + dx, y) || map.is_walkable(x, y + dy),
                            "open diagonal without shared orthogonal at ({x},{y})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_maze_branch_rate_still_a_tree() {
        for branch_rate in [-2.0, 2.0] {
            let mut map = GridMap::new(25, 25);
            let mut rng = MtRng::new(8);
            generate_maze(&mut map, &mut rng, &MazeParams { branch_rate });
            let (nodes, edges, reached) = tree_stats(&map);
            assert_eq!(reached, nodes);
            assert_eq!(edges, nodes - 1);
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_maze_rejects_degenerate_width() {
        let mut map = GridMap::new(2, 10);
        let mut rng = MtRng::new(1);
        generate_maze(&mut map, &mut rng, &MazeParams::default());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_maze_rejects_degenerate_height() {
        let mut map = GridMap::new(10, 1);
        let mut rng = MtRng::new(1);
        generate_maze(&mut map, &mut rng, &MazeParams::default());
    }

    #[test]
    fn test_maze_minimum_size_keeps_border_wall() {
        // 3x3 leaves exactly one interior cell; it opens, the ring does not.
        let mut map = GridMap::new(3, 3);
        let mut rng = MtRng::new(21);
        generate_maze(&mut map, &mut rng, &MazeParams::default());
        assert!(map.is_walkable(1, 1));
        for y in 0..3 {
            for x in 0..3 {
                if x != 1 || y != 1 {
                    assert!(!map.is_walkable(x, y), "border carved at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn test_maze_border_is_wall() {
        let mut map = GridMap::new(21, 17);
        let mut rng = MtRng::new(13);
        generate_maze(&mut map, &mut rng, &MazeParams::default());
        for x in 0..map.width {
            assert!(!map.is_walkable(x, 0));
            assert!(!map.is_walkable(x, map.height - 1));
        }
        for y in 0..map.height {
            assert!(!map.is_walkable(0, y));
            assert!(!map.is_walkable(map.width - 1, y));
        }
    }
}
