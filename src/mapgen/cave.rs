//! Cave generator
//!
//! Cellular automaton with regional rule variation: each smoothing pass
//! scatters a handful of rule-seed points, and every cell obeys the rule of
//! its nearest seed. Different neighbor-count thresholds in different areas
//! keep the result organic instead of uniformly smoothed.

use super::region::{ensure_contiguous, RegionMask};
use crate::map::{CellFlags, GridMap};
use crate::rng::MtRng;
use std::cell::RefCell;

/// Neighbor-count threshold variants: wall when more than `.0` wall
/// neighbors, floor when fewer than `.1`, otherwise unchanged.
const CAVE_RULES: [(u32, u32); 9] = [
    (4, 4),
    (5, 4),
    (4, 3),
    (5, 5),
    (6, 4),
    (5, 3),
    (6, 5),
    (4, 5),
    (6, 3),
];

/// Cave generation parameters.
#[derive(Debug, Clone)]
pub struct CaveParams {
    /// Initial wall probability per interior cell.
    pub wall_probability: f64,
    /// Smoothing passes per candidate.
    pub iterations: u32,
    /// Rule-seed points scattered per pass.
    pub rule_seeds: usize,
    /// Minimum reachable-floor fraction of the whole map.
    pub coverage_threshold: f64,
    /// Candidates generated before giving up.
    pub max_generations: u32,
}

impl Default for CaveParams {
    fn default() -> Self {
        Self {
            wall_probability: 0.45,
            iterations: 5,
            rule_seeds: 6,
            coverage_threshold: 0.2,
            max_generations: 100,
        }
    }
}

/// Generate a cave into `map`.
///
/// Candidates are regenerated until the reachable floor region covers at
/// least the threshold fraction; floor pockets outside that region are
/// hardened back to wall on commit. Returns the reachable region, or `None`
/// when no acceptable candidate appeared within the generation cap.
pub fn generate_cave(map: &mut GridMap, rng: &mut MtRng, params: &CaveParams) -> Option<RegionMask> {
    let width = map.width;
    let height = map.height;
    let walls = RefCell::new(vec![true; (width * height) as usize]);

    let mask = ensure_contiguous(
        width,
        height,
        params.coverage_threshold,
        params.max_generations,
        rng,
        |rng| generate_candidate(&mut walls.borrow_mut(), width, height, rng, params),
        |x, y| !walls.borrow()[(y * width + x) as usize],
    )?;

    map.fill(CellFlags::empty());
    for y in 0..height {
        for x in 0..width {
            if mask.contains(x, y) {
                map.set_flag(x, y, CellFlags::WALKABLE);
            }
        }
    }
    Some(mask)
}

fn generate_candidate(
    walls: &mut [bool],
    width: i32,
    height: i32,
    rng: &mut MtRng,
    params: &CaveParams,
) {
    let idx = |x: i32, y: i32| (y * width + x) as usize;

    // Random fill; border stays wall.
    for y in 0..height {
        for x in 0..width {
            let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            walls[idx(x, y)] = border || rng.rnd() < params.wall_probability;
        }
    }

    let mut scratch = walls.to_vec();
    let mut seeds: Vec<(i32, i32, usize)> = Vec::with_capacity(params.rule_seeds);

    for _ in 0..params.iterations {
        // Fresh rule regions each pass.
        seeds.clear();
        for _ in 0..params.rule_seeds {
            seeds.push((
                rng.int_range(0, width),
                rng.int_range(0, height),
                rng.int_range(0, CAVE_RULES.len() as i32) as usize,
            ));
        }

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let (wall_over, floor_under) = CAVE_RULES[nearest_rule(&seeds, x, y)];
                let neighbors = count_wall_neighbors(walls, width, height, x, y);
                scratch[idx(x, y)] = if neighbors > wall_over {
                    true
                } else if neighbors < floor_under {
                    false
                } else {
                    walls[idx(x, y)]
                };
            }
        }
        walls.copy_from_slice(&scratch);
    }
}

/// Rule of the nearest seed point; earlier seeds win ties.
fn nearest_rule(seeds: &[(i32, i32, usize)], x: i32, y: i32) -> usize {
    let mut best = 0;
    let mut best_dist = i64::MAX;
    for &(sx, sy, rule) in seeds {
        let dx = (sx - x) as i64;
        let dy = (sy - y) as i64;
        let dist = dx * dx + dy * dy;
        if dist < best_dist {
            best_dist = dist;
            best = rule;
        }
    }
    best
}

/// 8-directional wall count; out-of-bounds counts as wall.
fn count_wall_neighbors(walls: &[bool], width: i32, height: i32, x: i32, y: i32) -> u32 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || nx >= width || ny < 0 || ny >= height || walls[(ny * width + nx) as usize]
            {
                count += 1;
            }
        }
    }
    count
}
