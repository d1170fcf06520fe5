//! Island generator
//!
//! Fractal height field by midpoint displacement (diamond-square) over a
//! power-of-two-plus-one lattice covering the map. The lattice center is
//! pinned high and the border pinned low, which pushes candidates toward a
//! single landmass surrounded by water.

use super::region::{ensure_contiguous, RegionMask};
use crate::map::{CellFlags, GridMap};
use crate::rng::MtRng;
use std::cell::RefCell;

/// Island generation parameters.
#[derive(Debug, Clone)]
pub struct IslandParams {
    /// Perturbation amplitude decay per lattice halving.
    pub roughness: f64,
    /// Heights above this are land.
    pub sea_level: f32,
    /// Pinned center height.
    pub peak: f64,
    /// Pinned border height.
    pub base: f64,
    /// Minimum land fraction of the whole map.
    pub coverage_threshold: f64,
    /// Candidates generated before giving up.
    pub max_generations: u32,
}

impl Default for IslandParams {
    fn default() -> Self {
        Self {
            roughness: 0.55,
            sea_level: 0.0,
            peak: 1.0,
            base: -0.6,
            coverage_threshold: 0.2,
            max_generations: 100,
        }
    }
}

/// Generate an island into `map`.
///
/// Accepts only candidates where at least the threshold fraction of the map
/// is land in one connected landmass; everything outside that landmass,
/// above-sea islets included, becomes water. Altitude is committed for every
/// cell for rendering shading. Returns the landmass region, or `None` when
/// no candidate passed within the generation cap.
pub fn generate_island(
    map: &mut GridMap,
    rng: &mut MtRng,
    params: &IslandParams,
) -> Option<RegionMask> {
    let width = map.width;
    let height = map.height;
    let side = lattice_side(width.max(height));
    let heights = RefCell::new(vec![0.0f64; (side * side) as usize]);

    let mask = ensure_contiguous(
        width,
        height,
        params.coverage_threshold,
        params.max_generations,
        rng,
        |rng| displace(&mut heights.borrow_mut(), side, rng, params),
        |x, y| heights.borrow()[(y * side + x) as usize] as f32 > params.sea_level,
    )?;

    let heights = heights.into_inner();
    map.fill(CellFlags::empty());
    for y in 0..height {
        for x in 0..width {
            map.set_altitude(x, y, heights[(y * side + x) as usize] as f32);
            if mask.contains(x, y) {
                map.set_flag(x, y, CellFlags::WALKABLE);
            } else {
                map.set_flag(x, y, CellFlags::WATER);
            }
        }
    }
    Some(mask)
}

/// Smallest `2^n + 1` at least `size`.
fn lattice_side(size: i32) -> i32 {
    let mut side = 2;
    while side + 1 < size {
        side *= 2;
    }
    side + 1
}

/// One full midpoint-displacement pass over the lattice.
fn displace(heights: &mut [f64], side: i32, rng: &mut MtRng, params: &IslandParams) {
    let last = side - 1;
    let center = last / 2;
    let idx = |x: i32, y: i32| (y * side + x) as usize;
    let on_border = |x: i32, y: i32| x == 0 || y == 0 || x == last || y == last;

    heights.fill(0.0);
    for &(x, y) in &[(0, 0), (last, 0), (0, last), (last, last)] {
        heights[idx(x, y)] = params.base;
    }
    heights[idx(center, center)] = params.peak;

    let mut step = last;
    let mut amplitude = 1.0;
    while step > 1 {
        let half = step / 2;

        // Diamond: square centers from their four corners.
        let mut y = half;
        while y < side {
            let mut x = half;
            while x < side {
                if !(x == center && y == center) {
                    let avg = (heights[idx(x - half, y - half)]
                        + heights[idx(x + half, y - half)]
                        + heights[idx(x - half, y + half)]
                        + heights[idx(x + half, y + half)])
                        / 4.0;
                    heights[idx(x, y)] = avg + (rng.rnd() * 2.0 - 1.0) * amplitude;
                }
                x += step;
            }
            y += step;
        }

        // Square: edge midpoints from their in-bounds orthogonal neighbors.
        let mut y = 0;
        while y < side {
            let mut x = (y + half) % step;
            while x < side {
                if on_border(x, y) {
                    heights[idx(x, y)] = params.base;
                } else if !(x == center && y == center) {
                    let mut sum = 0.0;
                    let mut count = 0.0;
                    for (nx, ny) in [(x, y - half), (x + half, y), (x, y + half), (x - half, y)] {
                        if nx >= 0 && nx <= last && ny >= 0 && ny <= last {
                            sum += heights[idx(nx, ny)];
                            count += 1.0;
                        }
                    }
                    heights[idx(x, y)] = sum / count + (rng.rnd() * 2.0 - 1.0) * amplitude;
                }
                x += step;
            }
            y += step;
        }

        amplitude *= params.roughness;
        step = half;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::region::flood_fill;

    #[test]
    fn test_lattice_side() {
        assert_eq!(lattice_side(3), 3);
        assert_eq!(lattice_side(5), 5);
        assert_eq!(lattice_side(6), 9);
        assert_eq!(lattice_side(50), 65);
        assert_eq!(lattice_side(65), 65);
        assert_eq!(lattice_side(66), 129);
    }

    #[test]
    fn test_island_meets_coverage_threshold() {
        let mut map = GridMap::new(48, 48);
        let mut rng = MtRng::new(31);
        let mask = generate_island(&mut map, &mut rng, &IslandParams::default()).unwrap();
        assert!(mask.coverage() >= 0.2);
    }

    #[test]
    fn test_island_land_is_one_landmass() {
        let mut map = GridMap::new(40, 40);
        let mut rng = MtRng::new(77);
        generate_island(&mut map, &mut rng, &IslandParams::default()).unwrap();

        let land = map.walkable_cells();
        let mut reached = 0usize;
        flood_fill(
            map.width,
            map.height,
            land[0].x,
            land[0].y,
            |x, y| map.is_walkable(x, y),
            |_, _| reached += 1,
        );
        assert_eq!(reached, land.len());
    }

    #[test]
    fn test_island_non_land_is_water() {
        let mut map = GridMap::new(40, 40);
        let mut rng = MtRng::new(5);
        generate_island(&mut map, &mut rng, &IslandParams::default()).unwrap();
        for y in 0..map.height {
            for x in 0..map.width {
                assert_ne!(
                    map.is_walkable(x, y),
                    map.is_water(x, y),
                    "every cell is exactly land or water"
                );
            }
        }
    }

    #[test]
    fn test_island_altitude_written() {
        let mut map = GridMap::new(33, 33);
        let mut rng = MtRng::new(9);
        generate_island(&mut map, &mut rng, &IslandParams::default()).unwrap();
        // Land sits above sea level, and at least some water below it.
        for pos in map.walkable_cells() {
            assert!(map.altitude(pos.x, pos.y) > 0.0);
        }
        let any_below = (0..map.height)
            .flat_map(|y| (0..map.width).map(move |x| (x, y)))
            .any(|(x, y)| map.altitude(x, y) < 0.0);
        assert!(any_below);
    }
}
