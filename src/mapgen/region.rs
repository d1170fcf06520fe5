//! Region extraction and flood fill
//!
//! Shared by the terrain generators to reject candidates whose largest
//! reachable region is too small.

use crate::rng::MtRng;

/// Boolean reachability mask over a grid, plus its population count.
#[derive(Debug, Clone)]
pub struct RegionMask {
    pub width: i32,
    pub height: i32,
    pub cells: Vec<bool>,
    pub count: usize,
}

impl RegionMask {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; (width * height) as usize],
            count: 0,
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0
            && x < self.width
            && y >= 0
            && y < self.height
            && self.cells[(y * self.width + x) as usize]
    }

    /// Fraction of the whole grid this region covers.
    pub fn coverage(&self) -> f64 {
        self.count as f64 / (self.width as f64 * self.height as f64)
    }
}

/// Scanline flood fill of the 4-connected region of matching cells around
/// `start`.
///
/// Iterative with an explicit seed stack, so fill depth is not bound by the
/// call stack. Each popped seed is grown into a full horizontal run, the run
/// is visited as a whole, and at most one new seed is pushed per contiguous
/// matching run on the rows above and below (tracked with in-segment flags),
/// rather than one per cell.
///
/// Every matching connected cell is visited exactly once. The visited set
/// depends only on the region, not on which member cell seeds the fill.
pub fn flood_fill<M, V>(width: i32, height: i32, start_x: i32, start_y: i32, is_match: M, mut visit: V)
where
    M: Fn(i32, i32) -> bool,
    V: FnMut(i32, i32),
{
    if start_x < 0 || start_x >= width || start_y < 0 || start_y >= height {
        return;
    }
    if !is_match(start_x, start_y) {
        return;
    }

    let mut filled = vec![false; (width * height) as usize];
    let idx = |x: i32, y: i32| (y * width + x) as usize;
    let mut stack = vec![(start_x, start_y)];

    while let Some((seed_x, y)) = stack.pop() {
        if filled[idx(seed_x, y)] {
            continue;
        }

        // Grow the seed into its full run.
        let mut left = seed_x;
        while left > 0 && is_match(left - 1, y) && !filled[idx(left - 1, y)] {
            left -= 1;
        }
        let mut right = seed_x;
        while right + 1 < width && is_match(right + 1, y) && !filled[idx(right + 1, y)] {
            right += 1;
        }

        let mut in_north_segment = false;
        let mut in_south_segment = false;
        for x in left..=right {
            filled[idx(x, y)] = true;
            visit(x, y);

            // One seed per contiguous run in each adjacent row.
            let north_match = y > 0 && is_match(x, y - 1) && !filled[idx(x, y - 1)];
            if north_match && !in_north_segment {
                stack.push((x, y - 1));
            }
            in_north_segment = north_match;

            let south_match = y + 1 < height && is_match(x, y + 1) && !filled[idx(x, y + 1)];
            if south_match && !in_south_segment {
                stack.push((x, y + 1));
            }
            in_south_segment = south_match;
        }
    }
}

/// Sampling attempts per candidate before giving up on it.
const SAMPLE_ATTEMPTS: usize = 100;

/// Repeatedly invoke `generate` until a candidate has a reachable matching
/// region covering at least `threshold` of the whole grid.
///
/// After each generation pass the region is probed by flood filling from up
/// to 100 randomly sampled matching cells; a small disconnected pocket can
/// be sampled, so several probes of the same candidate are allowed before it
/// is regenerated. Gives up after `max_generations` candidates and returns
/// `None` rather than looping forever.
pub fn ensure_contiguous<G, M>(
    width: i32,
    height: i32,
    threshold: f64,
    max_generations: u32,
    rng: &mut MtRng,
    mut generate: G,
    is_match: M,
) -> Option<RegionMask>
where
    G: FnMut(&mut MtRng),
    M: Fn(i32, i32) -> bool,
{
    for generation in 0..max_generations {
        generate(rng);

        for _ in 0..SAMPLE_ATTEMPTS {
            let x = rng.int_range(0, width);
            let y = rng.int_range(0, height);
            if !is_match(x, y) {
                continue;
            }

            let mut mask = RegionMask::new(width, height);
            flood_fill(width, height, x, y, &is_match, |fx, fy| {
                mask.cells[(fy * width + fx) as usize] = true;
                mask.count += 1;
            });

            if mask.coverage() >= threshold {
                log::debug!(
                    "accepted candidate {} with coverage {:.3}",
                    generation,
                    mask.coverage()
                );
                return Some(mask);
            }
        }
        log::debug!("candidate {} rejected, regenerating", generation);
    }

    log::warn!(
        "no candidate reached coverage {:.2} within {} generations",
        threshold,
        max_generations
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fill_set(grid: &[&str], sx: i32, sy: i32) -> HashSet<(i32, i32)> {
        let height = grid.len() as i32;
        let width = grid[0].len() as i32;
        let mut out = HashSet::new();
        flood_fill(
            width,
            height,
            sx,
            sy,
            |x, y| grid[y as usize].as_bytes()[x as usize] == b'.',
            |x, y| {
                out.insert((x, y));
            },
        );
        out
    }

    const U_SHAPE: &[&str] = &[
        "..#..",
        "..#..",
        "..#..",
        ".....",
        "#####",
    ];

    #[test]
    fn test_flood_fill_region_membership() {
        let region = fill_set(U_SHAPE, 0, 0);
        // Both arms connect through the bottom row.
        assert!(region.contains(&(4, 0)));
        assert!(region.contains(&(0, 3)));
        assert_eq!(region.len(), 17);
    }

    #[test]
    fn test_flood_fill_seed_independent() {
        let from_corner = fill_set(U_SHAPE, 0, 0);
        let from_other_arm = fill_set(U_SHAPE, 4, 2);
        let from_bottom = fill_set(U_SHAPE, 2, 3);
        assert_eq!(from_corner, from_other_arm);
        assert_eq!(from_corner, from_bottom);
    }

    #[test]
    fn test_flood_fill_visits_each_cell_once() {
        let grid: &[&str] = &["....", "....", "...."];
        let mut visits = Vec::new();
        flood_fill(
            4,
            3,
            1,
            1,
            |x, y| grid[y as usize].as_bytes()[x as usize] == b'.',
            |x, y| visits.push((x, y)),
        );
        let unique: HashSet<_> = visits.iter().copied().collect();
        assert_eq!(visits.len(), unique.len());
        assert_eq!(visits.len(), 12);
    }

    #[test]
    fn test_flood_fill_does_not_cross_diagonals() {
        let grid: &[&str] = &[
            ".#..",
            "#...",
            "....",
        ];
        let region = fill_set(grid, 0, 0);
        // (0,0) touches the rest only diagonally.
        assert_eq!(region, HashSet::from([(0, 0)]));
    }

    #[test]
    fn test_flood_fill_non_matching_seed() {
        let region = fill_set(U_SHAPE, 2, 0);
        assert!(region.is_empty());
    }

    #[test]
    fn test_ensure_contiguous_accepts_open_grid() {
        let mut rng = MtRng::new(11);
        let open = vec![true; 20 * 20];
        let mask = ensure_contiguous(
            20,
            20,
            0.5,
            10,
            &mut rng,
            |_| {},
            |x, y| open[(y * 20 + x) as usize],
        )
        .unwrap();
        assert_eq!(mask.count, 400);
        assert!((mask.coverage() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ensure_contiguous_gives_up() {
        let mut rng = MtRng::new(12);
        // Nothing ever matches; the attempt cap must end the loop.
        let result = ensure_contiguous(10, 10, 0.2, 5, &mut rng, |_| {}, |_, _| false);
        assert!(result.is_none());
    }
}
