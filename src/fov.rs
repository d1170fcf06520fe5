//! Field of view
//!
//! Spiral-path angle-interval sweep. Visibility spreads outward from the
//! viewer cell by cell; every cell carries the interval of view angles over
//! which it is lit, clipped against blockers, and hands the surviving
//! interval to its outward neighbors.
//!
//! Angles are radians from `atan2(dy, dx)`, normalized to [0, 2pi). The one
//! exception is the positive-x axis, where cell spans straddle the 0/2pi
//! seam and are kept as signed values around zero (the anomaly line).
//!
//! All per-offset geometry (the angular span of each cell and the far-corner
//! angles that split it between children) depends only on the offset from
//! the viewer, so it is computed once per [`Fov`] context and reused by
//! every sweep.

use crate::geometry::Vec2;
use crate::map::GridMap;
use std::collections::VecDeque;
use std::f64::consts::PI;
use thiserror::Error;

const TWO_PI: f64 = 2.0 * PI;

/// Largest view radius supported by a default-built context.
pub const DEFAULT_MAX_RADIUS: i32 = 300;

/// Errors raised by a field-of-view sweep.
#[derive(Debug, Error)]
pub enum FovError {
    /// Requested radius exceeds the precomputed table bound. A caller bug;
    /// the radius is never clamped.
    #[error("fov radius {radius} exceeds table bound {max}")]
    RadiusExceedsTable { radius: i32, max: i32 },

    /// A lit interval and a routing span landed in a geometric configuration
    /// outside the handled overlap cases. Indicates a logic bug, not a
    /// runtime condition.
    #[error(
        "unhandled lit-interval overlap: lit [{lit_min}, {lit_max}] vs span [{span_lo}, {span_hi}]"
    )]
    IntervalMismatch {
        lit_min: f64,
        lit_max: f64,
        span_lo: f64,
        span_hi: f64,
    },
}

/// Field-of-view context: precomputed angle tables plus reusable sweep
/// scratch. One sweep at a time per context; create separate contexts for
/// independent viewers running concurrently.
pub struct Fov {
    max_radius: i32,
    side: i32,
    // Geometry, fixed after construction.
    min_angle: Vec<f64>,
    max_angle: Vec<f64>,
    outer_angle: Vec<f64>,
    outer_angle2: Vec<f64>,
    // Working state. Both entries zero means "unlit"; every entry is back to
    // zero by the end of a sweep.
    min_lit: Vec<f64>,
    max_lit: Vec<f64>,
    queue: VecDeque<(i32, i32)>,
}

impl Default for Fov {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RADIUS)
    }
}

impl Fov {
    /// Build a context supporting radii up to `max_radius`.
    pub fn new(max_radius: i32) -> Self {
        assert!(max_radius >= 1, "max_radius must be at least 1");
        let side = 2 * max_radius + 1;
        let len = (side * side) as usize;
        let mut fov = Self {
            max_radius,
            side,
            min_angle: vec![0.0; len],
            max_angle: vec![0.0; len],
            outer_angle: vec![0.0; len],
            outer_angle2: vec![0.0; len],
            min_lit: vec![0.0; len],
            max_lit: vec![0.0; len],
            queue: VecDeque::new(),
        };
        fov.build_tables();
        fov
    }

    pub fn max_radius(&self) -> i32 {
        self.max_radius
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        ((y + self.max_radius) * self.side + (x + self.max_radius)) as usize
    }

    /// Angle of a corner point as seen from the viewer, normalized into the
    /// domain of the cell that owns it.
    fn corner_angle(cell_x: i32, cell_y: i32, cx: f64, cy: f64) -> f64 {
        let a = cy.atan2(cx);
        if cell_y < 0 {
            // Below the axis rows: (pi, 2pi).
            a + TWO_PI
        } else if cell_y == 0 && cell_x > 0 {
            // Anomaly line: keep signed values around zero.
            a
        } else if a < 0.0 {
            a + TWO_PI
        } else {
            a
        }
    }

    fn build_tables(&mut self) {
        let r = self.max_radius;
        for y in -r..=r {
            for x in -r..=r {
                if x == 0 && y == 0 {
                    continue;
                }
                let i = self.index(x, y);
                let corners = [
                    (x as f64 - 0.5, y as f64 - 0.5),
                    (x as f64 + 0.5, y as f64 - 0.5),
                    (x as f64 - 0.5, y as f64 + 0.5),
                    (x as f64 + 0.5, y as f64 + 0.5),
                ];
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for &(cx, cy) in &corners {
                    let a = Self::corner_angle(x, y, cx, cy);
                    min = min.min(a);
                    max = max.max(a);
                }
                self.min_angle[i] = min;
                self.max_angle[i] = max;

                if x != 0 && y != 0 {
                    // One far corner; both split angles coincide.
                    let fx = x as f64 + 0.5 * x.signum() as f64;
                    let fy = y as f64 + 0.5 * y.signum() as f64;
                    let o = Self::corner_angle(x, y, fx, fy);
                    self.outer_angle[i] = o;
                    self.outer_angle2[i] = o;
                } else {
                    // Axis cell: two far corners, perpendicular halves.
                    let (a1, a2) = if y == 0 {
                        let fx = x as f64 + 0.5 * x.signum() as f64;
                        (
                            Self::corner_angle(x, y, fx, -0.5),
                            Self::corner_angle(x, y, fx, 0.5),
                        )
                    } else {
                        let fy = y as f64 + 0.5 * y.signum() as f64;
                        (
                            Self::corner_angle(x, y, -0.5, fy),
                            Self::corner_angle(x, y, 0.5, fy),
                        )
                    };
                    self.outer_angle2[i] = a1.min(a2);
                    self.outer_angle[i] = a1.max(a2);
                }
            }
        }
    }

    /// Orthogonal outward children of an offset, in increasing-angle order.
    /// Quadrant cells have two, axis cells three.
    fn children(x: i32, y: i32) -> [(i32, i32); 3] {
        // The middle slot is only routed for axis cells.
        match (x.signum(), y.signum()) {
            (1, 1) => [(x + 1, y), (x, y), (x, y + 1)],
            (-1, 1) => [(x, y + 1), (x, y), (x - 1, y)],
            (-1, -1) => [(x - 1, y), (x, y), (x, y - 1)],
            (1, -1) => [(x, y - 1), (x, y), (x + 1, y)],
            (1, 0) => [(x, -1), (x + 1, 0), (x, 1)],
            (0, 1) => [(1, y), (0, y + 1), (-1, y)],
            (-1, 0) => [(x, 1), (x - 1, 0), (x, -1)],
            (0, -1) => [(-1, y), (0, y - 1), (1, y)],
            _ => unreachable!("origin has no children"),
        }
    }

    /// Compute visibility from `origin` out to `radius`.
    ///
    /// `blocked` is the opacity predicate in map coordinates; `visit` is
    /// called exactly once for every lit cell, origin included. `arc`
    /// restricts the sweep to `[start, end)` radians (angle 0 points along
    /// +x, angles grow toward +y); `None` sweeps the full circle.
    ///
    /// The result is a pure function of the inputs: identical origin,
    /// radius, arc and blocker answers always produce the identical lit set.
    pub fn compute<B, V>(
        &mut self,
        origin: Vec2,
        radius: i32,
        arc: Option<(f64, f64)>,
        blocked: B,
        visit: V,
    ) -> Result<(), FovError>
    where
        B: FnMut(i32, i32) -> bool,
        V: FnMut(i32, i32),
    {
        if radius > self.max_radius {
            return Err(FovError::RadiusExceedsTable {
                radius,
                max: self.max_radius,
            });
        }

        let result = self.sweep(origin, radius, arc, blocked, visit);
        if result.is_err() {
            // Restore the unlit invariant before handing the error up.
            while let Some((x, y)) = self.queue.pop_front() {
                let i = self.index(x, y);
                self.min_lit[i] = 0.0;
                self.max_lit[i] = 0.0;
            }
        }
        result
    }

    fn sweep<B, V>(
        &mut self,
        origin: Vec2,
        radius: i32,
        arc: Option<(f64, f64)>,
        mut blocked: B,
        mut visit: V,
    ) -> Result<(), FovError>
    where
        B: FnMut(i32, i32) -> bool,
        V: FnMut(i32, i32),
    {
        visit(origin.x, origin.y);
        if radius <= 1 {
            // No other cell satisfies the strict distance bound.
            return Ok(());
        }

        // Seed the four orthogonal neighbors with their full spans.
        for &(sx, sy) in &[(1, 0), (0, 1), (-1, 0), (0, -1)] {
            let i = self.index(sx, sy);
            self.mark(sx, sy, self.min_angle[i], self.max_angle[i]);
        }

        let radius_sq = i64::from(radius) * i64::from(radius);

        while let Some((x, y)) = self.queue.pop_front() {
            let i = self.index(x, y);
            let lit_min = self.min_lit[i];
            let lit_max = self.max_lit[i];
            self.min_lit[i] = 0.0;
            self.max_lit[i] = 0.0;

            if let Some((start, end)) = arc {
                if !self.span_in_arc(i, start, end) {
                    continue;
                }
            }

            // Strict bound: cells exactly at the radius are dark.
            let dist_sq = i64::from(x) * i64::from(x) + i64::from(y) * i64::from(y);
            if dist_sq >= radius_sq {
                continue;
            }

            let wx = origin.x + x;
            let wy = origin.y + y;
            visit(wx, wy);

            if blocked(wx, wy) {
                // Light stops here, except the corner ray: when the lit
                // interval starts exactly at this cell's own min corner the
                // grazing ray slides past into the low child, which keeps
                // room corners from going dark.
                if lit_min == self.min_angle[i] {
                    let lo = Self::children(x, y)[0];
                    self.mark(lo.0, lo.1, lit_min, lit_min);
                }
            } else {
                self.propagate(x, y, lit_min, lit_max)?;
            }
        }

        Ok(())
    }

    /// Route a transparent cell's lit interval to its children through the
    /// far-corner split angles.
    fn propagate(&mut self, x: i32, y: i32, lit_min: f64, lit_max: f64) -> Result<(), FovError> {
        let i = self.index(x, y);
        let m = self.min_angle[i];
        let big = self.max_angle[i];
        let o2 = self.outer_angle2[i];
        let o = self.outer_angle[i];
        let children = Self::children(x, y);
        let axis = x == 0 || y == 0;

        if let Some((lo, hi)) = Self::test_mark(lit_min, lit_max, m, o2)? {
            self.mark(children[0].0, children[0].1, lo, hi);
        }
        if axis {
            if let Some((lo, hi)) = Self::test_mark(lit_min, lit_max, o2, o)? {
                self.mark(children[1].0, children[1].1, lo, hi);
            }
        }
        if let Some((lo, hi)) = Self::test_mark(lit_min, lit_max, o, big)? {
            self.mark(children[2].0, children[2].1, lo, hi);
        }
        Ok(())
    }

    /// Intersect a lit interval with a child routing span.
    ///
    /// Six cases: a routing span straddling the anomaly line passes the lit
    /// interval through untouched; disjoint intervals contribute nothing;
    /// containment either way; and the two one-sided partial overlaps. Any
    /// other configuration is an internal invariant violation.
    fn test_mark(
        lit_min: f64,
        lit_max: f64,
        span_lo: f64,
        span_hi: f64,
    ) -> Result<Option<(f64, f64)>, FovError> {
        if span_lo < 0.0 && span_hi > 0.0 {
            Ok(Some((lit_min, lit_max)))
        } else if lit_max < span_lo || lit_min > span_hi {
            Ok(None)
        } else if lit_min <= span_lo && lit_max >= span_hi {
            Ok(Some((span_lo, span_hi)))
        } else if lit_min >= span_lo && lit_max <= span_hi {
            Ok(Some((lit_min, lit_max)))
        } else if lit_min <= span_lo && lit_max <= span_hi {
            Ok(Some((span_lo, lit_max)))
        } else if lit_min >= span_lo && lit_max >= span_hi {
            Ok(Some((lit_min, span_hi)))
        } else {
            Err(FovError::IntervalMismatch {
                lit_min,
                lit_max,
                span_lo,
                span_hi,
            })
        }
    }

    /// Union an interval into a child's lit entry, enqueueing the child on
    /// its first light contribution.
    fn mark(&mut self, x: i32, y: i32, mut lo: f64, mut hi: f64) {
        // Intervals handed down across the positive-x axis arrive in signed
        // form; shift them into the (pi, 2pi) domain of below-axis cells.
        if hi < 0.0 && y != 0 {
            lo += TWO_PI;
            hi += TWO_PI;
        }
        let i = self.index(x, y);
        if self.min_lit[i] == 0.0 && self.max_lit[i] == 0.0 {
            self.min_lit[i] = lo;
            self.max_lit[i] = hi;
            self.queue.push_back((x, y));
        } else {
            self.min_lit[i] = self.min_lit[i].min(lo);
            self.max_lit[i] = self.max_lit[i].max(hi);
        }
    }

    /// True if the cell's geometric span overlaps the half-open arc
    /// `[start, end)`. Two branches: an arc wrapping through the 0/2pi seam
    /// and one that does not; anomaly-line cells test both of their halves.
    fn span_in_arc(&self, i: usize, start: f64, end: f64) -> bool {
        let m = self.min_angle[i];
        let big = self.max_angle[i];
        if m < 0.0 {
            seg_in_arc(m + TWO_PI, TWO_PI, start, end) || seg_in_arc(0.0, big, start, end)
        } else {
            seg_in_arc(m, big, start, end)
        }
    }
}

fn seg_in_arc(lo: f64, hi: f64, start: f64, end: f64) -> bool {
    if start <= end {
        lo < end && hi > start
    } else {
        // Arc wraps through the seam.
        hi > start || lo < end
    }
}

/// Recompute visibility on a map: clears VISIBLE everywhere, then marks every
/// cell lit from `origin` (non-walkable cells block light). Returns the lit
/// positions.
pub fn update_visibility(
    fov: &mut Fov,
    map: &mut GridMap,
    origin: Vec2,
    radius: i32,
) -> Result<Vec<Vec2>, FovError> {
    map.clear_visibility();
    let mut lit = Vec::new();
    fov.compute(
        origin,
        radius,
        None,
        |x, y| !map.is_walkable(x, y),
        |x, y| lit.push(Vec2::new(x, y)),
    )?;
    for pos in &lit {
        map.set_visible(pos.x, pos.y);
    }
    Ok(lit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn collect(
        fov: &mut Fov,
        origin: Vec2,
        radius: i32,
        arc: Option<(f64, f64)>,
        walls: &HashSet<(i32, i32)>,
    ) -> HashSet<(i32, i32)> {
        let mut lit = HashSet::new();
        fov.compute(
            origin,
            radius,
            arc,
            |x, y| walls.contains(&(x, y)),
            |x, y| {
                lit.insert((x, y));
            },
        )
        .unwrap();
        lit
    }

    #[test]
    fn test_origin_always_visible() {
        let mut fov = Fov::new(8);
        let mut walls = HashSet::new();
        // Even a fully walled-in viewer sees its own cell.
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx != 0 || dy != 0 {
                    walls.insert((dx, dy));
                }
            }
        }
        let lit = collect(&mut fov, Vec2::ZERO, 8, None, &walls);
        assert!(lit.contains(&(0, 0)));
    }

    #[test]
    fn test_empty_map_is_strict_disc() {
        let mut fov = Fov::new(16);
        let radius = 7;
        let lit = collect(&mut fov, Vec2::ZERO, radius, None, &HashSet::new());
        for y in -10..=10 {
            for x in -10..=10 {
                let inside = x * x + y * y < radius * radius;
                assert_eq!(
                    lit.contains(&(x, y)),
                    inside,
                    "cell ({x},{y}) lit={} inside={}",
                    lit.contains(&(x, y)),
                    inside
                );
            }
        }
    }

    #[test]
    fn test_rotational_symmetry() {
        let mut fov = Fov::new(16);
        // A wall layout symmetric under 90-degree rotation.
        let mut walls = HashSet::new();
        for &(x, y) in &[(3, 1), (-1, 3), (-3, -1), (1, -3)] {
            walls.insert((x, y));
        }
        let lit = collect(&mut fov, Vec2::ZERO, 9, None, &walls);
        for &(x, y) in &lit {
            assert!(lit.contains(&(-y, x)), "({x},{y}) lit but rotation is not");
        }
    }

    #[test]
    fn test_wall_casts_shadow() {
        let mut fov = Fov::new(16);
        let mut walls = HashSet::new();
        walls.insert((0, 2));
        let lit = collect(&mut fov, Vec2::ZERO, 10, None, &walls);
        // The wall itself is lit, the cells behind it along the ray are not.
        assert!(lit.contains(&(0, 2)));
        assert!(!lit.contains(&(0, 3)));
        assert!(!lit.contains(&(0, 4)));
        assert!(!lit.contains(&(0, 8)));
        // Off-ray cells at the same range stay lit.
        assert!(lit.contains(&(3, 3)));
        assert!(lit.contains(&(-3, 3)));
    }

    #[test]
    fn test_shadow_in_each_cardinal_direction() {
        let mut fov = Fov::new(16);
        for &(wx, wy) in &[(2, 0), (-2, 0), (0, 2), (0, -2)] {
            let mut walls = HashSet::new();
            walls.insert((wx, wy));
            let lit = collect(&mut fov, Vec2::ZERO, 9, None, &walls);
            assert!(lit.contains(&(wx, wy)));
            assert!(
                !lit.contains(&(wx * 2, wy * 2)),
                "cell behind wall at ({wx},{wy}) should be dark"
            );
        }
    }

    #[test]
    fn test_arc_restricts_to_half_plane() {
        let mut fov = Fov::new(16);
        let lit = collect(&mut fov, Vec2::new(20, 20), 8, Some((0.0, PI)), &HashSet::new());
        for &(x, y) in &lit {
            assert!(
                y >= 20 || (x, y) == (20, 20),
                "cell ({x},{y}) above the viewer leaked into the [0, pi) arc"
            );
        }
        // The lower half-plane is actually covered.
        assert!(lit.contains(&(20, 24)));
        assert!(lit.contains(&(23, 23)));
    }

    #[test]
    fn test_wrapping_arc() {
        let mut fov = Fov::new(16);
        // Arc through the seam: three-quarter circle missing the +y wedge.
        let lit = collect(
            &mut fov,
            Vec2::ZERO,
            8,
            Some((3.0 * PI / 4.0, PI / 4.0)),
            &HashSet::new(),
        );
        assert!(lit.contains(&(5, 0)));
        assert!(lit.contains(&(-5, 0)));
        assert!(lit.contains(&(0, -5)));
        assert!(!lit.contains(&(0, 5)));
    }

    #[test]
    fn test_radius_above_bound_is_rejected() {
        let mut fov = Fov::new(10);
        let err = fov
            .compute(Vec2::ZERO, 11, None, |_, _| false, |_, _| {})
            .unwrap_err();
        assert!(matches!(err, FovError::RadiusExceedsTable { radius: 11, max: 10 }));
    }

    #[test]
    fn test_sweep_state_resets_between_calls() {
        let mut fov = Fov::new(12);
        let mut walls = HashSet::new();
        walls.insert((1, 1));
        walls.insert((-2, 3));
        let first = collect(&mut fov, Vec2::ZERO, 9, None, &walls);
        let second = collect(&mut fov, Vec2::ZERO, 9, None, &walls);
        assert_eq!(first, second);
    }

    #[test]
    fn test_determinism_regardless_of_origin() {
        let mut fov = Fov::new(12);
        let walls: HashSet<(i32, i32)> = [(7, 4), (6, 6), (4, 7)].into_iter().collect();
        // Same relative layout shifted in map space lights the same offsets.
        let a = collect(&mut fov, Vec2::new(5, 5), 8, None, &walls);
        let shifted: HashSet<(i32, i32)> =
            walls.iter().map(|&(x, y)| (x + 10, y + 10)).collect();
        let b = collect(&mut fov, Vec2::new(15, 15), 8, None, &shifted);
        let b_unshifted: HashSet<(i32, i32)> =
            b.into_iter().map(|(x, y)| (x - 10, y - 10)).collect();
        assert_eq!(a, b_unshifted);
    }

    #[test]
    fn test_update_visibility_marks_map() {
        let mut fov = Fov::new(16);
        let mut map = GridMap::new(21, 21);
        map.fill(crate::map::CellFlags::WALKABLE);
        map.clear_flag(10, 13, crate::map::CellFlags::WALKABLE);

        let lit = update_visibility(&mut fov, &mut map, Vec2::new(10, 10), 6).unwrap();
        assert!(!lit.is_empty());
        assert!(map.is_visible(10, 10));
        // The wall is lit; the cell behind it is not but stays in bounds.
        assert!(map.is_visible(10, 13));
        assert!(!map.is_visible(10, 15));
        // Discovery persists across a second sweep elsewhere.
        update_visibility(&mut fov, &mut map, Vec2::new(3, 3), 2).unwrap();
        assert!(!map.is_visible(10, 10));
        assert!(map.is_discovered(10, 10));
    }
}
