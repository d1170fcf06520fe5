//! Map data structure
//!
//! The 2D grid representing one level: per-cell flag bits plus an altitude
//! used by the island and cave generators for shading.
//!
//! Out-of-bounds reads answer "unset"/zero and out-of-bounds writes are
//! silently ignored. That asymmetry is the deliberate boundary contract with
//! FOV, pathfinding and rendering: callers never need bounds checks of their
//! own.

use crate::geometry::Vec2;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-cell flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CellFlags: u8 {
        /// Terrain entities can traverse and FOV light propagates through.
        const WALKABLE = 1 << 0;
        /// Currently in the viewer's field of view.
        const VISIBLE = 1 << 1;
        /// Has ever been visible; fog-of-war memory.
        const DISCOVERED = 1 << 2;
        /// Water terrain. Affects rendering, not walkability.
        const WATER = 1 << 3;
    }
}

/// A single map cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cell {
    pub flags: CellFlags,
    pub altitude: f32,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            flags: CellFlags::empty(),
            altitude: 0.0,
        }
    }
}

/// A fixed-size rectangular grid of cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl GridMap {
    /// Create a map with all flags unset and zero altitude.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "map dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
        }
    }

    /// Convert 2D coordinates to a flat index. Caller must be in bounds.
    #[inline]
    pub fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Convert a flat index back to 2D coordinates.
    #[inline]
    pub fn coords(&self, idx: usize) -> Vec2 {
        let idx = idx as i32;
        Vec2::new(idx % self.width, idx / self.width)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Total cell count.
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Flags at a position; empty when out of bounds.
    pub fn flags(&self, x: i32, y: i32) -> CellFlags {
        if self.in_bounds(x, y) {
            self.cells[self.idx(x, y)].flags
        } else {
            CellFlags::empty()
        }
    }

    /// Set flag bits at a position. Out-of-bounds writes are ignored.
    pub fn set_flag(&mut self, x: i32, y: i32, flag: CellFlags) {
        if self.in_bounds(x, y) {
            let idx = self.idx(x, y);
            self.cells[idx].flags |= flag;
        }
    }

    /// Clear flag bits at a position. Out-of-bounds writes are ignored.
    pub fn clear_flag(&mut self, x: i32, y: i32, flag: CellFlags) {
        if self.in_bounds(x, y) {
            let idx = self.idx(x, y);
            self.cells[idx].flags &= !flag;
        }
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.flags(x, y).contains(CellFlags::WALKABLE)
    }

    pub fn is_visible(&self, x: i32, y: i32) -> bool {
        self.flags(x, y).contains(CellFlags::VISIBLE)
    }

    pub fn is_discovered(&self, x: i32, y: i32) -> bool {
        self.flags(x, y).contains(CellFlags::DISCOVERED)
    }

    pub fn is_water(&self, x: i32, y: i32) -> bool {
        self.flags(x, y).contains(CellFlags::WATER)
    }

    /// Altitude at a position; 0.0 when out of bounds.
    pub fn altitude(&self, x: i32, y: i32) -> f32 {
        if self.in_bounds(x, y) {
            self.cells[self.idx(x, y)].altitude
        } else {
            0.0
        }
    }

    /// Set altitude at a position. Out-of-bounds writes are ignored.
    pub fn set_altitude(&mut self, x: i32, y: i32, altitude: f32) {
        if self.in_bounds(x, y) {
            let idx = self.idx(x, y);
            self.cells[idx].altitude = altitude;
        }
    }

    /// Mark a cell visible. Visibility implies discovery.
    pub fn set_visible(&mut self, x: i32, y: i32) {
        self.set_flag(x, y, CellFlags::VISIBLE | CellFlags::DISCOVERED);
    }

    /// Clear the VISIBLE bit everywhere, before recomputing FOV.
    /// DISCOVERED stays set.
    pub fn clear_visibility(&mut self) {
        for cell in &mut self.cells {
            cell.flags &= !CellFlags::VISIBLE;
        }
    }

    /// Reset every cell to the given flags and zero altitude.
    pub fn fill(&mut self, flags: CellFlags) {
        for cell in &mut self.cells {
            *cell = Cell {
                flags,
                altitude: 0.0,
            };
        }
    }

    /// All walkable cell positions, for spawn placement and tests.
    pub fn walkable_cells(&self) -> Vec<Vec2> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.flags.contains(CellFlags::WALKABLE))
            .map(|(idx, _)| self.coords(idx))
            .collect()
    }
}
