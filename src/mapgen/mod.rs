//! Procedural terrain generation
//!
//! Three generators with one shared shape: produce a candidate pattern,
//! verify the reachable region covers enough of the map, regenerate when it
//! does not, then commit flags and altitude into the grid. The maze is the
//! exception: it is correct by construction and skips verification.

pub mod cave;
pub mod island;
pub mod maze;
pub mod region;

pub use cave::{generate_cave, CaveParams};
pub use island::{generate_island, IslandParams};
pub use maze::{generate_maze, MazeParams};
pub use region::{ensure_contiguous, flood_fill, RegionMask};
