//! Gridlore - procedural generation and spatial reasoning for tile-based
//! roguelikes.
//!
//! The crate covers the algorithmic core of a roguelike and nothing else:
//! a deterministic Mersenne Twister PRNG, grid map state with per-cell flag
//! bits and altitude, an angle-interval field-of-view sweep, a graph-generic
//! best-first pathfinder, and cave/maze/island terrain generators with
//! shared region verification. Rendering, input and entity storage live in
//! the consuming game.
//!
//! Everything is single-threaded and synchronous. FOV and pathfinding own
//! reusable scratch contexts ([`fov::Fov`], [`path::Pathfinder`]); create
//! one per independent caller rather than sharing across threads.

pub mod fov;
pub mod geometry;
pub mod map;
pub mod mapgen;
pub mod path;
pub mod rng;

pub use fov::{update_visibility, Fov, FovError};
pub use geometry::{Direction, Rect, Vec2};
pub use map::{Cell, CellFlags, GridMap};
pub use mapgen::{
    ensure_contiguous, flood_fill, generate_cave, generate_island, generate_maze, CaveParams,
    IslandParams, MazeParams, RegionMask,
};
pub use path::{find_walking_path, Pathfinder};
pub use rng::MtRng;
