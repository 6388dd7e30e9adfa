//! Smath - A physics arithmetic puzzle
//!
//! A target number is shown and the player throws number and operator tokens
//! into each other until one of them equals it.
//!
//! Core modules:
//! - `sim`: Deterministic puzzle logic (tokens, merge/split rules, generation, session)
//! - `settings`: Difficulty presets and puzzle tuning
//! - `error`: Configuration, generation and session errors
//!
//! Rendering, physics integration and input live in the host; they feed
//! collision/drag events into [`sim::PuzzleState`] and read tokens and
//! [`sim::GameEvent`]s back out.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, GenerateError, SessionError};
pub use settings::{Difficulty, PuzzleSpec, Settings, SpawnGrid};

/// Game configuration constants
pub mod consts {
    /// Largest value a token can hold (every write clamps to `0..=VALUE_CEILING`)
    pub const VALUE_CEILING: u32 = 999;

    /// Random draws tried before falling back to scanning the value range
    pub const MAX_SAMPLE_ATTEMPTS: u32 = 256;

    /// Red herring operator chances (p < PLUS -> PLUS, p < PLUS + MINUS -> MINUS)
    pub const HERRING_PLUS_CHANCE: f32 = 0.2;
    pub const HERRING_MINUS_CHANCE: f32 = 0.2;

    /// Spawn grid defaults (world units / cells)
    pub const SPAWN_CELL_SIZE: f32 = 2.0;
    pub const SPAWN_MARGIN_CELLS: u32 = 1;
    /// Upper bound on grid lines per axis, whatever the cell size
    pub const MAX_GRID_LINES: u32 = 256;

    /// Horizontal displacement of the operator token created by a split
    pub const SPLIT_OFFSET: f32 = 2.0;

    /// Pointer velocity multiplier applied when a dragged token is released
    pub const THROW_MULTIPLIER: f32 = 3.0;
}
