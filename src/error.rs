//! Error types for puzzle configuration, generation and session control.
//!
//! Merge and split rejections are not errors; they come back as variants of
//! [`crate::sim::MergeResult`] and [`crate::sim::SplitResult`].

use thiserror::Error;

/// Invalid puzzle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A `[min, max]` range has `min > max`.
    #[error("{name} range is empty ({min} > {max})")]
    EmptyRange {
        name: &'static str,
        min: u32,
        max: u32,
    },

    /// Value range includes 0, which would generate spent tokens.
    #[error("value range must start at 1 or above")]
    ZeroValue,

    /// Value range reaches past the clamp ceiling.
    #[error("value range max {max} exceeds ceiling {ceiling}")]
    AboveCeiling { max: u32, ceiling: u32 },

    /// Red herring operator probabilities are out of range.
    #[error("red herring chances must lie in [0, 1] and sum to at most 1 (plus={plus}, minus={minus})")]
    HerringChance { plus: f32, minus: f32 },

    /// Spawn cell size must be positive and finite.
    #[error("spawn cell size must be positive and finite (got {0})")]
    CellSize(f32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Which part of generation ran out of candidate values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Solution,
    RedHerring,
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationPhase::Solution => f.write_str("solution step"),
            GenerationPhase::RedHerring => f.write_str("red herring"),
        }
    }
}

/// Puzzle generation failures.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No value in the configured range satisfies the sampling constraints.
    #[error("value range {min}..={max} exhausted at {phase} {index}")]
    RangeExhausted {
        phase: GenerationPhase,
        index: usize,
        min: u32,
        max: u32,
    },

    /// The placement service cannot give every token its own cell.
    #[error("need {needed} spawn cells but only {available} are free")]
    PlacementExhausted { needed: usize, available: usize },

    /// A puzzle handed in from outside does not hold up.
    #[error("invalid puzzle: {0}")]
    InvalidPuzzle(&'static str),
}

/// Host misuse of the puzzle session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("token {0} is not on the board")]
    UnknownToken(u32),

    #[error("a token cannot collide with itself ({0})")]
    SelfCollision(u32),

    #[error("puzzle is not being played")]
    NotPlaying,
}
