//! Deterministic puzzle logic
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Merge/split apply completely or not at all
//! - Stable token order (by entity ID)
//! - No rendering, physics or platform dependencies

pub mod generate;
pub mod merge;
pub mod placement;
pub mod split;
pub mod state;
pub mod token;
pub mod win;

pub use generate::{GenerationResult, PuzzleGenerator, generate_fresh, spawn_tokens};
pub use merge::{MergeApplied, MergeRejection, MergeResult, Slot, merge};
pub use placement::{GridPlacement, PlacementService, Viewport};
pub use split::{SplitRejection, SplitResult, split};
pub use state::{GameEvent, GamePhase, PuzzleState};
pub use token::{Motion, Operation, Token, TokenSpec};
pub use win::WinDetector;
