//! Puzzle settings and difficulty presets
//!
//! Read-only once a puzzle starts generating. Stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Puzzle tuning for this preset
    pub fn puzzle_spec(&self) -> PuzzleSpec {
        let base = PuzzleSpec::default();
        match self {
            Difficulty::Easy => PuzzleSpec {
                value_range: (1, 9),
                step_count_range: (1, 2),
                red_herring_count_range: (0, 1),
                ..base
            },
            Difficulty::Medium => base,
            Difficulty::Hard => PuzzleSpec {
                value_range: (1, 50),
                step_count_range: (3, 5),
                red_herring_count_range: (2, 5),
                ..base
            },
        }
    }
}

/// Generation parameters for one puzzle. All ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleSpec {
    /// Range every intermediate sum and red herring value is drawn from
    pub value_range: (u32, u32),
    /// Number of operator steps on the solution path (tokens = steps + 1)
    pub step_count_range: (u32, u32),
    /// Number of decoy tokens
    pub red_herring_count_range: (u32, u32),
    /// Chance a red herring carries a pending PLUS
    pub herring_plus_chance: f32,
    /// Chance a red herring carries a pending MINUS
    pub herring_minus_chance: f32,
    /// Clamp ceiling for token values
    #[serde(default = "default_ceiling")]
    pub value_ceiling: u32,
}

fn default_ceiling() -> u32 {
    VALUE_CEILING
}

impl Default for PuzzleSpec {
    fn default() -> Self {
        Self {
            value_range: (1, 20),
            step_count_range: (1, 3),
            red_herring_count_range: (1, 3),
            herring_plus_chance: HERRING_PLUS_CHANCE,
            herring_minus_chance: HERRING_MINUS_CHANCE,
            value_ceiling: VALUE_CEILING,
        }
    }
}

impl PuzzleSpec {
    /// Check the spec can drive generation at all.
    ///
    /// This does not prove the value range is wide enough for the step and
    /// red herring counts; generation reports that as `RangeExhausted`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("value", self.value_range)?;
        check_range("step count", self.step_count_range)?;
        check_range("red herring count", self.red_herring_count_range)?;

        if self.value_range.0 == 0 {
            return Err(ConfigError::ZeroValue);
        }
        if self.value_range.1 > self.value_ceiling {
            return Err(ConfigError::AboveCeiling {
                max: self.value_range.1,
                ceiling: self.value_ceiling,
            });
        }

        let (plus, minus) = (self.herring_plus_chance, self.herring_minus_chance);
        let in_unit = |p: f32| (0.0..=1.0).contains(&p);
        if !in_unit(plus) || !in_unit(minus) || plus + minus > 1.0 {
            return Err(ConfigError::HerringChance { plus, minus });
        }

        Ok(())
    }

    /// Largest number of tokens a puzzle from this spec can contain
    pub fn max_tokens(&self) -> usize {
        (self.step_count_range.1 + 1 + self.red_herring_count_range.1) as usize
    }
}

fn check_range(name: &'static str, (min, max): (u32, u32)) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::EmptyRange { name, min, max });
    }
    Ok(())
}

/// Spawn grid layout handed to the placement service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnGrid {
    /// Distance between neighbouring spawn cells (world units)
    pub cell_size: f32,
    /// Cells kept free along every viewport edge
    pub margin_cells: u32,
}

impl Default for SpawnGrid {
    fn default() -> Self {
        Self {
            cell_size: SPAWN_CELL_SIZE,
            margin_cells: SPAWN_MARGIN_CELLS,
        }
    }
}

/// Player-facing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Difficulty preset the puzzle spec was derived from
    pub difficulty: Difficulty,
    /// Generation tuning
    pub puzzle: PuzzleSpec,
    /// Spawn layout
    #[serde(default)]
    pub spawn: SpawnGrid,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(Difficulty::default())
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            puzzle: difficulty.puzzle_spec(),
            spawn: SpawnGrid::default(),
        }
    }

    /// Apply a difficulty preset (replaces the puzzle tuning, keeps the
    /// custom value ceiling)
    pub fn apply_preset(&mut self, difficulty: Difficulty) {
        let ceiling = self.puzzle.value_ceiling;
        self.difficulty = difficulty;
        self.puzzle = difficulty.puzzle_spec();
        self.puzzle.value_ceiling = ceiling;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.puzzle.validate()?;
        if !(self.spawn.cell_size.is_finite() && self.spawn.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.spawn.cell_size));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
