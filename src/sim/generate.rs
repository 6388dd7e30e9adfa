//! Puzzle generation
//!
//! A puzzle is a random walk through the value range: each solution step
//! picks the next running sum and emits the signed difference as a `+n` or
//! `-n` token. The final sum is the target. Red herrings are extra tokens
//! whose values never repeat any other token's.
//!
//! The generator caches its last result and replays it until reset, so
//! leaving and re-entering a puzzle shows the same tokens.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::placement::{PlacementService, Viewport};
use super::token::{Motion, Operation, Token, TokenSpec};
use crate::consts::MAX_SAMPLE_ATTEMPTS;
use crate::error::{GenerateError, GenerationPhase};
use crate::settings::{PuzzleSpec, SpawnGrid};

/// A generated puzzle, tokens in generation order (solution path first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub target: u32,
    /// Operator steps on the solution path
    pub step_count: u32,
    pub red_herring_count: u32,
    pub tokens: Vec<TokenSpec>,
}

impl GenerationResult {
    /// Tokens on the guaranteed solution path (`step_count + 1` of them)
    pub fn solution(&self) -> &[TokenSpec] {
        let len = (self.step_count as usize + 1).min(self.tokens.len());
        &self.tokens[..len]
    }

    pub fn red_herrings(&self) -> &[TokenSpec] {
        &self.tokens[self.solution().len()..]
    }

    /// Fold the solution tokens in order: first value as-is, then each
    /// `+n`/`-n` applied to the running total
    pub fn evaluate_solution(&self) -> i64 {
        self.solution()
            .iter()
            .fold(0i64, |acc, spec| match spec.operation {
                Operation::Minus => acc - spec.value as i64,
                _ => acc + spec.value as i64,
            })
    }

    /// Check a puzzle that did not come from [`generate_fresh`]: counts line
    /// up, every value is non-zero, distinct and within `ceiling`, and the
    /// solution path adds up to the target.
    pub fn validate(&self, ceiling: u32) -> Result<(), GenerateError> {
        let expected = self.step_count as usize + 1 + self.red_herring_count as usize;
        if self.tokens.len() != expected {
            return Err(GenerateError::InvalidPuzzle(
                "token count does not match step and red herring counts",
            ));
        }
        if self.tokens.iter().any(|t| t.value == 0) {
            return Err(GenerateError::InvalidPuzzle("token without a value"));
        }
        if self.tokens.iter().any(|t| t.value > ceiling) || self.target > ceiling {
            return Err(GenerateError::InvalidPuzzle("value above ceiling"));
        }
        for (i, a) in self.tokens.iter().enumerate() {
            if self.tokens[i + 1..].iter().any(|b| b.value == a.value) {
                return Err(GenerateError::InvalidPuzzle("duplicate token value"));
            }
        }

        let (first, steps) = self
            .solution()
            .split_first()
            .ok_or(GenerateError::InvalidPuzzle("empty solution"))?;
        if first.operation != Operation::None
            || steps
                .iter()
                .any(|s| !matches!(s.operation, Operation::Plus | Operation::Minus))
        {
            return Err(GenerateError::InvalidPuzzle(
                "solution must be a number followed by +n/-n steps",
            ));
        }
        if self.target == 0 || self.evaluate_solution() != self.target as i64 {
            return Err(GenerateError::InvalidPuzzle("solution does not reach the target"));
        }
        Ok(())
    }
}

/// Generator with replay cache
#[derive(Debug, Clone, Default)]
pub struct PuzzleGenerator {
    cache: Option<GenerationResult>,
}

impl PuzzleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result that the next `generate` call will replay
    pub fn cached(&self) -> Option<&GenerationResult> {
        self.cache.as_ref()
    }

    /// Drop the cached puzzle so the next `generate` call is fresh
    pub fn reset(&mut self) {
        if self.cache.take().is_some() {
            log::debug!("Puzzle cache cleared");
        }
    }

    /// Cache a known puzzle; the next `generate` replays it. A puzzle that
    /// fails [`GenerationResult::validate`] leaves the cache untouched.
    pub fn load(&mut self, result: GenerationResult, ceiling: u32) -> Result<(), GenerateError> {
        if let Err(e) = result.validate(ceiling) {
            log::warn!("Rejected puzzle (target {}): {}", result.target, e);
            return Err(e);
        }
        log::debug!("Loaded puzzle (target {})", result.target);
        self.cache = Some(result);
        Ok(())
    }

    /// Replay the cached puzzle, or generate and cache a fresh one
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        spec: &PuzzleSpec,
        rng: &mut R,
    ) -> Result<GenerationResult, GenerateError> {
        if let Some(cached) = &self.cache {
            log::info!("Replaying puzzle (target {})", cached.target);
            return Ok(cached.clone());
        }

        let result = generate_fresh(spec, rng)?;
        self.cache = Some(result.clone());
        Ok(result)
    }
}

/// Generate a new puzzle without touching any cache
pub fn generate_fresh<R: Rng + ?Sized>(
    spec: &PuzzleSpec,
    rng: &mut R,
) -> Result<GenerationResult, GenerateError> {
    spec.validate()?;

    let (min, max) = spec.value_range;
    let step_count = rng.random_range(spec.step_count_range.0..=spec.step_count_range.1);
    let red_herring_count =
        rng.random_range(spec.red_herring_count_range.0..=spec.red_herring_count_range.1);

    let mut sum: i64 = 0;
    // Values already emitted; no two tokens may share one
    let mut spawned: Vec<u32> = Vec::with_capacity((step_count + 1 + red_herring_count) as usize);
    let mut tokens = Vec::with_capacity(spawned.capacity());

    for i in 0..=step_count as usize {
        let next = sample_value(rng, spec.value_range, |next| {
            let difference = next as i64 - sum;
            difference != 0
                && !spawned.contains(&next)
                && !spawned.contains(&(difference.unsigned_abs() as u32))
        })
        .ok_or(GenerateError::RangeExhausted {
            phase: GenerationPhase::Solution,
            index: i,
            min,
            max,
        })?;

        let difference = next as i64 - sum;
        sum += difference;

        let value = difference.unsigned_abs() as u32;
        let operation = if i == 0 {
            Operation::None
        } else if difference > 0 {
            Operation::Plus
        } else {
            Operation::Minus
        };

        log::debug!("Step {}: {}{} (sum {})", i, operation.symbol(), value, sum);
        spawned.push(value);
        tokens.push(TokenSpec::new(value, operation));
    }

    for i in 0..red_herring_count as usize {
        let value = sample_value(rng, spec.value_range, |v| !spawned.contains(&v)).ok_or(
            GenerateError::RangeExhausted {
                phase: GenerationPhase::RedHerring,
                index: i,
                min,
                max,
            },
        )?;

        let roll: f32 = rng.random();
        let operation = if roll < spec.herring_plus_chance {
            Operation::Plus
        } else if roll < spec.herring_plus_chance + spec.herring_minus_chance {
            Operation::Minus
        } else {
            Operation::None
        };

        log::debug!("Red herring {}: {}{}", i, operation.symbol(), value);
        spawned.push(value);
        tokens.push(TokenSpec::new(value, operation));
    }

    let target = sum as u32;
    log::info!(
        "Generated puzzle: target {} in {} steps, {} red herrings",
        target,
        step_count,
        red_herring_count
    );

    Ok(GenerationResult {
        target,
        step_count,
        red_herring_count,
        tokens,
    })
}

/// Uniform draw from `min..=max` among values accepted by `accept`.
///
/// Rejection sampling is bounded; once the draws run out the remaining
/// candidates are enumerated, so an exhausted range returns `None` instead
/// of spinning.
fn sample_value<R: Rng + ?Sized>(
    rng: &mut R,
    (min, max): (u32, u32),
    accept: impl Fn(u32) -> bool,
) -> Option<u32> {
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let value = rng.random_range(min..=max);
        if accept(value) {
            return Some(value);
        }
    }

    let candidates: Vec<u32> = (min..=max).filter(|&v| accept(v)).collect();
    candidates.choose(rng).copied()
}

/// Create board tokens for `result`, one free placement cell each.
///
/// Cells are drawn at random without replacement; ids run from `first_id`.
pub fn spawn_tokens<P: PlacementService + ?Sized, R: Rng + ?Sized>(
    result: &GenerationResult,
    placement: &P,
    viewport: Viewport,
    grid: SpawnGrid,
    ceiling: u32,
    first_id: u32,
    rng: &mut R,
) -> Result<Vec<Token>, GenerateError> {
    let mut cells = placement.allocate(viewport, grid.cell_size, grid.margin_cells);
    if cells.len() < result.tokens.len() {
        return Err(GenerateError::PlacementExhausted {
            needed: result.tokens.len(),
            available: cells.len(),
        });
    }

    let tokens = result
        .tokens
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let cell = cells.swap_remove(rng.random_range(0..cells.len()));
            Token::from_spec(first_id + i as u32, *spec, ceiling).with_motion(Motion::at(cell))
        })
        .collect();
    Ok(tokens)
}
