//! Puzzle session state
//!
//! Owns the board for one player: the seeded RNG, the generator and its
//! replay cache, the live tokens and the win latch. The host feeds it
//! collision and drag events and drains [`GameEvent`]s back out.
//!
//! Events must be fed one at a time: a collision is fully resolved,
//! destructions included, before the next one touching the same token.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generate::{GenerationResult, PuzzleGenerator, spawn_tokens};
use super::merge::{MergeResult, Slot, merge};
use super::placement::{GridPlacement, PlacementService, Viewport};
use super::split::{SplitResult, split};
use super::token::{Motion, Operation, Token};
use super::win::WinDetector;
use crate::consts::THROW_MULTIPLIER;
use crate::error::{ConfigError, GenerateError, SessionError};
use crate::settings::Settings;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, no tokens on the board
    Menu,
    /// Puzzle in progress
    Playing,
    /// Target reached; tokens stay where they are
    Solved,
}

/// Things the host needs to react to (spawn sprites, despawn, celebrate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned { id: u32 },
    /// Every token was removed from the board
    Cleared,
    Merged { base: u32, holder: u32, value: u32 },
    OperatorTransferred { base: u32, holder: u32, operation: Operation },
    Split { source: u32, operator: u32 },
    Destroyed { id: u32 },
    /// Queued at most once per puzzle instance
    Solved { target: u32 },
}

/// One player's puzzle session
#[derive(Debug, Clone)]
pub struct PuzzleState<P: PlacementService = GridPlacement> {
    /// Session seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    settings: Settings,
    /// Visible area used for spawn placement
    pub viewport: Viewport,
    placement: P,
    generator: PuzzleGenerator,
    win: WinDetector,
    phase: GamePhase,
    /// Target of the puzzle on the board
    target: Option<u32>,
    /// Live tokens (sorted by id)
    tokens: Vec<Token>,
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl PuzzleState {
    /// Create a session using the grid placement service
    pub fn new(seed: u64, settings: Settings, viewport: Viewport) -> Result<Self, ConfigError> {
        Self::with_placement(seed, settings, viewport, GridPlacement)
    }
}

impl<P: PlacementService> PuzzleState<P> {
    pub fn with_placement(
        seed: u64,
        settings: Settings,
        viewport: Viewport,
        placement: P,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let cells = placement
            .allocate(viewport, settings.spawn.cell_size, settings.spawn.margin_cells)
            .len();
        if cells < settings.puzzle.max_tokens() {
            log::warn!(
                "Spawn grid has {} cells but puzzles may need {}",
                cells,
                settings.puzzle.max_tokens()
            );
        }

        Ok(Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            viewport,
            placement,
            generator: PuzzleGenerator::new(),
            win: WinDetector::new(),
            phase: GamePhase::Menu,
            target: None,
            tokens: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: u32) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// Puzzle the next `play` will replay, if any
    pub fn cached_puzzle(&self) -> Option<&GenerationResult> {
        self.generator.cached()
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the settings. The cached puzzle is dropped so the next `play`
    /// uses them.
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.settings = settings;
        self.generator.reset();
        Ok(())
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Start (or resume) a puzzle: replays the cached puzzle when there is
    /// one, otherwise generates a fresh one. Returns the target.
    ///
    /// On error the board and the replay cache are left as they were.
    pub fn play(&mut self) -> Result<u32, GenerateError> {
        let replay = self.generator.cached().is_some();
        let result = self.generator.generate(&self.settings.puzzle, &mut self.rng)?;
        let spawned = spawn_tokens(
            &result,
            &self.placement,
            self.viewport,
            self.settings.spawn,
            self.settings.puzzle.value_ceiling,
            self.next_id,
            &mut self.rng,
        );
        let tokens = match spawned {
            Ok(tokens) => tokens,
            Err(err) => {
                if !replay {
                    self.generator.reset();
                }
                log::warn!("Cannot spawn puzzle: {}", err);
                return Err(err);
            }
        };

        self.clear_board();
        self.next_id += tokens.len() as u32;
        self.events
            .extend(tokens.iter().map(|t| GameEvent::Spawned { id: t.id }));
        self.tokens = tokens;
        self.target = Some(result.target);
        self.win.reset();
        self.phase = GamePhase::Playing;

        log::info!(
            "Playing: target {} with {} tokens",
            result.target,
            self.tokens.len()
        );
        Ok(result.target)
    }

    /// Play a specific puzzle instead of a generated one. The puzzle must
    /// pass [`GenerationResult::validate`] under the configured ceiling;
    /// otherwise nothing changes.
    pub fn play_puzzle(&mut self, result: GenerationResult) -> Result<u32, GenerateError> {
        self.generator.load(result, self.settings.puzzle.value_ceiling)?;
        self.play()
    }

    /// Back to the menu. The puzzle stays cached for the next `play`.
    pub fn home(&mut self) {
        self.clear_board();
        self.target = None;
        self.phase = GamePhase::Menu;
        log::info!("Back to menu");
    }

    /// Throw away the current puzzle. While a puzzle is on the board a fresh
    /// one replaces it.
    pub fn reset(&mut self) -> Result<(), GenerateError> {
        self.generator.reset();
        if self.phase != GamePhase::Menu {
            self.play()?;
        }
        Ok(())
    }

    fn clear_board(&mut self) {
        if !self.tokens.is_empty() {
            self.tokens.clear();
            self.events.push(GameEvent::Cleared);
        }
    }

    fn index_of(&self, id: u32) -> Result<usize, SessionError> {
        self.tokens
            .iter()
            .position(|t| t.id == id)
            .ok_or(SessionError::UnknownToken(id))
    }

    fn remove(&mut self, id: u32) {
        self.tokens.retain(|t| t.id != id);
        self.events.push(GameEvent::Destroyed { id });
    }

    fn playing_target(&self) -> Result<u32, SessionError> {
        match (self.phase, self.target) {
            (GamePhase::Playing, Some(target)) => Ok(target),
            _ => Err(SessionError::NotPlaying),
        }
    }

    /// Copy physics-layer motion into a token
    pub fn sync_motion(&mut self, id: u32, motion: Motion) -> Result<(), SessionError> {
        let index = self.index_of(id)?;
        self.tokens[index].motion = motion;
        Ok(())
    }

    /// The player let go of a dragged token: it flies off with the pointer
    /// velocity scaled by [`THROW_MULTIPLIER`] and may combine on impact.
    pub fn release(&mut self, id: u32, pointer_vel: Vec2) -> Result<(), SessionError> {
        let index = self.index_of(id)?;
        let token = &mut self.tokens[index];
        token.motion.vel = pointer_vel * THROW_MULTIPLIER;
        token.can_combine = true;
        Ok(())
    }

    /// The physics layer reports a token at rest
    pub fn land(&mut self, id: u32) -> Result<(), SessionError> {
        let index = self.index_of(id)?;
        self.tokens[index].can_combine = false;
        Ok(())
    }

    /// Resolve a contact between two tokens.
    ///
    /// Returns `None` when neither token is in flight (plain physics contact).
    /// Otherwise both tokens stop being in flight and the merge outcome is
    /// returned; destroyed tokens are already gone from the board.
    pub fn collide(&mut self, a: u32, b: u32) -> Result<Option<MergeResult>, SessionError> {
        let target = self.playing_target()?;
        if a == b {
            return Err(SessionError::SelfCollision(a));
        }
        let (ia, ib) = (self.index_of(a)?, self.index_of(b)?);
        if !self.tokens[ia].can_combine && !self.tokens[ib].can_combine {
            return Ok(None);
        }

        let (first, second) = pair_mut(&mut self.tokens, ia, ib);
        first.can_combine = false;
        second.can_combine = false;
        let result = merge(first, second, target);

        match result {
            MergeResult::Rejected(rejection) => {
                log::debug!("Tokens {} and {} bounce: {}", a, b, rejection);
            }
            MergeResult::Applied(applied) => {
                let (base, holder) = match applied.operator_holder {
                    Slot::First => (b, a),
                    Slot::Second => (a, b),
                };
                if applied.operator_consumed {
                    self.events.push(GameEvent::Merged {
                        base,
                        holder,
                        value: applied.result_value,
                    });
                } else {
                    let operation = self.tokens[self.index_of(base)?].operation();
                    self.events.push(GameEvent::OperatorTransferred {
                        base,
                        holder,
                        operation,
                    });
                }

                self.remove(holder);
                if applied.accumulator_destroyed {
                    self.remove(base);
                }
                if self.win.observe(applied.target_reached) {
                    self.solve(target);
                }
            }
        }

        Ok(Some(result))
    }

    /// Split a bound operator off a token into its own pure-operator token
    pub fn split(&mut self, id: u32) -> Result<SplitResult, SessionError> {
        let target = self.playing_target()?;
        let index = self.index_of(id)?;

        let result = split(&mut self.tokens[index], self.next_id, target);
        match &result {
            SplitResult::Rejected(rejection) => {
                log::debug!("Token {} cannot split: {}", id, rejection);
            }
            SplitResult::Applied {
                operator,
                target_reached,
            } => {
                let operator_id = self.next_entity_id();
                self.tokens.push(operator.clone());
                self.events.push(GameEvent::Split {
                    source: id,
                    operator: operator_id,
                });
                self.events.push(GameEvent::Spawned { id: operator_id });
                if self.win.observe(*target_reached) {
                    self.solve(target);
                }
            }
        }

        Ok(result)
    }

    fn solve(&mut self, target: u32) {
        log::info!("Solved! Reached {}", target);
        self.phase = GamePhase::Solved;
        self.events.push(GameEvent::Solved { target });
        // This instance is finished; "play again" starts a fresh one
        self.generator.reset();
    }
}

/// Mutable references to two distinct elements
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = items.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::merge::MergeRejection;
    use crate::sim::split::SplitRejection;
    use crate::sim::token::TokenSpec;

    fn viewport() -> Viewport {
        Viewport::new(17.8, 10.0)
    }

    fn session(seed: u64) -> PuzzleState {
        PuzzleState::new(seed, Settings::default(), viewport()).unwrap()
    }

    /// 3 + 4 = 7, with a ×2 decoy and a spare 9
    fn fixed_puzzle() -> GenerationResult {
        GenerationResult {
            target: 7,
            step_count: 1,
            red_herring_count: 2,
            tokens: vec![
                TokenSpec::new(3, Operation::None),
                TokenSpec::new(4, Operation::Plus),
                TokenSpec::new(2, Operation::Multiply),
                TokenSpec::new(9, Operation::None),
            ],
        }
    }

    /// Id of the token holding `spec`
    fn id_of(state: &PuzzleState, spec: TokenSpec) -> u32 {
        state
            .tokens()
            .iter()
            .find(|t| t.spec() == spec)
            .map(|t| t.id)
            .unwrap()
    }

    #[test]
    fn test_starts_in_menu() {
        let state = session(1);
        assert_eq!(state.phase(), GamePhase::Menu);
        assert!(state.tokens().is_empty());
        assert_eq!(state.target(), None);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = Settings::default();
        settings.puzzle.value_range = (5, 1);
        assert!(PuzzleState::new(1, settings, viewport()).is_err());
    }

    #[test]
    fn test_play_spawns_puzzle() {
        let mut state = session(1);
        let target = state.play().unwrap();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert_eq!(state.target(), Some(target));

        let cached = state.cached_puzzle().unwrap().clone();
        assert_eq!(cached.target, target);
        let specs: Vec<_> = state.tokens().iter().map(|t| t.spec()).collect();
        assert_eq!(specs, cached.tokens);

        let spawned = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Spawned { .. }))
            .count();
        assert_eq!(spawned, cached.tokens.len());
    }

    #[test]
    fn test_resting_tokens_do_not_merge() {
        let mut state = session(1);
        state.play_puzzle(fixed_puzzle()).unwrap();
        let three = id_of(&state, TokenSpec::new(3, Operation::None));
        let four = id_of(&state, TokenSpec::new(4, Operation::Plus));

        assert_eq!(state.collide(three, four).unwrap(), None);
        assert_eq!(state.tokens().len(), 4);
    }

    #[test]
    fn test_solve_fixed_puzzle() {
        let mut state = session(1);
        state.play_puzzle(fixed_puzzle()).unwrap();
        state.drain_events();
        let three = id_of(&state, TokenSpec::new(3, Operation::None));
        let four = id_of(&state, TokenSpec::new(4, Operation::Plus));

        state.release(four, Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(state.token(four).unwrap().motion.vel, Vec2::new(THROW_MULTIPLIER, 0.0));

        let result = state.collide(four, three).unwrap().unwrap();
        assert!(matches!(result, MergeResult::Applied(a) if a.target_reached));
        assert_eq!(state.phase(), GamePhase::Solved);
        assert!(state.token(four).is_none());
        assert_eq!(state.token(three).unwrap().value(), 7);
        assert!(!state.token(three).unwrap().can_combine);

        let events = state.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::Merged {
                    base: three,
                    holder: four,
                    value: 7
                },
                GameEvent::Destroyed { id: four },
                GameEvent::Solved { target: 7 },
            ]
        );

        // Solved is terminal for gameplay
        assert_eq!(state.collide(three, four), Err(SessionError::NotPlaying));
        assert!(state.cached_puzzle().is_none());
    }

    #[test]
    fn test_bounce_ends_flight() {
        let mut state = session(1);
        state.play_puzzle(fixed_puzzle()).unwrap();
        let three = id_of(&state, TokenSpec::new(3, Operation::None));
        let nine = id_of(&state, TokenSpec::new(9, Operation::None));

        state.release(nine, Vec2::ZERO).unwrap();
        let result = state.collide(nine, three).unwrap();
        assert_eq!(result, Some(MergeResult::Rejected(MergeRejection::NoOperator)));
        assert!(!state.token(nine).unwrap().can_combine);
        assert_eq!(state.tokens().len(), 4);

        // Landed tokens stay inert
        state.release(nine, Vec2::ZERO).unwrap();
        state.land(nine).unwrap();
        assert_eq!(state.collide(nine, three).unwrap(), None);
    }

    #[test]
    fn test_split_and_transfer() {
        let mut state = session(1);
        state.play_puzzle(fixed_puzzle()).unwrap();
        state.drain_events();
        let four = id_of(&state, TokenSpec::new(4, Operation::Plus));
        let nine = id_of(&state, TokenSpec::new(9, Operation::None));

        let result = state.split(four).unwrap();
        let SplitResult::Applied { operator, target_reached } = result else {
            panic!("split should apply");
        };
        assert!(!target_reached);
        assert_eq!(state.tokens().len(), 5);
        assert_eq!(state.token(four).unwrap().spec(), TokenSpec::new(4, Operation::None));
        assert_eq!(state.token(operator.id).unwrap().spec(), TokenSpec::new(0, Operation::Plus));
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::Split {
                    source: four,
                    operator: operator.id
                },
                GameEvent::Spawned { id: operator.id },
            ]
        );

        // Bare 4 cannot split again
        assert_eq!(
            state.split(four).unwrap(),
            SplitResult::Rejected(SplitRejection::NoOperator)
        );

        // Throw the + onto the 9: 9 is armed, + is gone
        state.release(operator.id, Vec2::Y).unwrap();
        state.collide(nine, operator.id).unwrap();
        assert_eq!(state.token(nine).unwrap().spec(), TokenSpec::new(9, Operation::Plus));
        assert!(state.token(operator.id).is_none());
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::OperatorTransferred {
                    base: nine,
                    holder: operator.id,
                    operation: Operation::Plus
                },
                GameEvent::Destroyed { id: operator.id },
            ]
        );
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_zero_result_destroys_both() {
        let mut state = session(1);
        state
            .play_puzzle(GenerationResult {
                target: 7,
                step_count: 1,
                red_herring_count: 1,
                tokens: vec![
                    TokenSpec::new(3, Operation::None),
                    TokenSpec::new(4, Operation::Plus),
                    TokenSpec::new(5, Operation::Minus),
                ],
            })
            .unwrap();
        let three = id_of(&state, TokenSpec::new(3, Operation::None));
        let four = id_of(&state, TokenSpec::new(4, Operation::Plus));
        let minus = id_of(&state, TokenSpec::new(5, Operation::Minus));

        state.release(minus, Vec2::X).unwrap();
        state.collide(three, minus).unwrap();
        assert!(state.token(three).is_none());
        assert!(state.token(minus).is_none());
        assert!(state.token(four).is_some());
        assert_eq!(state.tokens().len(), 1);
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_split_can_win() {
        let mut state = session(1);
        state
            .play_puzzle(GenerationResult {
                target: 6,
                step_count: 1,
                red_herring_count: 1,
                tokens: vec![
                    TokenSpec::new(2, Operation::None),
                    TokenSpec::new(4, Operation::Plus),
                    TokenSpec::new(6, Operation::Divide),
                ],
            })
            .unwrap();
        let six = id_of(&state, TokenSpec::new(6, Operation::Divide));
        assert!(matches!(
            state.split(six).unwrap(),
            SplitResult::Applied {
                target_reached: true,
                ..
            }
        ));
        assert_eq!(state.phase(), GamePhase::Solved);
        let solved = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Solved { .. }))
            .count();
        assert_eq!(solved, 1);
    }

    #[test]
    fn test_home_then_play_replays() {
        let mut state = session(9);
        state.play().unwrap();
        let before: Vec<_> = state.tokens().iter().map(|t| t.spec()).collect();
        let target = state.target();

        state.home();
        assert_eq!(state.phase(), GamePhase::Menu);
        assert!(state.tokens().is_empty());

        state.play().unwrap();
        let after: Vec<_> = state.tokens().iter().map(|t| t.spec()).collect();
        assert_eq!(before, after);
        assert_eq!(state.target(), target);
    }

    #[test]
    fn test_reset_regenerates() {
        let mut state = session(9);
        state.play().unwrap();
        let first_ids: Vec<_> = state.tokens().iter().map(|t| t.id).collect();

        state.reset().unwrap();
        assert_eq!(state.phase(), GamePhase::Playing);
        let fresh = state.cached_puzzle().unwrap();
        let specs: Vec<_> = state.tokens().iter().map(|t| t.spec()).collect();
        assert_eq!(specs, fresh.tokens);
        // New tokens, never reused ids
        assert!(state.tokens().iter().all(|t| !first_ids.contains(&t.id)));

        state.home();
        state.reset().unwrap();
        assert_eq!(state.phase(), GamePhase::Menu);
        assert!(state.cached_puzzle().is_none());
    }

    #[test]
    fn test_play_failure_keeps_board() {
        let mut state = session(1);
        state.play_puzzle(fixed_puzzle()).unwrap();
        state.viewport = Viewport::new(2.0, 2.0);
        state.generator.reset();
        assert!(matches!(
            state.play(),
            Err(GenerateError::PlacementExhausted { .. })
        ));
        assert_eq!(state.tokens().len(), 4);
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(state.cached_puzzle().is_none());
    }

    #[test]
    fn test_nan_viewport_fails_play() {
        let mut state = session(1);
        state.viewport = Viewport::new(f32::NAN, 10.0);
        assert!(matches!(
            state.play(),
            Err(GenerateError::PlacementExhausted { available: 0, .. })
        ));
        assert_eq!(state.phase(), GamePhase::Menu);
    }

    #[test]
    fn test_new_settings_drop_cache() {
        use crate::settings::Difficulty;

        let mut state = session(4);
        state.play().unwrap();
        state.home();
        assert!(state.cached_puzzle().is_some());

        state.set_settings(Settings::from_preset(Difficulty::Easy)).unwrap();
        assert!(state.cached_puzzle().is_none());
        state.play().unwrap();
        assert!(state.target().unwrap() <= 9);
    }

    #[test]
    fn test_invalid_puzzle_is_not_played() {
        let mut state = session(1);
        state.play_puzzle(fixed_puzzle()).unwrap();
        let before: Vec<_> = state.tokens().to_vec();

        // A spent token and a repeated value
        let broken = GenerationResult {
            target: 7,
            step_count: 1,
            red_herring_count: 2,
            tokens: vec![
                TokenSpec::new(3, Operation::None),
                TokenSpec::new(4, Operation::Plus),
                TokenSpec::new(0, Operation::None),
                TokenSpec::new(3, Operation::Minus),
            ],
        };
        assert!(matches!(
            state.play_puzzle(broken),
            Err(GenerateError::InvalidPuzzle(_))
        ));
        assert_eq!(state.tokens(), &before[..]);
        assert_eq!(state.cached_puzzle(), Some(&fixed_puzzle()));
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_session_errors() {
        let mut state = session(1);
        assert_eq!(state.collide(1, 2), Err(SessionError::NotPlaying));
        assert_eq!(state.split(1), Err(SessionError::NotPlaying));

        state.play_puzzle(fixed_puzzle()).unwrap();
        let three = id_of(&state, TokenSpec::new(3, Operation::None));
        assert_eq!(state.collide(three, three), Err(SessionError::SelfCollision(three)));
        assert_eq!(state.collide(three, 999), Err(SessionError::UnknownToken(999)));
        assert_eq!(state.release(999, Vec2::ZERO), Err(SessionError::UnknownToken(999)));
    }

    #[test]
    fn test_generated_puzzles_are_solvable() {
        for seed in 0..50 {
            let mut state = session(seed);
            state.play().unwrap();
            let solution = state.cached_puzzle().unwrap().solution().to_vec();
            let ids: Vec<u32> = solution.iter().map(|spec| id_of(&state, *spec)).collect();

            // Throw each step into the running total until the win fires
            let base = ids[0];
            for &step in &ids[1..] {
                state.release(step, Vec2::X).unwrap();
                state.collide(step, base).unwrap();
                if state.phase() == GamePhase::Solved {
                    break;
                }
            }
            assert_eq!(state.phase(), GamePhase::Solved, "seed {seed}");
            assert_eq!(state.token(base).unwrap().value(), state.target().unwrap());
        }
    }
}
