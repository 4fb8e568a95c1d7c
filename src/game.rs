//! Turn pipeline for a player board and an independent AI board.
//!
//! Both boards start from the same initial grid on the same level and then
//! evolve separately: the player's move is resolved, a tile is spawned and the
//! terminal checks run; the AI then does the same on its own board with the
//! direction picked by its persona. Any pause between the two moves is up to
//! the caller.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{choose_ai_move, Persona};
use crate::engine::{has_won, initialize_grid, is_game_over, resolve_move, spawn_random_tile, Score};
use crate::error::GameError;
use crate::grid::{Direction, Grid};
use crate::ids::{IdSource, SequentialIds};
use crate::level::Level;
use crate::serialization::{self, Snapshot, SnapshotError};

/// One board's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub grid: Grid,
    pub score: Score,
    pub best_score: Score,
    pub won: bool,
    pub over: bool,
    /// Set once the player chose to keep going after a win.
    pub keep_playing: bool,
}

impl GameState {
    pub fn new(grid: Grid) -> Self {
        GameState { grid, score: 0, best_score: 0, won: false, over: false, keep_playing: false }
    }

    /// Same board with a fresh score, keeping the best score seen so far.
    fn restarted(&self, grid: Grid) -> Self { GameState { best_score: self.best_score, ..GameState::new(grid) } }

    /// Spawn after a resolved move and update the win/over flags.
    fn settle<R, I>(&mut self, grid: Grid, score: Score, level: &Level, rng: &mut R, ids: &mut I) -> bool
    where
        R: Rng + ?Sized,
        I: IdSource + ?Sized,
    {
        let grid = spawn_random_tile(&grid, &level.obstacles, rng, ids);
        let won_now = !self.won && !self.keep_playing && has_won(&grid, level.winning_value);
        let game_over = is_game_over(&grid, &level.obstacles);
        self.grid = grid;
        self.score = score;
        self.best_score = self.best_score.max(score);
        self.won |= won_now;
        self.over = game_over && !won_now;
        won_now
    }
}

/// The AI's board plus the persona driving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiState {
    pub board: GameState,
    pub persona: Persona,
}

impl AiState {
    /// Whether the AI still takes turns.
    pub fn is_active(&self) -> bool { !self.board.over && !(self.board.won && !self.board.keep_playing) }
}

/// What one side's move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// `None` when the AI found no move.
    pub direction: Option<Direction>,
    pub moved: bool,
    pub score_delta: Score,
    /// The winning value was reached by this move.
    pub won: bool,
    pub over: bool,
}

/// Result of [`Duel::play_turn`]. `ai` is absent when the AI did not get a
/// turn (the player's move was ignored, ended the game, or the AI is done).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub player: Option<MoveReport>,
    pub ai: Option<MoveReport>,
}

/// A player and an AI racing on the same level.
#[derive(Debug, Clone)]
pub struct Duel {
    level: Level,
    pub player: GameState,
    pub ai: AiState,
    extra_lives: u32,
    ids: SequentialIds,
}

impl Duel {
    /// Start a duel with clock-prefixed tile ids.
    ///
    /// ```
    /// use obstacle_2048::ai::Persona;
    /// use obstacle_2048::game::Duel;
    /// use obstacle_2048::grid::Direction;
    /// use obstacle_2048::level::Level;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let mut duel = Duel::new(Level::by_index(0).unwrap(), Persona::Balanced, &mut rng).unwrap();
    /// assert_eq!(duel.player.grid, duel.ai.board.grid);
    /// let _report = duel.play_turn(Direction::Left, &mut rng);
    /// ```
    pub fn new<R: Rng + ?Sized>(level: Level, persona: Persona, rng: &mut R) -> Result<Self, GameError> {
        Self::with_ids(level, persona, SequentialIds::new(), rng)
    }

    pub fn with_ids<R: Rng + ?Sized>(
        level: Level,
        persona: Persona,
        mut ids: SequentialIds,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        level.validate()?;
        let grid = initialize_grid(&level.obstacles, level.grid_size, rng, &mut ids);
        tracing::debug!(level = %level.name, persona = %persona, "new duel");
        Ok(Duel {
            player: GameState::new(grid.clone()),
            ai: AiState { board: GameState::new(grid), persona },
            level,
            extra_lives: 0,
            ids,
        })
    }

    #[inline]
    pub fn level(&self) -> &Level { &self.level }

    #[inline]
    pub fn extra_lives(&self) -> u32 { self.extra_lives }

    /// Fresh boards on the current level; best scores are kept.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let grid = initialize_grid(&self.level.obstacles, self.level.grid_size, rng, &mut self.ids);
        self.player = self.player.restarted(grid.clone());
        self.ai.board = self.ai.board.restarted(grid);
    }

    /// Swap in another level and restart.
    pub fn set_level<R: Rng + ?Sized>(&mut self, level: Level, rng: &mut R) -> Result<(), GameError> {
        level.validate()?;
        self.level = level;
        self.restart(rng);
        Ok(())
    }

    pub fn set_persona(&mut self, persona: Persona) { self.ai.persona = persona; }

    /// Let the player keep going after reaching the winning value.
    pub fn continue_playing(&mut self) { self.player.keep_playing = true; }

    pub fn add_extra_lives(&mut self, amount: u32) { self.extra_lives = self.extra_lives.saturating_add(amount); }

    /// Revive a finished player board by spending a life.
    pub fn use_extra_life(&mut self) -> bool {
        if self.player.over && self.extra_lives > 0 {
            self.player.over = false;
            self.extra_lives -= 1;
            true
        } else {
            false
        }
    }

    /// Resolve the player's move. `None` when the board is already over.
    pub fn player_move<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> Option<MoveReport> {
        if self.player.over {
            return None;
        }
        let out = resolve_move(&self.player.grid, direction, &self.level.obstacles, self.player.score, &mut self.ids);
        if !out.moved {
            return Some(MoveReport { direction: Some(direction), moved: false, score_delta: 0, won: false, over: false });
        }
        let delta = out.score - self.player.score;
        let won = self.player.settle(out.grid, out.score, &self.level, rng, &mut self.ids);
        tracing::debug!(direction = %direction, delta, score = self.player.score, "player moved");
        if won {
            tracing::info!(score = self.player.score, "player reached {}", self.level.winning_value);
        } else if self.player.over {
            tracing::info!(score = self.player.score, "player board is full");
        }
        Some(MoveReport { direction: Some(direction), moved: true, score_delta: delta, won, over: self.player.over })
    }

    /// Let the AI take its move. `None` when the AI board is done.
    pub fn ai_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<MoveReport> {
        if !self.ai.is_active() {
            return None;
        }
        let board = &self.ai.board;
        let mv = choose_ai_move(&board.grid, &self.level.obstacles, board.score, self.ai.persona, rng, &mut self.ids);
        let Some(direction) = mv.direction else {
            self.ai.board.over = true;
            tracing::info!(persona = %self.ai.persona, score = self.ai.board.score, "ai has no move left");
            return Some(MoveReport { direction: None, moved: false, score_delta: 0, won: false, over: true });
        };
        let delta = mv.score - self.ai.board.score;
        let won = self.ai.board.settle(mv.grid, mv.score, &self.level, rng, &mut self.ids);
        tracing::debug!(persona = %self.ai.persona, direction = %direction, delta, score = self.ai.board.score, "ai moved");
        if won {
            tracing::info!(persona = %self.ai.persona, score = self.ai.board.score, "ai reached {}", self.level.winning_value);
        }
        Some(MoveReport { direction: Some(direction), moved: true, score_delta: delta, won, over: self.ai.board.over })
    }

    /// Player move followed by the AI's reply when the player's move counted
    /// and neither ended the game nor won it.
    pub fn play_turn<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> TurnReport {
        let player = self.player_move(direction, rng);
        let ai = match player {
            Some(p) if p.moved && !p.won && !p.over => self.ai_move(rng),
            _ => None,
        };
        TurnReport { player, ai }
    }

    /// Plain-data copy of everything needed to resume.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            level: self.level.clone(),
            player: self.player.clone(),
            ai: self.ai.clone(),
            extra_lives: self.extra_lives,
        }
    }

    /// Resume from a snapshot after validating it.
    pub fn restore(snapshot: Snapshot) -> Result<Self, GameError> {
        snapshot.validate()?;
        let Snapshot { level, player, ai, extra_lives } = snapshot;
        Ok(Duel { level, player, ai, extra_lives, ids: SequentialIds::new() })
    }

    /// Decode saved bytes, falling back to a fresh duel on `level` when the
    /// save is missing, corrupt or inconsistent.
    pub fn restore_or_new<R: Rng + ?Sized>(
        bytes: Option<&[u8]>,
        level: Level,
        persona: Persona,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let restored = bytes.map(|b| serialization::decode(b).and_then(|s| Duel::restore(s).map_err(SnapshotError::from)));
        match restored {
            Some(Ok(duel)) => Ok(duel),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "discarding saved duel");
                Duel::new(level, persona, rng)
            }
            None => Duel::new(level, persona, rng),
        }
    }
}
