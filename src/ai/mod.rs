//! AI opponent: persona-driven move selection.
//!
//! Each [`Persona`] is a closed variant carrying its own [`Weights`] record
//! and a [`Selection`] rule, so tuning a persona is a data change.
//!
//! Notes
//! - Candidates are scored on throw-away tile ids; only the chosen direction
//!   is resolved again with the caller's id source.
//! - The engine never spawns a tile here. The caller does that, exactly as
//!   for a player move.
//!
//! Quick start
//! ```
//! use obstacle_2048::ai::{choose_ai_move, Persona};
//! use obstacle_2048::grid::Grid;
//! use obstacle_2048::ids::SequentialIds;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut ids = SequentialIds::with_prefix("doc");
//! let rows = vec![vec![2, 0, 0, 0], vec![2, 0, 0, 0], vec![0; 4], vec![0; 4]];
//! let grid = Grid::from_values(&rows, &mut ids).unwrap();
//! let mv = choose_ai_move(&grid, &[], 0, Persona::Strategic, &mut rng, &mut ids);
//! assert!(mv.direction.is_some());
//! ```

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{is_game_over, resolve_move, Score};
use crate::grid::{Direction, Grid, Obstacle};
use crate::ids::{IdSource, SequentialIds};

mod heuristic;
mod search;

pub use heuristic::Features;
pub use search::LookAhead;

/// Linear weights over [`Features`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Weights {
    pub score_delta: f64,
    pub empty_cells: f64,
    pub monotonicity: f64,
    pub smoothness: f64,
    pub highest_tile: f64,
}

impl Weights {
    #[inline]
    pub fn apply(&self, f: &Features) -> f64 {
        self.score_delta * f.score_delta
            + self.empty_cells * f.empty_cells
            + self.monotonicity * f.monotonicity
            + self.smoothness * f.smoothness
            + self.highest_tile * f.highest_tile
    }
}

/// How a persona turns candidate evaluations into a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Highest one-move evaluation; ties go to the earlier direction.
    Greedy,
    /// Highest look-ahead value from each candidate.
    LookAhead { depth: u32 },
    /// Uniform over legal directions.
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Persona {
    #[default]
    Balanced,
    Aggressive,
    Defensive,
    Strategic,
    Random,
}

impl Persona {
    pub const ALL: [Persona; 5] =
        [Persona::Balanced, Persona::Aggressive, Persona::Defensive, Persona::Strategic, Persona::Random];

    pub fn weights(self) -> Weights {
        match self {
            Persona::Balanced => {
                Weights { score_delta: 0.5, empty_cells: 10.0, monotonicity: 2.0, smoothness: 2.0, ..Weights::default() }
            }
            Persona::Aggressive => {
                Weights { score_delta: 1.0, empty_cells: 5.0, highest_tile: 0.1, ..Weights::default() }
            }
            Persona::Defensive => Weights { empty_cells: 20.0, ..Weights::default() },
            Persona::Strategic => {
                Weights { score_delta: 0.3, empty_cells: 15.0, monotonicity: 5.0, smoothness: 3.0, ..Weights::default() }
            }
            Persona::Random => Weights::default(),
        }
    }

    pub fn selection(self) -> Selection {
        match self {
            Persona::Balanced | Persona::Aggressive | Persona::Defensive => Selection::Greedy,
            Persona::Strategic => Selection::LookAhead { depth: 2 },
            Persona::Random => Selection::Uniform,
        }
    }

    /// Display name used by the game UI.
    pub fn name(self) -> &'static str {
        match self {
            Persona::Balanced => "Balanced Betty",
            Persona::Aggressive => "Aggressive Alex",
            Persona::Defensive => "Defensive Dana",
            Persona::Strategic => "Strategic Sam",
            Persona::Random => "Random Randy",
        }
    }

    /// Look a persona up by display name or short name, case-insensitively.
    /// Anything unrecognised plays like [`Persona::Balanced`].
    pub fn from_name(name: &str) -> Persona {
        let wanted = name.trim().to_ascii_lowercase();
        Persona::ALL
            .into_iter()
            .find(|p| p.name().to_ascii_lowercase() == wanted || p.short_name() == wanted)
            .unwrap_or_else(|| {
                tracing::debug!(persona = name, "unknown persona, playing as Balanced");
                Persona::Balanced
            })
    }

    fn short_name(self) -> &'static str {
        match self {
            Persona::Balanced => "balanced",
            Persona::Aggressive => "aggressive",
            Persona::Defensive => "defensive",
            Persona::Strategic => "strategic",
            Persona::Random => "random",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl From<String> for Persona {
    fn from(name: String) -> Self { Persona::from_name(&name) }
}

impl From<Persona> for String {
    fn from(p: Persona) -> Self { p.name().to_string() }
}

/// Per-direction evaluation at the root.
///
/// `legal` is false when the direction is a no-op for the current grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Direction,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a look-ahead evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
}

/// The AI's decision: chosen direction plus the resolved grid and score.
/// With no direction the grid and score are the inputs, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiMove {
    pub direction: Option<Direction>,
    pub grid: Grid,
    pub score: Score,
}

/// Evaluate every direction for `persona`, in [`Direction::ALL`] order.
///
/// Uniform personas get `ev = 0.0` for every legal branch.
pub fn branch_evals(grid: &Grid, obstacles: &[Obstacle], score: Score, persona: Persona) -> [BranchEval; 4] {
    let mut ids = SequentialIds::with_prefix("candidate");
    let weights = persona.weights();
    let mut search = match persona.selection() {
        Selection::LookAhead { depth } => Some(LookAhead::new(weights, depth)),
        _ => None,
    };
    Direction::ALL.map(|dir| {
        let out = resolve_move(grid, dir, obstacles, score, &mut ids);
        if !out.moved {
            return BranchEval { dir, ev: 0.0, legal: false };
        }
        let ev = match (persona.selection(), search.as_mut()) {
            (Selection::Uniform, _) => 0.0,
            (_, Some(la)) => la.value(&out.grid, obstacles, out.score),
            _ => weights.apply(&Features::measure(&out.grid, obstacles, out.score - score)),
        };
        BranchEval { dir, ev, legal: true }
    })
}

/// Pick a direction for `persona` and resolve it.
///
/// Returns no direction when the board is finished or nothing can move.
pub fn choose_ai_move<R, I>(
    grid: &Grid,
    obstacles: &[Obstacle],
    score: Score,
    persona: Persona,
    rng: &mut R,
    ids: &mut I,
) -> AiMove
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    let idle = || AiMove { direction: None, grid: grid.clone(), score };
    if is_game_over(grid, obstacles) {
        return idle();
    }

    let branches = branch_evals(grid, obstacles, score, persona);
    let legal: Vec<BranchEval> = branches.into_iter().filter(|b| b.legal).collect();
    let chosen = match persona.selection() {
        Selection::Uniform if !legal.is_empty() => Some(legal[rng.gen_range(0..legal.len())]),
        _ => legal.iter().copied().fold(None, |best: Option<BranchEval>, b| match best {
            Some(cur) if cur.ev >= b.ev => Some(cur),
            _ => Some(b),
        }),
    };
    let Some(chosen) = chosen else {
        return idle();
    };

    let out = resolve_move(grid, chosen.dir, obstacles, score, ids);
    tracing::trace!(persona = %persona, direction = %chosen.dir, ev = chosen.ev, "ai move chosen");
    AiMove { direction: Some(chosen.dir), grid: out.grid, score: out.score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn_random_tile;
    use rand::{rngs::StdRng, SeedableRng};

    fn grid(rows: &[Vec<u32>]) -> Grid { Grid::from_values(rows, &mut SequentialIds::with_prefix("a")).unwrap() }

    fn choose(g: &Grid, obstacles: &[Obstacle], persona: Persona) -> AiMove {
        let mut rng = StdRng::seed_from_u64(1);
        choose_ai_move(g, obstacles, 0, persona, &mut rng, &mut SequentialIds::with_prefix("pick"))
    }

    #[test]
    fn finished_board_yields_no_move() {
        let g = grid(&[vec![2, 4], vec![4, 2]]);
        for persona in Persona::ALL {
            let mv = choose(&g, &[], persona);
            assert_eq!(mv.direction, None);
            assert_eq!(mv.grid, g);
            assert_eq!(mv.score, 0);
        }
    }

    #[test]
    fn blocked_board_with_free_obstacle_cell_yields_no_move() {
        // A free cell remains, but walls sit right of and below the only tile.
        let g = grid(&[vec![2, 0], vec![0, 0]]);
        let walls = [Obstacle::wall("w1", 1, 0), Obstacle::wall("w2", 0, 1)];
        let mv = choose(&g, &walls, Persona::Balanced);
        assert_eq!(mv.direction, None);
        assert_eq!(mv.grid, g);
    }

    #[test]
    fn every_persona_picks_a_legal_move() {
        let g = grid(&[vec![2, 2, 0, 0], vec![4, 0, 0, 0], vec![0; 4], vec![0, 0, 0, 2]]);
        for persona in Persona::ALL {
            let mv = choose(&g, &[], persona);
            let dir = mv.direction.expect("a move exists");
            let direct = resolve_move(&g, dir, &[], 0, &mut SequentialIds::with_prefix("x"));
            assert!(direct.moved);
            assert_eq!(mv.grid.values(), direct.grid.values());
            assert_eq!(mv.score, direct.score);
        }
    }

    #[test]
    fn aggressive_prefers_the_merge() {
        // Only horizontal moves merge the 8s.
        let g = grid(&[vec![8, 8, 0], vec![0, 0, 0], vec![0, 0, 0]]);
        let mv = choose(&g, &[], Persona::Aggressive);
        assert!(matches!(mv.direction, Some(Direction::Left) | Some(Direction::Right)));
        assert_eq!(mv.score, 16);
    }

    #[test]
    fn defensive_maximises_free_cells() {
        let g = grid(&[vec![2, 0, 0], vec![2, 0, 0], vec![4, 0, 0]]);
        let mv = choose(&g, &[], Persona::Defensive);
        // Up and down both merge the 2s; up comes first.
        assert_eq!(mv.direction, Some(Direction::Up));
        assert_eq!(mv.grid.values(), vec![vec![4, 0, 0], vec![4, 0, 0], vec![0, 0, 0]]);
    }

    #[test]
    fn strategic_follows_the_lookahead_not_the_first_ply() {
        // Balanced takes Left for the immediate merge; two plies ahead Down
        // keeps the board tidier.
        let g = grid(&[vec![0, 0, 8], vec![0, 2, 2], vec![8, 0, 0]]);
        assert_eq!(choose(&g, &[], Persona::Balanced).direction, Some(Direction::Left));

        let evs = branch_evals(&g, &[], 0, Persona::Strategic);
        let mut ids = SequentialIds::with_prefix("x");
        for be in evs.iter().filter(|b| b.legal) {
            let out = resolve_move(&g, be.dir, &[], 0, &mut ids);
            let expected = LookAhead::new(Persona::Strategic.weights(), 2).value(&out.grid, &[], out.score);
            assert_eq!(be.ev, expected);
        }
        let best = evs.iter().filter(|b| b.legal).map(|b| b.ev).fold(f64::MIN, f64::max);
        let mv = choose(&g, &[], Persona::Strategic);
        assert_eq!(mv.direction, Some(Direction::Down));
        assert_eq!(evs.iter().find(|b| b.dir == Direction::Down).map(|b| b.ev), Some(best));
    }

    #[test]
    fn greedy_ties_keep_direction_order() {
        let g = grid(&[vec![0, 0, 0], vec![0, 2, 0], vec![0, 0, 0]]);
        let evs = branch_evals(&g, &[], 0, Persona::Defensive);
        assert!(evs.iter().all(|b| b.legal));
        assert!(evs.windows(2).all(|w| w[0].ev == w[1].ev));
        assert_eq!(choose(&g, &[], Persona::Defensive).direction, Some(Direction::Up));
    }

    #[test]
    fn branch_evals_flag_illegal_directions() {
        let g = grid(&[vec![2, 0], vec![0, 0]]);
        let evs = branch_evals(&g, &[], 0, Persona::Balanced);
        let legal: Vec<_> = evs.iter().filter(|b| b.legal).map(|b| b.dir).collect();
        assert_eq!(legal, vec![Direction::Right, Direction::Down]);
    }

    #[test]
    fn random_persona_only_picks_legal_moves() {
        let g = grid(&[vec![2, 0], vec![0, 0]]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut ids = SequentialIds::with_prefix("r");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let mv = choose_ai_move(&g, &[], 0, Persona::Random, &mut rng, &mut ids);
            seen.insert(mv.direction.unwrap());
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&Direction::Right) && seen.contains(&Direction::Down));
    }

    #[test]
    fn ai_never_spawns() {
        let g = grid(&[vec![2, 0, 0], vec![0, 0, 0], vec![0, 0, 4]]);
        for persona in Persona::ALL {
            assert_eq!(choose(&g, &[], persona).grid.tile_count(), 2);
        }
    }

    #[test]
    fn self_play_terminates_for_every_persona() {
        let walls = [Obstacle::wall("w1", 1, 1), Obstacle::multiplier("m1", 2, 2)];
        for persona in Persona::ALL {
            let mut rng = StdRng::seed_from_u64(9);
            let mut ids = SequentialIds::with_prefix("p");
            let mut g = spawn_random_tile(&Grid::new(4), &walls, &mut rng, &mut ids);
            let mut score = 0;
            for _ in 0..2000 {
                let mv = choose_ai_move(&g, &walls, score, persona, &mut rng, &mut ids);
                let Some(_) = mv.direction else { break };
                assert!(mv.score >= score);
                score = mv.score;
                g = spawn_random_tile(&mv.grid, &walls, &mut rng, &mut ids);
            }
            g.validate(&walls).unwrap();
        }
    }

    #[test]
    fn persona_names_round_trip() {
        for persona in Persona::ALL {
            assert_eq!(Persona::from_name(persona.name()), persona);
            assert_eq!(Persona::from(String::from(persona)), persona);
        }
        assert_eq!(Persona::from_name("strategic"), Persona::Strategic);
        assert_eq!(Persona::from_name("Corner Connie"), Persona::Balanced);
        assert_eq!(Persona::from_name(""), Persona::Balanced);
    }

    #[test]
    fn weights_are_linear() {
        let f = Features { score_delta: 8.0, empty_cells: 3.0, monotonicity: 1.0, smoothness: -2.0, highest_tile: 64.0 };
        assert_eq!(Persona::Balanced.weights().apply(&f), 4.0 + 30.0 + 2.0 - 4.0);
        assert_eq!(Persona::Aggressive.weights().apply(&f), 8.0 + 15.0 + 6.4);
        assert_eq!(Persona::Defensive.weights().apply(&f), 60.0);
    }
}
