//! obstacle-2048: a 2048 move engine with board obstacles, plus AI opponents
//!
//! This crate provides:
//! - A square `Grid` of identified tiles and the move engine (`engine`):
//!   slide-and-merge resolution around walls, multiplier cells, spawning and
//!   terminal checks
//! - Persona-driven AI move selection (`ai`): greedy heuristics, a depth-2
//!   look-ahead and a uniform random player
//! - Built-in and TOML-defined levels (`level`), a player-vs-AI turn pipeline
//!   (`game`) and a checksummed save format (`serialization`)
//!
//! Quick start:
//! ```
//! use obstacle_2048::engine::{initialize_grid, resolve_move};
//! use obstacle_2048::grid::Direction;
//! use obstacle_2048::ids::SequentialIds;
//! use obstacle_2048::level::Level;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic start with a seeded RNG and predictable tile ids
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut ids = SequentialIds::with_prefix("t");
//! let level = Level::by_index(1).unwrap();
//! let g0 = initialize_grid(&level.obstacles, level.grid_size, &mut rng, &mut ids);
//! let out = resolve_move(&g0, Direction::Left, &level.obstacles, 0, &mut ids);
//! assert_eq!(out.grid.tile_count() + (out.score > 0) as usize, g0.tile_count());
//! ```
//!
//! Letting a persona pick the move instead:
//! ```
//! use obstacle_2048::ai::{choose_ai_move, Persona};
//! use obstacle_2048::grid::Grid;
//! use obstacle_2048::ids::SequentialIds;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut ids = SequentialIds::with_prefix("t");
//! let grid = Grid::from_values(&[vec![2, 2], vec![0, 4]], &mut ids).unwrap();
//! let mv = choose_ai_move(&grid, &[], 0, Persona::Aggressive, &mut StdRng::seed_from_u64(7), &mut ids);
//! assert_eq!(mv.score, 4);
//! ```
pub mod ai;
pub mod engine;
pub mod error;
pub mod game;
pub mod grid;
pub mod ids;
pub mod level;
pub mod serialization;

pub use error::GameError;
