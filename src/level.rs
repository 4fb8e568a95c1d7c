//! Level configuration.
//!
//! A level fixes the board size, the tile value that wins and the obstacle
//! layout. Levels are immutable once a game starts; changing level means
//! starting a new game.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::grid::{is_tile_value, validate_obstacles, Obstacle, MAX_GRID_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub grid_size: usize,
    pub winning_value: u32,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl Level {
    /// The five levels shipped with the game, easiest first.
    pub fn builtin() -> Vec<Level> {
        vec![
            Level::new("Beginner", "Classic 2048 - Merge tiles to reach 512", 4, 512, vec![]),
            Level::new(
                "Obstacles",
                "Navigate around walls to merge tiles",
                4,
                512,
                vec![Obstacle::wall("wall1", 1, 1), Obstacle::wall("wall2", 2, 2)],
            ),
            Level::new(
                "Expansion",
                "Larger grid with more obstacles",
                5,
                1024,
                vec![Obstacle::wall("wall1", 1, 1), Obstacle::wall("wall2", 3, 3), Obstacle::multiplier("multiplier1", 2, 2)],
            ),
            Level::new(
                "Challenge",
                "Complex obstacle pattern with multipliers",
                5,
                2048,
                vec![
                    Obstacle::wall("wall1", 0, 2),
                    Obstacle::wall("wall2", 4, 2),
                    Obstacle::wall("wall3", 2, 0),
                    Obstacle::wall("wall4", 2, 4),
                    Obstacle::multiplier("multiplier1", 1, 1),
                    Obstacle::multiplier("multiplier2", 3, 3),
                ],
            ),
            Level::new(
                "Master",
                "The ultimate challenge - reach 4096",
                6,
                4096,
                vec![
                    Obstacle::wall("wall1", 1, 1),
                    Obstacle::wall("wall2", 1, 4),
                    Obstacle::wall("wall3", 4, 1),
                    Obstacle::wall("wall4", 4, 4),
                    Obstacle::wall("wall5", 2, 3),
                    Obstacle::wall("wall6", 3, 2),
                    Obstacle::multiplier("multiplier1", 0, 0),
                    Obstacle::multiplier("multiplier2", 5, 5),
                ],
            ),
        ]
    }

    fn new(name: &str, description: &str, grid_size: usize, winning_value: u32, obstacles: Vec<Obstacle>) -> Self {
        Level { name: name.to_string(), description: description.to_string(), grid_size, winning_value, obstacles }
    }

    /// Built-in level by index.
    pub fn by_index(index: usize) -> Result<Level, GameError> {
        let mut levels = Level::builtin();
        let count = levels.len();
        if index >= count {
            return Err(GameError::config(format!("level {index} does not exist (0..{count})")));
        }
        Ok(levels.swap_remove(index))
    }

    /// Parse and validate a level from TOML.
    ///
    /// ```
    /// use obstacle_2048::level::Level;
    /// let level = Level::from_toml_str(r#"
    ///     name = "Corridor"
    ///     grid_size = 3
    ///     winning_value = 256
    ///
    ///     [[obstacles]]
    ///     id = "w"
    ///     type = "wall"
    ///     position = { x = 1, y = 1 }
    /// "#).unwrap();
    /// assert_eq!(level.obstacles.len(), 1);
    /// ```
    pub fn from_toml_str(src: &str) -> Result<Level, GameError> {
        let level: Level = toml::from_str(src).map_err(|e| GameError::config(format!("bad level file: {e}")))?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Level, GameError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|e| GameError::config(format!("cannot read {}: {e}", path.display())))?;
        Level::from_toml_str(&src)
    }

    /// A level is playable when the board exists, the target is a reachable
    /// tile value and obstacles leave room for the two starting tiles.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.grid_size == 0 {
            return Err(GameError::config(format!("level {:?} has grid size 0", self.name)));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(GameError::config(format!(
                "level {:?} has grid size {}, at most {MAX_GRID_SIZE} is supported",
                self.name, self.grid_size
            )));
        }
        if !is_tile_value(self.winning_value) {
            return Err(GameError::config(format!(
                "level {:?} has winning value {}, expected a power of two >= 2",
                self.name, self.winning_value
            )));
        }
        validate_obstacles(&self.obstacles, self.grid_size)?;
        if self.grid_size * self.grid_size < self.obstacles.len() + 2 {
            return Err(GameError::config(format!("level {:?} has no room for the starting tiles", self.name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_levels_are_valid() {
        let levels = Level::builtin();
        assert_eq!(levels.len(), 5);
        for level in &levels {
            level.validate().unwrap();
        }
        assert_eq!(levels[0].winning_value, 512);
        assert_eq!(levels[4].grid_size, 6);
        assert_eq!(levels[4].obstacles.len(), 8);
    }

    #[test]
    fn by_index_bounds() {
        assert_eq!(Level::by_index(2).unwrap().name, "Expansion");
        assert!(matches!(Level::by_index(5), Err(GameError::Configuration(_))));
    }

    #[test]
    fn rejects_broken_levels() {
        let mut level = Level::by_index(1).unwrap();
        level.winning_value = 100;
        assert!(level.validate().is_err());

        let mut level = Level::by_index(1).unwrap();
        level.obstacles.push(Obstacle::portal("p", 4, 0));
        assert!(level.validate().is_err());

        let mut level = Level::by_index(0).unwrap();
        level.grid_size = 0;
        assert!(level.validate().is_err());

        let cramped = Level::new("tiny", "", 1, 4, vec![]);
        assert!(cramped.validate().is_err());
    }

    #[test]
    fn toml_levels_are_validated() {
        let bad = r#"
            name = "Broken"
            grid_size = 2
            winning_value = 64

            [[obstacles]]
            id = "w"
            type = "wall"
            position = { x = 5, y = 0 }
        "#;
        assert!(matches!(Level::from_toml_str(bad), Err(GameError::Configuration(_))));
        assert!(Level::from_toml_str("name = 3").is_err());

        for size in ["65", "100000", "4294967296"] {
            let huge = format!("name = \"Huge\"\ngrid_size = {size}\nwinning_value = 512\n");
            assert!(matches!(Level::from_toml_str(&huge), Err(GameError::Configuration(_))));
        }
        let widest = format!("name = \"Widest\"\ngrid_size = {MAX_GRID_SIZE}\nwinning_value = 512\n");
        assert_eq!(Level::from_toml_str(&widest).unwrap().grid_size, MAX_GRID_SIZE);
    }

    #[test]
    fn toml_file_round_trip() {
        let level = Level::by_index(3).unwrap();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), toml::to_string(&level).unwrap()).unwrap();
        assert_eq!(Level::from_toml_path(tmp.path()).unwrap(), level);
    }
}
