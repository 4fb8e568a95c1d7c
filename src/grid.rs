//! Board model: positions, tiles, obstacles and the square grid holding them.
//!
//! Everything here is read-only lookup; the only mutation helpers are
//! crate-private and used by the engine while it resolves a move on its own
//! working copy.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::ids::IdSource;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Directions in the order candidates are tried; ties keep this order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Cell coordinate, 0-indexed; `x` is the column and `y` the row.
///
/// Signed so that stepping off the board is representable and can be
/// rejected by [`is_valid_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self { Position { x, y } }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "({}, {})", self.x, self.y) }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(String);

impl TileId {
    pub fn new(id: impl Into<String>) -> Self { TileId(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// A numbered piece. `is_new` and `merged_from` only describe the last move
/// for presentation and are cleared whenever a move is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub position: Position,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub merged_from: Option<Box<[Tile; 2]>>,
}

impl Tile {
    pub fn new(id: TileId, value: u32, position: Position) -> Self {
        Tile { id, value, position, is_new: false, merged_from: None }
    }

    /// Copy without the presentation flags of the previous move.
    pub(crate) fn settled(&self) -> Self {
        Tile { id: self.id.clone(), value: self.value, position: self.position, is_new: false, merged_from: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    /// Blocks sliding and merging across its cell.
    Wall,
    /// Passable with no effect.
    Portal,
    /// Passable; doubles a tile that slides over it.
    Multiplier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
    pub position: Position,
}

impl Obstacle {
    pub fn new(id: impl Into<String>, kind: ObstacleKind, position: Position) -> Self {
        Obstacle { id: id.into(), kind, position }
    }

    pub fn wall(id: impl Into<String>, x: i32, y: i32) -> Self { Self::new(id, ObstacleKind::Wall, Position::new(x, y)) }

    pub fn multiplier(id: impl Into<String>, x: i32, y: i32) -> Self {
        Self::new(id, ObstacleKind::Multiplier, Position::new(x, y))
    }

    pub fn portal(id: impl Into<String>, x: i32, y: i32) -> Self { Self::new(id, ObstacleKind::Portal, Position::new(x, y)) }
}

/// Largest supported board side.
pub const MAX_GRID_SIZE: usize = 64;

/// Square matrix of optional tiles, stored row-major.
///
/// Deserializing runs [`Grid::validate`] without obstacles, so a decoded grid
/// always has `size²` cells with consistent tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl Grid {
    /// An empty `size × size` grid.
    pub fn new(size: usize) -> Self { Grid { size, cells: vec![None; size * size] } }

    /// Build a grid from row-major tile values, `0` meaning an empty cell.
    ///
    /// ```
    /// use obstacle_2048::grid::Grid;
    /// use obstacle_2048::ids::SequentialIds;
    /// let mut ids = SequentialIds::with_prefix("doc");
    /// let g = Grid::from_values(&[vec![2, 0], vec![0, 4]], &mut ids).unwrap();
    /// assert_eq!(g.size(), 2);
    /// assert_eq!(g.values(), vec![vec![2, 0], vec![0, 4]]);
    /// ```
    pub fn from_values<I: IdSource + ?Sized>(rows: &[Vec<u32>], ids: &mut I) -> Result<Self, GameError> {
        let size = rows.len();
        if size == 0 {
            return Err(GameError::invalid("grid must have at least one row"));
        }
        if size > MAX_GRID_SIZE {
            return Err(GameError::invalid(format!("grid has {size} rows, at most {MAX_GRID_SIZE} are supported")));
        }
        let mut grid = Grid::new(size);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(GameError::invalid(format!("row {y} has {} cells, expected {size}", row.len())));
            }
            for (x, &value) in row.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                if !is_tile_value(value) {
                    return Err(GameError::invalid(format!("value {value} at ({x}, {y}) is not a power of two >= 2")));
                }
                let position = Position::new(x as i32, y as i32);
                grid.place(Tile::new(ids.next_id(), value, position));
            }
        }
        Ok(grid)
    }

    #[inline]
    pub fn size(&self) -> usize { self.size }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        if is_valid_position(pos, self.size) { Some(pos.y as usize * self.size + pos.x as usize) } else { None }
    }

    /// Tile at `pos`, `None` when empty or off the board.
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&Tile> { self.index(pos).and_then(|i| self.cells[i].as_ref()) }

    #[inline]
    pub fn is_occupied(&self, pos: Position) -> bool { self.get(pos).is_some() }

    /// Value at `pos`, `0` when empty.
    #[inline]
    pub fn value_at(&self, pos: Position) -> u32 { self.get(pos).map_or(0, |t| t.value) }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ { self.cells.iter().flatten() }

    pub fn tile_count(&self) -> usize { self.tiles().count() }

    /// Highest tile value present, `0` on an empty grid.
    pub fn highest_tile(&self) -> u32 { self.tiles().map(|t| t.value).max().unwrap_or(0) }

    /// Row-major values, `0` for empty cells.
    pub fn values(&self) -> Vec<Vec<u32>> {
        self.cells.chunks(self.size.max(1)).map(|row| row.iter().map(|c| c.as_ref().map_or(0, |t| t.value)).collect()).collect()
    }

    /// Put `tile` at its own position, replacing whatever was there.
    pub(crate) fn place(&mut self, tile: Tile) {
        if let Some(i) = self.index(tile.position) {
            self.cells[i] = Some(tile);
        }
    }

    pub(crate) fn take(&mut self, pos: Position) -> Option<Tile> { self.index(pos).and_then(|i| self.cells[i].take()) }

    /// Check the bookkeeping a restored grid must satisfy: square storage,
    /// every tile at the cell it claims, power-of-two values, unique ids and
    /// no tile on a wall.
    pub fn validate(&self, obstacles: &[Obstacle]) -> Result<(), GameError> {
        if self.size == 0 {
            return Err(GameError::invalid("grid size must be at least 1"));
        }
        if self.size > MAX_GRID_SIZE {
            return Err(GameError::invalid(format!("grid size {} exceeds {MAX_GRID_SIZE}", self.size)));
        }
        let expected = self.size.checked_mul(self.size).unwrap_or(usize::MAX);
        if self.cells.len() != expected {
            return Err(GameError::invalid(format!(
                "grid of size {} holds {} cells, expected {expected}",
                self.size,
                self.cells.len()
            )));
        }
        let mut seen = HashSet::new();
        for (i, cell) in self.cells.iter().enumerate() {
            let Some(tile) = cell else { continue };
            let expected = Position::new((i % self.size) as i32, (i / self.size) as i32);
            if tile.position != expected {
                return Err(GameError::invalid(format!("tile {} stored at {expected} claims {}", tile.id, tile.position)));
            }
            if !is_tile_value(tile.value) {
                return Err(GameError::invalid(format!("tile {} has value {}", tile.id, tile.value)));
            }
            if obstacle_at(obstacles, expected, Some(ObstacleKind::Wall)).is_some() {
                return Err(GameError::invalid(format!("tile {} sits on a wall at {expected}", tile.id)));
            }
            if !seen.insert(&tile.id) {
                return Err(GameError::invalid(format!("duplicate tile id {}", tile.id)));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawGrid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GameError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let grid = Grid { size: raw.size, cells: raw.cells };
        grid.validate(&[])?;
        Ok(grid)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.size * 8);
        for (y, row) in self.values().iter().enumerate() {
            if y > 0 {
                writeln!(f, "{rule}")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => " ".repeat(7),
        v => format!("{v:^7}"),
    }
}

#[inline]
pub(crate) fn is_tile_value(value: u32) -> bool { value >= 2 && value.is_power_of_two() }

/// Adjacent cell one step in `direction`; may lie off the board.
#[inline]
pub fn position_in_direction(pos: Position, direction: Direction) -> Position {
    match direction {
        Direction::Up => Position::new(pos.x, pos.y - 1),
        Direction::Down => Position::new(pos.x, pos.y + 1),
        Direction::Left => Position::new(pos.x - 1, pos.y),
        Direction::Right => Position::new(pos.x + 1, pos.y),
    }
}

#[inline]
pub fn is_valid_position(pos: Position, grid_size: usize) -> bool {
    pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < grid_size && (pos.y as usize) < grid_size
}

/// Obstacle occupying `pos`, optionally restricted to one kind.
pub fn obstacle_at(obstacles: &[Obstacle], pos: Position, kind: Option<ObstacleKind>) -> Option<&Obstacle> {
    obstacles.iter().find(|o| o.position == pos && kind.map_or(true, |k| o.kind == k))
}

/// Cells holding neither a tile nor an obstacle, row-major.
pub fn empty_cells(grid: &Grid, obstacles: &[Obstacle]) -> Vec<Position> {
    let size = grid.size() as i32;
    (0..size)
        .flat_map(|y| (0..size).map(move |x| Position::new(x, y)))
        .filter(|&p| !grid.is_occupied(p) && obstacle_at(obstacles, p, None).is_none())
        .collect()
}

/// Obstacles must sit on the board and never share a cell.
pub fn validate_obstacles(obstacles: &[Obstacle], grid_size: usize) -> Result<(), GameError> {
    let mut cells = HashSet::new();
    for o in obstacles {
        if !is_valid_position(o.position, grid_size) {
            return Err(GameError::config(format!("obstacle {} at {} is outside a {grid_size}x{grid_size} grid", o.id, o.position)));
        }
        if !cells.insert(o.position) {
            return Err(GameError::config(format!("obstacle {} overlaps another obstacle at {}", o.id, o.position)));
        }
    }
    Ok(())
}
