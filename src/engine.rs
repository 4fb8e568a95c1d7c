//! Move resolution, tile spawning and terminal-state checks.
//!
//! All functions take the board by reference and hand back new values; the
//! input grid is never touched. Grid size is carried by [`Grid`] itself.

use std::cmp::Reverse;

use rand::Rng;

use crate::grid::{
    empty_cells, is_valid_position, obstacle_at, position_in_direction, Direction, Grid, Obstacle, ObstacleKind,
    Position, Tile,
};
use crate::ids::IdSource;

pub type Score = u64;

/// Result of sliding a grid in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub grid: Grid,
    /// Running score including the merges of this move.
    pub score: Score,
    /// False when nothing slid or merged; `grid` then equals the input.
    pub moved: bool,
}

/// Slide and merge every tile in `direction`. No random insert.
///
/// Walls stop tiles, multipliers double a tile that slides over them, portals
/// are passable. A tile created by a merge does not merge again in the same
/// move.
///
/// ```
/// use obstacle_2048::engine::resolve_move;
/// use obstacle_2048::grid::{Direction, Grid};
/// use obstacle_2048::ids::SequentialIds;
/// let mut ids = SequentialIds::with_prefix("doc");
/// let rows = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
/// let grid = Grid::from_values(&rows, &mut ids).unwrap();
/// let out = resolve_move(&grid, Direction::Left, &[], 0, &mut ids);
/// assert!(out.moved);
/// assert_eq!(out.score, 4);
/// assert_eq!(out.grid.values()[0], vec![4, 0, 0, 0]);
/// ```
pub fn resolve_move<I: IdSource + ?Sized>(
    grid: &Grid,
    direction: Direction,
    obstacles: &[Obstacle],
    score: Score,
    ids: &mut I,
) -> MoveOutcome {
    let mut work = Grid::new(grid.size());
    for tile in grid.tiles() {
        work.place(tile.settled());
    }

    let mut order: Vec<Position> = work.tiles().map(|t| t.position).collect();
    sort_for_direction(&mut order, direction);

    let mut new_score = score;
    let mut moved = false;

    for start in order {
        // Tiles only ever move towards the edge processed first, so the cell
        // still holds the tile that was collected from it.
        let Some(mut tile) = work.take(start) else { continue };
        let slide = find_farthest_position(start, direction, &work, obstacles);

        if slide.farthest != start {
            moved = true;
            // A value already at the top of `u32` stays as it is.
            if let Some(doubled) = tile.value.checked_mul(2).filter(|_| slide.multiplied) {
                tile.value = doubled;
            }
            tile.position = slide.farthest;
        }

        // Tiles whose sum would not fit in `u32` never merge.
        let merge_target = slide
            .next
            .zip(tile.value.checked_mul(2))
            .filter(|&(next, _)| work.get(next).is_some_and(|t| t.value == tile.value && t.merged_from.is_none()));
        if let Some((target, merged_value)) = merge_target.and_then(|(next, v)| work.take(next).map(|t| (t, v))) {
            work.place(Tile {
                id: ids.next_id(),
                value: merged_value,
                position: target.position,
                is_new: false,
                merged_from: Some(Box::new([tile, target])),
            });
            new_score = new_score.saturating_add(Score::from(merged_value));
            moved = true;
            continue;
        }
        work.place(tile);
    }

    if !moved {
        return MoveOutcome { grid: grid.clone(), score, moved };
    }
    MoveOutcome { grid: work, score: new_score, moved }
}

/// Tiles nearest the destination edge go first.
fn sort_for_direction(positions: &mut [Position], direction: Direction) {
    match direction {
        Direction::Up => positions.sort_by_key(|p| p.y),
        Direction::Down => positions.sort_by_key(|p| Reverse(p.y)),
        Direction::Left => positions.sort_by_key(|p| p.x),
        Direction::Right => positions.sort_by_key(|p| Reverse(p.x)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slide {
    farthest: Position,
    /// Occupied cell the tile bumped into, if any.
    next: Option<Position>,
    multiplied: bool,
}

fn find_farthest_position(start: Position, direction: Direction, grid: &Grid, obstacles: &[Obstacle]) -> Slide {
    let mut previous = start;
    let mut multiplied = false;
    loop {
        let pos = position_in_direction(previous, direction);
        if !is_valid_position(pos, grid.size()) {
            break;
        }
        match obstacle_at(obstacles, pos, None).map(|o| o.kind) {
            Some(ObstacleKind::Wall) => break,
            Some(ObstacleKind::Multiplier) => multiplied = true,
            Some(ObstacleKind::Portal) | None => {}
        }
        if grid.is_occupied(pos) {
            return Slide { farthest: previous, next: Some(pos), multiplied };
        }
        previous = pos;
    }
    Slide { farthest: previous, next: None, multiplied }
}

/// Insert a 2 (90%) or 4 (10%) tile into a uniformly chosen empty,
/// obstacle-free cell. A full grid comes back unchanged.
///
/// ```
/// use obstacle_2048::engine::spawn_random_tile;
/// use obstacle_2048::grid::Grid;
/// use obstacle_2048::ids::SequentialIds;
/// use rand::{rngs::StdRng, SeedableRng};
/// let mut rng = StdRng::seed_from_u64(123);
/// let mut ids = SequentialIds::with_prefix("doc");
/// let g = spawn_random_tile(&Grid::new(4), &[], &mut rng, &mut ids);
/// assert_eq!(g.tile_count(), 1);
/// assert!(g.tiles().all(|t| t.is_new));
/// ```
pub fn spawn_random_tile<R, I>(grid: &Grid, obstacles: &[Obstacle], rng: &mut R, ids: &mut I) -> Grid
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    let empty = empty_cells(grid, obstacles);
    if empty.is_empty() {
        return grid.clone();
    }
    let position = empty[rng.gen_range(0..empty.len())];
    let mut tile = Tile::new(ids.next_id(), generate_random_value(rng), position);
    tile.is_new = true;
    let mut out = grid.clone();
    out.place(tile);
    out
}

fn generate_random_value<R: Rng + ?Sized>(rng: &mut R) -> u32 { if rng.gen_range(0..10) < 9 { 2 } else { 4 } }

/// Empty `size × size` grid with two spawned tiles.
pub fn initialize_grid<R, I>(obstacles: &[Obstacle], size: usize, rng: &mut R, ids: &mut I) -> Grid
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    let grid = spawn_random_tile(&Grid::new(size), obstacles, rng, ids);
    spawn_random_tile(&grid, obstacles, rng, ids)
}

/// True when no free cell remains and no two neighbouring tiles, not split
/// by a wall, share a value.
pub fn is_game_over(grid: &Grid, obstacles: &[Obstacle]) -> bool {
    let size = grid.size() as i32;
    for y in 0..size {
        for x in 0..size {
            let pos = Position::new(x, y);
            let Some(tile) = grid.get(pos) else {
                if obstacle_at(obstacles, pos, None).is_none() {
                    return false;
                }
                continue;
            };
            // Right and down cover every adjacent pair once.
            for dir in [Direction::Right, Direction::Down] {
                let neighbour = position_in_direction(pos, dir);
                if obstacle_at(obstacles, neighbour, Some(ObstacleKind::Wall)).is_some() {
                    continue;
                }
                if grid.get(neighbour).is_some_and(|n| n.value == tile.value) {
                    return false;
                }
            }
        }
    }
    true
}

/// True when some tile reached `winning_value`.
#[inline]
pub fn has_won(grid: &Grid, winning_value: u32) -> bool { grid.tiles().any(|t| t.value >= winning_value) }
