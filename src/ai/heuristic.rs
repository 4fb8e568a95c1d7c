use crate::grid::{empty_cells, Grid, Obstacle, Position};

/// Board-quality measurements for one candidate grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Features {
    pub score_delta: f64,
    pub empty_cells: f64,
    pub monotonicity: f64,
    pub smoothness: f64,
    pub highest_tile: f64,
}

impl Features {
    pub fn measure(grid: &Grid, obstacles: &[Obstacle], score_delta: u64) -> Self {
        Features {
            score_delta: score_delta as f64,
            empty_cells: empty_cells(grid, obstacles).len() as f64,
            monotonicity: calc_monotonicity(grid),
            smoothness: calc_smoothness(grid),
            highest_tile: f64::from(grid.highest_tile()),
        }
    }
}

#[inline]
fn log_value(grid: &Grid, x: usize, y: usize) -> f64 {
    match grid.value_at(Position::new(x as i32, y as i32)) {
        0 => 0.0,
        v => f64::from(v).log2(),
    }
}

/// Sum of log2 drops along every row (left to right) and column (top to
/// bottom); empty cells count as 0.
pub(crate) fn calc_monotonicity(grid: &Grid) -> f64 {
    let n = grid.size();
    let mut score = 0.0;
    for y in 0..n {
        for x in 1..n {
            let (current, next) = (log_value(grid, x - 1, y), log_value(grid, x, y));
            if current > next {
                score += current - next;
            }
        }
    }
    for x in 0..n {
        for y in 1..n {
            let (current, next) = (log_value(grid, x, y - 1), log_value(grid, x, y));
            if current > next {
                score += current - next;
            }
        }
    }
    score
}

/// Negated log2 distance between occupied neighbours; 0 is perfectly smooth.
pub(crate) fn calc_smoothness(grid: &Grid) -> f64 {
    let n = grid.size();
    let mut score = 0.0;
    for y in 0..n {
        for x in 0..n {
            let here = grid.value_at(Position::new(x as i32, y as i32));
            if here == 0 {
                continue;
            }
            for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                if nx >= n || ny >= n {
                    continue;
                }
                let there = grid.value_at(Position::new(nx as i32, ny as i32));
                if there != 0 {
                    score -= (f64::from(here).log2() - f64::from(there).log2()).abs();
                }
            }
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn grid(rows: &[Vec<u32>]) -> Grid { Grid::from_values(rows, &mut SequentialIds::with_prefix("h")).unwrap() }

    #[test]
    fn monotonicity_counts_descending_steps() {
        // Row 0 drops 1 + 1; the columns drop 3, 2 and 1 into the empty cells below.
        let g = grid(&[vec![8, 4, 2], vec![0, 0, 0], vec![0, 0, 0]]);
        assert_eq!(calc_monotonicity(&g), 2.0 + 3.0 + 2.0 + 1.0);
    }

    #[test]
    fn ascending_line_has_no_monotonicity() {
        let g = grid(&[vec![0, 0, 0], vec![0, 0, 0], vec![2, 4, 8]]);
        assert_eq!(calc_monotonicity(&g), 0.0);
    }

    #[test]
    fn smoothness_penalises_neighbour_gaps() {
        let g = grid(&[vec![2, 8], vec![2, 0]]);
        // (2,8): |1-3| = 2, (2,2) vertical: 0, 8 has no occupied neighbour below.
        assert_eq!(calc_smoothness(&g), -2.0);
        assert_eq!(calc_smoothness(&grid(&[vec![4, 4], vec![4, 4]])), 0.0);
    }

    #[test]
    fn features_use_free_cells_only() {
        let g = grid(&[vec![2, 0], vec![0, 32]]);
        let f = Features::measure(&g, &[Obstacle::wall("w", 1, 0)], 12);
        assert_eq!(f.empty_cells, 1.0);
        assert_eq!(f.highest_tile, 32.0);
        assert_eq!(f.score_delta, 12.0);
    }
}
