use crate::engine::{is_game_over, resolve_move, Score};
use crate::grid::{Direction, Grid, Obstacle};
use crate::ids::SequentialIds;

use super::heuristic::Features;
use super::{SearchStats, Weights};

/// Deterministic max-only search over future moves.
///
/// Spawns are ignored: each ply tries the four directions and keeps the best
/// moved branch. Leaves are scored with `weights`, taking the accumulated
/// score as the score term, which ranks branches exactly like their gain
/// over the shared starting score.
///
/// Candidates are searched from their post-move score, so a candidate's own
/// merge gain counts toward every leaf below it instead of being dropped.
pub struct LookAhead {
    weights: Weights,
    depth: u32,
    stats: SearchStats,
}

impl LookAhead {
    pub fn new(weights: Weights, depth: u32) -> Self { Self { weights, depth, stats: SearchStats::default() } }

    /// Best reachable evaluation from `grid` within the configured depth.
    pub fn value(&mut self, grid: &Grid, obstacles: &[Obstacle], score: Score) -> f64 {
        let mut ids = SequentialIds::with_prefix("lookahead");
        let mut nodes = 0u64;
        let v = self.search(grid, obstacles, score, self.depth, &mut ids, &mut nodes);
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        v
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    fn search(
        &self,
        grid: &Grid,
        obstacles: &[Obstacle],
        score: Score,
        depth: u32,
        ids: &mut SequentialIds,
        nodes: &mut u64,
    ) -> f64 {
        *nodes += 1;
        if depth == 0 || is_game_over(grid, obstacles) {
            return self.leaf(grid, obstacles, score);
        }
        let mut best: Option<f64> = None;
        for direction in Direction::ALL {
            let out = resolve_move(grid, direction, obstacles, score, ids);
            if out.moved {
                let v = self.search(&out.grid, obstacles, out.score, depth - 1, ids, nodes);
                best = Some(best.map_or(v, |b| b.max(v)));
            }
        }
        // No continuation: judge the position on its own.
        best.unwrap_or_else(|| self.leaf(grid, obstacles, score))
    }

    #[inline]
    fn leaf(&self, grid: &Grid, obstacles: &[Obstacle], score: Score) -> f64 {
        self.weights.apply(&Features::measure(grid, obstacles, score))
    }
}
