use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use obstacle_2048::engine::{initialize_grid, is_game_over, resolve_move, spawn_random_tile};
use obstacle_2048::grid::{Direction, Grid};
use obstacle_2048::ids::SequentialIds;
use obstacle_2048::level::Level;
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus(level: &Level) -> Vec<Grid> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ids = SequentialIds::with_prefix("bench");
    let mut boards = Vec::new();
    let mut g = initialize_grid(&level.obstacles, level.grid_size, &mut rng, &mut ids);
    boards.push(g.clone());
    // Derive a variety of densities deterministically
    for i in 0..20 {
        let dir = Direction::ALL[i % Direction::ALL.len()];
        let out = resolve_move(&g, dir, &level.obstacles, 0, &mut ids);
        if out.moved { g = spawn_random_tile(&out.grid, &level.obstacles, &mut rng, &mut ids); }
        boards.push(g.clone());
    }
    boards
}

fn bench_resolve(c: &mut Criterion) {
    for index in [0usize, 3] {
        let level = Level::by_index(index).unwrap();
        let boards = corpus(&level);
        for dir in Direction::ALL {
            c.bench_function(&format!("resolve/{}/{dir}", level.name.to_lowercase()), |bch| {
                let mut ids = SequentialIds::with_prefix("r");
                bch.iter(|| {
                    let mut acc = 0u64;
                    for g in &boards { acc += resolve_move(g, dir, &level.obstacles, 0, &mut ids).score; }
                    black_box(acc)
                })
            });
        }
    }
}

fn bench_spawn_and_terminal(c: &mut Criterion) {
    let level = Level::by_index(4).unwrap();
    c.bench_function("grid/spawn_random_tile", |bch| {
        bch.iter_batched(
            || (Grid::new(level.grid_size), StdRng::seed_from_u64(7), SequentialIds::with_prefix("s")),
            |(mut g, mut rng, mut ids)| {
                for _ in 0..16 { g = spawn_random_tile(&g, &level.obstacles, &mut rng, &mut ids); }
                black_box(g)
            },
            BatchSize::SmallInput,
        )
    });
    let boards = corpus(&level);
    c.bench_function("grid/is_game_over", |bch| {
        bch.iter(|| {
            let mut n = 0usize;
            for g in &boards { n += is_game_over(g, &level.obstacles) as usize; }
            black_box(n)
        })
    });
}

criterion_group!(engine_ops, bench_resolve, bench_spawn_and_terminal);
criterion_main!(engine_ops);
