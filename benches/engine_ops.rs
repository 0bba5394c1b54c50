use bitboard_2048::engine::{self as GameEngine, Board, Move};
use bitboard_2048::game::{Game, Greedy};
use bitboard_2048::rng::Xorshift32;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

fn warm() { GameEngine::new(); }

fn corpus() -> Vec<Board> {
    let mut rng = Xorshift32::new(42);
    let mut boards = Vec::new();
    // Empty and two-tile starts
    boards.push(Board::EMPTY);
    let mut b = Board::EMPTY.with_random_tile(&mut rng).unwrap().with_random_tile(&mut rng).unwrap();
    boards.push(b);
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..20 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = nb.with_random_tile(&mut rng).unwrap(); }
        boards.push(b);
    }
    boards
}

fn bench_shift(c: &mut Criterion) {
    warm();
    let boards = corpus();
    for (name, dir) in [("shift/left", Move::Left), ("shift/right", Move::Right), ("shift/up", Move::Up), ("shift/down", Move::Down)] {
        c.bench_function(name, |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for &bd in &boards { acc ^= bd.shift(dir).raw(); }
                black_box(acc)
            })
        });
    }
    c.bench_function("transpose", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards { acc ^= bd.transpose().raw(); }
            black_box(acc)
        })
    });
}

fn bench_spawn_and_play(c: &mut Criterion) {
    warm();
    c.bench_function("board/spawn", |bch| {
        bch.iter_batched(
            || (Board::EMPTY, Xorshift32::new(7)),
            |(mut bd, mut rng)| {
                for _ in 0..16 { bd = bd.with_random_tile(&mut rng).unwrap(); }
                black_box(bd)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("game/greedy_play_out", |bch| {
        bch.iter_batched(
            || Game::new(9).unwrap(),
            |mut game| black_box(game.play_out(&mut Greedy).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

fn bench_score_and_queries(c: &mut Criterion) {
    warm();
    let boards = corpus();
    c.bench_function("score/score", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards { acc = acc.wrapping_add(bd.score()); }
            black_box(acc)
        })
    });
    c.bench_function("query/count_empty", |bch| {
        bch.iter(|| {
            let mut acc = 0u32;
            for &bd in &boards { acc ^= bd.count_empty(); }
            black_box(acc)
        })
    });
    c.bench_function("query/count_tiles", |bch| {
        bch.iter(|| {
            let mut acc = 0u32;
            for &bd in &boards { acc ^= bd.count_tiles(); }
            black_box(acc)
        })
    });
    c.bench_function("query/features", |bch| {
        bch.iter(|| {
            let mut acc = 0f32;
            for &bd in &boards { acc += bd.features().iter().sum::<f32>(); }
            black_box(acc)
        })
    });
}

criterion_group!(engine_ops, bench_shift, bench_spawn_and_play, bench_score_and_queries);
criterion_main!(engine_ops);
