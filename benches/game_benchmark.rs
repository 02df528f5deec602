//! End-to-end simulation benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use decksim::loader::{CardDatabase, DeckLoader, Game};
use decksim::tournament::{run_batch, BatchConfig};
use decksim::game::VerbosityLevel;

fn single_game(c: &mut Criterion) {
    let db = CardDatabase::demo();
    let deck = DeckLoader::parse("24 Forest\n36 Grizzly Bears\n").unwrap();

    c.bench_function("single_game_zero_vs_zero", |b| {
        b.iter(|| {
            let mut game = Game::new(&db)
                .with_seed(42)
                .with_max_turns(50)
                .with_verbosity(VerbosityLevel::Silent);
            game.add_player("Alice", deck.clone()).unwrap();
            game.add_player("Bob", deck.clone()).unwrap();
            game.start().unwrap()
        })
    });
}

fn batch_games(c: &mut Criterion) {
    let db = CardDatabase::demo();
    let green = DeckLoader::parse("24 Forest\n36 Grizzly Bears\n").unwrap();
    let red = DeckLoader::parse("24 Mountain\n36 Lightning Bolt\n").unwrap();

    let mut group = c.benchmark_group("batch");
    for games in [10u32, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(games), &games, |b, &games| {
            let config = BatchConfig {
                games,
                max_turns: 50,
                ..BatchConfig::default()
            };
            b.iter(|| run_batch(&db, &green, &red, &config).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, single_game, batch_games);
criterion_main!(benches);
