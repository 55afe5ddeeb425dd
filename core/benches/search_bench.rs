use criterion::{criterion_group, criterion_main, Criterion};
use pantry_core::config::{EngineConfig, IndexConfig, IndexKind};
use pantry_core::{PantryEngine, PantryQuery, Recipe};

const POOL: &[&str] = &[
    "tomato", "garlic", "onion", "chicken breast", "ground beef", "basmati rice", "black beans", "pasta",
    "fresh basil", "lemon juice", "ginger", "soy sauce", "olive oil", "butter", "flour", "eggs", "milk",
];

fn corpus(n: u64) -> Vec<Recipe> {
    (0..n)
        .map(|i| {
            let ings: Vec<String> = (0..(3 + i % 6))
                .map(|k| format!("{} cup {}", 1 + k, POOL[((i * 31 + k * 7) % POOL.len() as u64) as usize]))
                .collect();
            Recipe::new(i, format!("recipe {i}")).with_ingredients(ings).with_tags(["dinner"])
        })
        .collect()
}

fn engine(kind: IndexKind) -> PantryEngine {
    let config = EngineConfig { index: IndexConfig { force: Some(kind), ..Default::default() }, ..Default::default() };
    let engine = PantryEngine::new(config);
    engine.load_recipes(corpus(5_000)).expect("corpus");
    engine.train().expect("train");
    engine
}

fn bench_search(c: &mut Criterion) {
    let engine = engine(IndexKind::Exact);
    let query = PantryQuery::new(["tomato", "garlic", "olive oil", "pasta"]).page(1, 20);
    c.bench_function("search_5k", |b| b.iter(|| engine.search(&query)));
}

fn bench_recommend(c: &mut Criterion) {
    for kind in [IndexKind::Exact, IndexKind::Postings] {
        let engine = engine(kind);
        c.bench_function(&format!("recommend_5k_{kind:?}"), |b| {
            b.iter(|| engine.recommend(&["tomato", "garlic", "pasta"], 10, &[], 0.0))
        });
    }
}

criterion_group!(benches, bench_search, bench_recommend);
criterion_main!(benches);
