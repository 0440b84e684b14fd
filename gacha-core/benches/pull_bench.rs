use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gacha_core::balance::{simulate_pity, PitySimConfig};
use gacha_core::constants::BASE_RARITY_WEIGHTS;
use gacha_core::pity::{adjust_weights, PityConfig, PullState};
use gacha_core::savemigration::{decode_save, encode_save};
use gacha_core::*;

fn rich_player(config: &GachaConfig) -> PlayerState {
    let mut state = PlayerState::new(&config.tiers.full, &config.energy, 0);
    state.ledger.crystals = u64::MAX / 2;
    state.energy.max = u32::MAX;
    state.energy.current = u32::MAX;
    state
}

fn bench_generation(c: &mut Criterion) {
    let generator = EntityGenerator::default();
    let modifiers = GenerationModifiers {
        tags: vec!["fire".into(), "star".into()],
        ..Default::default()
    };
    let mut rng = GachaRng::from_seed(42);

    c.bench_function("generate_entity", |b| {
        b.iter(|| {
            generator
                .generate(black_box(&BASE_RARITY_WEIGHTS), &modifiers, &mut rng, 0)
                .ok()
        })
    });

    let state = PullState {
        pity_counter: 70,
        ..Default::default()
    };
    let pity = PityConfig::default();
    c.bench_function("adjust_weights", |b| {
        b.iter(|| adjust_weights(black_box(&BASE_RARITY_WEIGHTS), black_box(&state), &pity))
    });
}

fn bench_pulls(c: &mut Criterion) {
    let config = GachaConfig::default();
    let generator = config.generator();
    let modifiers = GenerationModifiers::default();
    let mut tier = config.tiers.full.clone();
    tier.inventory_capacity = usize::MAX;
    let banner = Banner::standard();
    let mut rng = GachaRng::from_seed(7);

    c.bench_function("perform_pull_10", |b| {
        b.iter_batched(
            || rich_player(&config),
            |mut state| {
                let ctx = PullContext {
                    tier: &tier,
                    pity: &config.pity,
                    generator: &generator,
                    modifiers: &modifiers,
                    now: 0,
                };
                perform_pull(&mut state, &banner, black_box(10), &ctx, &mut rng).ok()
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_saves(c: &mut Criterion) {
    let config = GachaConfig::default();
    let generator = config.generator();
    let modifiers = GenerationModifiers::default();
    let mut state = rich_player(&config);
    let ctx = PullContext {
        tier: &config.tiers.full,
        pity: &config.pity,
        generator: &generator,
        modifiers: &modifiers,
        now: 0,
    };
    let mut rng = GachaRng::from_seed(1);
    for _ in 0..20 {
        let _ = perform_pull(&mut state, &Banner::standard(), 10, &ctx, &mut rng);
    }
    let persisted = PersistedState::new(TierKind::Full, state, 0);
    let encoded = encode_save(&persisted).unwrap_or_default();

    c.bench_function("encode_save_200_entities", |b| {
        b.iter(|| encode_save(black_box(&persisted)).ok())
    });
    c.bench_function("decode_save_200_entities", |b| {
        b.iter(|| decode_save(black_box(&encoded)).ok())
    });
}

fn bench_balance(c: &mut Criterion) {
    let sim = PitySimConfig {
        players: 100,
        pulls_per_player: 200,
        base_seed: 42,
    };
    let pity = PityConfig::default();
    c.bench_function("simulate_pity_100x200", |b| {
        b.iter(|| simulate_pity(&BASE_RARITY_WEIGHTS, &pity, black_box(&sim)).ok())
    });
}

criterion_group!(benches, bench_generation, bench_pulls, bench_saves, bench_balance);
criterion_main!(benches);
