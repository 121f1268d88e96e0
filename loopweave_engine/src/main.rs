// Loopweave CLI entry point.
//
// Builds a set of voices, generates their patterns, runs a number of
// evolution ticks and prints every pattern after each committed batch.
// Useful for auditioning configurations without a host.
//
// Usage:
//   cargo run -p loopweave_engine -- [--config FILE] [--voices N] [--length N]
//     [--density F] [--scale NAME] [--base N] [--timing MODE] [--ticks N]
//     [--seed N] [--lock] [--no-counterpoint]
//
// Scales: major, natural_minor, dorian, phrygian, lydian, mixolydian, ...
// Timing: euclidean, even, random, fill_all, bernoulli, poisson, geometric, markov
//
// Set RUST_LOG=debug for per-voice engine diagnostics.

use loopweave_engine::config::EngineConfig;
use loopweave_engine::engine::Engine;
use loopweave_engine::error::EngineError;
use loopweave_engine::positions::TimingMode;
use loopweave_engine::scale::{Scale, pitch_name};
use loopweave_engine::store::PatternStore;
use loopweave_engine::voice::GenerationMode;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_flag::<String>(&args, "--config") {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = parse_flag::<u64>(&args, "--seed") {
        config.seed = seed;
    }
    if has_flag(&args, "--no-counterpoint") {
        config.counterpoint = false;
    }
    let scale = match parse_flag::<String>(&args, "--scale") {
        Some(name) => Scale::named(&name)?,
        None => config.scale.clone(),
    };

    let num_voices: usize = parse_flag(&args, "--voices").unwrap_or(3);
    let ticks: usize = parse_flag(&args, "--ticks").unwrap_or(4);

    let mut template = config.voice_defaults.clone();
    if let Some(length) = parse_flag::<usize>(&args, "--length") {
        template.length = length;
    }
    if let Some(density) = parse_flag::<f64>(&args, "--density") {
        template.density = density;
    }
    if let Some(base) = parse_flag::<i32>(&args, "--base") {
        let shift = base - template.base_note;
        template.base_note = base;
        template.pitch_range.min += shift;
        template.pitch_range.max += shift;
    }
    if let Some(name) = parse_flag::<String>(&args, "--timing") {
        match TimingMode::from_name(&name) {
            Some(mode) => template.timing = Some(mode),
            None => warn!(timing = %name, "unknown timing mode, using generator defaults"),
        }
    }
    if has_flag(&args, "--lock") {
        template.generation_mode = GenerationMode::Locked;
    }

    println!("=== Loopweave ===");
    println!("Scale: {:?} on {}", scale.intervals(), pitch_name(template.base_note));
    println!(
        "Voices: {} x {} steps, density {:.2}, range {}..{}",
        num_voices,
        template.length,
        template.density,
        pitch_name(template.pitch_range.min),
        pitch_name(template.pitch_range.max)
    );
    println!("Seed: {}", config.seed);
    println!();

    let mut store = PatternStore::new();
    for _ in 0..num_voices {
        store.add_voice(template.clone())?;
    }

    let mut engine = Engine::new(config);
    let batch = engine.regenerate_all(&store, &scale, 0);
    store.commit(batch);
    println!("[generate]");
    print_store(&store);

    for tick in 1..=ticks {
        let batch = engine.evolve_tick(&store, &scale, tick);
        let written = store.commit(batch);
        println!("[tick {tick}] {written} voice(s) updated");
        print_store(&store);
    }

    let stats = engine.stats();
    println!();
    println!(
        "Regenerations: {}, local mutations: {}, counterpoint moves: {}",
        stats.regenerations, stats.local_mutations, stats.counterpoint_moves
    );
    Ok(())
}

fn print_store(store: &PatternStore) {
    for id in store.voice_ids() {
        if let Some(pattern) = store.pattern(id) {
            let label = id.to_string();
            println!("  {label:>12}: {}", pattern.summary(4));
        }
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
