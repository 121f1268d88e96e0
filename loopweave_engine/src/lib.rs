// Loopweave pattern engine
//
// Procedurally generates and continuously evolves step patterns for a
// multi-voice looping instrument. For each voice and each step the engine
// decides which pitch (or rest) sounds, and how that assignment changes over
// time under mutation pressure and multi-voice conflict avoidance.
//
// Architecture:
// - scale.rs: Scale presets, scale-degree arithmetic, octave folding
// - candidates.rs: Every in-scale pitch inside a voice's range
// - positions.rs: Active-step selection (Euclidean, even, random, fill-all,
//   Bernoulli, Poisson, geometric, Markov)
// - pattern.rs: The fixed-length step pattern
// - voice.rs: Per-voice metadata, generator weights, validation
// - generators/: Euclidean, random and lead-tail pattern generators
// - mutation.rs: Local edits, density rebalancing, no-silence safety step
// - counterpoint.rs: Moves pitches that collide with other voices
// - store.rs: Per-voice patterns and atomic batch commits
// - engine.rs: Orchestration (regenerate, evolve tick, rebalance)
// - config.rs: JSON-loadable engine configuration
// - error.rs: Error taxonomy
//
// Audio, the playback clock, persistence and UI are the host's concern. The
// engine is deterministic given a seed.

pub mod candidates;
pub mod config;
pub mod counterpoint;
pub mod engine;
pub mod error;
pub mod generators;
pub mod mutation;
pub mod pattern;
pub mod positions;
pub mod scale;
pub mod store;
pub mod voice;
