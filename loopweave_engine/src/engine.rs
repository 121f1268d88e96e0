// The engine: orchestrates generation, evolution and counterpoint for all
// voices in a `PatternStore`.
//
// Control flow for a regeneration request:
//   voice weights -> GeneratorKind draw -> generator (candidates + positions)
//   -> counterpoint against the other sounding voices -> Batch
//
// Control flow for an evolution tick:
//   snapshot of sounding voices -> per active voice:
//     locked: local mutation (`mutation::mutate`, never regeneration)
//     auto:   full regeneration
//   -> counterpoint against the snapshot -> one Batch for every voice
//
// The engine owns the RNG and the configuration; the store and the current
// scale are borrowed per call. Nothing is written until the host commits the
// returned batch, so all voices in a tick see the same pre-tick state.
//
// `EngineStats` counts regenerations and local mutations; hosts use it for
// diagnostics and the tests use it to check the locking policy.

use crate::config::EngineConfig;
use crate::counterpoint::resolve;
use crate::error::{EngineError, Result};
use crate::generators::{GenerationRequest, GeneratorKind};
use crate::mutation::{MutationContext, mutate, rebalance_density};
use crate::pattern::Pattern;
use crate::scale::Scale;
use crate::store::{Batch, PatternStore};
use crate::voice::{VoiceConfig, VoiceId};
use loopweave_prng::StepRng;
use tracing::{debug, info};

/// Running totals of engine work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Whole-pattern generations (manual, batch or auto evolution).
    pub regenerations: u64,
    /// Local mutation passes over locked voices.
    pub local_mutations: u64,
    pub rebalances: u64,
    /// Pitches moved by counterpoint resolution.
    pub counterpoint_moves: u64,
    pub ticks: u64,
}

pub struct Engine {
    config: EngineConfig,
    rng: StepRng,
    stats: EngineStats,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = StepRng::new(config.seed);
        Engine {
            config,
            rng,
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Enable or disable counterpoint resolution.
    pub fn set_counterpoint(&mut self, enabled: bool) {
        self.config.counterpoint = enabled;
    }

    /// Draw a generator from the voice's weights and produce a pattern,
    /// without consulting any store.
    pub fn generate_pattern(
        &mut self,
        voice: &VoiceConfig,
        scale: &Scale,
        start_offset: usize,
    ) -> (GeneratorKind, Pattern) {
        let kind = voice.pattern_weights.choose(&mut self.rng);
        let req = GenerationRequest {
            voice,
            scale,
            start_offset,
            allow_zero: self.config.allow_zero_positions,
        };
        let pattern = kind.generate(&req, &mut self.rng);
        self.stats.regenerations += 1;
        (kind, pattern)
    }

    /// Regenerate one voice. Returns a one-write batch.
    pub fn regenerate(
        &mut self,
        store: &PatternStore,
        voice: VoiceId,
        scale: &Scale,
        start_offset: usize,
    ) -> Result<Batch> {
        let slot = store.slot(voice).ok_or(EngineError::UnknownVoice(voice))?;
        let others = store.sounding();
        let (kind, proposed) = self.generate_pattern(&slot.config, scale, start_offset);
        debug!(voice = %voice, generator = kind.name(), "regenerated");
        let pattern = self.resolve_against(voice, proposed, &others, scale, &slot.config);
        let mut batch = Batch::new();
        batch.push(voice, pattern);
        Ok(batch)
    }

    /// Regenerate every voice in the store as one batch. Counterpoint for
    /// each voice is resolved against the pre-batch patterns.
    pub fn regenerate_all(
        &mut self,
        store: &PatternStore,
        scale: &Scale,
        start_offset: usize,
    ) -> Batch {
        let others = store.sounding();
        let mut batch = Batch::new();
        for id in store.voice_ids() {
            let Some(slot) = store.slot(id) else {
                continue;
            };
            let (_, proposed) = self.generate_pattern(&slot.config, scale, start_offset);
            let pattern = self.resolve_against(id, proposed, &others, scale, &slot.config);
            batch.push(id, pattern);
        }
        batch
    }

    /// One evolution tick across every active voice.
    ///
    /// Locked voices are edited locally and never regenerated; auto voices
    /// are always regenerated. Inactive voices are left alone.
    pub fn evolve_tick(&mut self, store: &PatternStore, scale: &Scale, start_offset: usize) -> Batch {
        let others = store.sounding();
        let mut batch = Batch::new();
        let mut mutated = 0;
        let mut regenerated = 0;

        for id in store.voice_ids() {
            let Some(slot) = store.slot(id) else {
                continue;
            };
            let voice = &slot.config;
            if !voice.active {
                continue;
            }

            let proposed = if voice.is_locked() {
                let mut pattern = slot.pattern.clone();
                let ctx = MutationContext {
                    voice,
                    scale,
                    config: &self.config.mutation,
                    allow_regenerate: false,
                    start_offset,
                };
                let report = mutate(&mut pattern, &ctx, &mut self.rng);
                self.stats.local_mutations += 1;
                mutated += 1;
                debug!(
                    voice = %id,
                    adds = report.adds,
                    removes = report.removes,
                    transposes = report.transposes,
                    forced = report.forced_audible,
                    "locked voice mutated"
                );
                pattern
            } else {
                regenerated += 1;
                self.generate_pattern(voice, scale, start_offset).1
            };

            let pattern = self.resolve_against(id, proposed, &others, scale, voice);
            batch.push(id, pattern);
        }

        self.stats.ticks += 1;
        info!(
            tick = self.stats.ticks,
            mutated,
            regenerated,
            "evolution tick"
        );
        batch
    }

    /// Move one voice's active-step count toward `target_density`.
    pub fn rebalance(
        &mut self,
        store: &PatternStore,
        voice: VoiceId,
        scale: &Scale,
        target_density: f64,
    ) -> Result<Batch> {
        let slot = store.slot(voice).ok_or(EngineError::UnknownVoice(voice))?;
        let others = store.sounding();
        let mut pattern = slot.pattern.clone();
        let ctx = MutationContext {
            voice: &slot.config,
            scale,
            config: &self.config.mutation,
            allow_regenerate: false,
            start_offset: 0,
        };
        rebalance_density(&mut pattern, target_density, &ctx, &mut self.rng);
        self.stats.rebalances += 1;
        let pattern = self.resolve_against(voice, pattern, &others, scale, &slot.config);
        let mut batch = Batch::new();
        batch.push(voice, pattern);
        Ok(batch)
    }

    fn resolve_against(
        &mut self,
        voice_id: VoiceId,
        proposed: Pattern,
        others: &[(VoiceId, &Pattern)],
        scale: &Scale,
        voice: &VoiceConfig,
    ) -> Pattern {
        if !self.config.counterpoint {
            return proposed;
        }
        let report = resolve(voice_id, &proposed, others, scale, voice);
        self.stats.counterpoint_moves += report.moved as u64;
        report.pattern
    }
}
