// Mutation and evolution of existing patterns.
//
// Two operations work on a pattern in place:
// - `mutate`: `max(1, floor(length * intensity * change_scale))` random
//   steps are visited. An empty step may be filled with a fresh candidate
//   pitch; an occupied one may be cleared, moved 1-2 scale degrees up or
//   down (folded back into range by octaves, never clamped), or, when the
//   caller allows it, trigger a full regeneration through a generator.
// - `rebalance_density`: removes random active steps or fills inactive ones
//   (from a shuffled list) until the active count is round(length * target).
//
// Both finish with `ensure_audible`: a pattern that ended up silent gets one
// candidate pitch at step 0.
//
// Which voices are mutated and which are regenerated is the engine's policy
// (see `engine.rs`); this module only edits the pattern it is handed.

use crate::candidates::build_candidates;
use crate::generators::{GenerationRequest, GeneratorKind};
use crate::pattern::Pattern;
use crate::positions::density_count;
use crate::scale::{Pitch, Scale, fold_into_range};
use crate::voice::VoiceConfig;
use loopweave_prng::StepRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tunable mutation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Fraction of steps eligible for change per call, in [0, 1].
    pub intensity: f64,
    /// Scales `length * intensity` down to the number of visited steps.
    pub change_scale: f64,
    /// Chance that a visited empty step is filled.
    pub add_probability: f64,
    /// Chance that a visited note is cleared.
    pub remove_probability: f64,
    /// Chance that a visited note (not cleared) is moved by scale degrees.
    pub transpose_probability: f64,
    /// Chance that a visited note triggers a full regeneration instead of a
    /// local edit. Only consulted when regeneration is allowed.
    pub regenerate_probability: f64,
    /// Largest move, in scale degrees, of a transposition.
    pub max_degree_step: u32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        MutationConfig {
            intensity: 0.3,
            change_scale: 0.45,
            add_probability: 0.5,
            remove_probability: 0.3,
            transpose_probability: 0.6,
            regenerate_probability: 0.05,
            max_degree_step: 2,
        }
    }
}

/// What a mutation call works against.
#[derive(Debug, Clone, Copy)]
pub struct MutationContext<'a> {
    pub voice: &'a VoiceConfig,
    pub scale: &'a Scale,
    pub config: &'a MutationConfig,
    /// Whether a visited note may trigger full regeneration.
    pub allow_regenerate: bool,
    /// Phase hint passed through to a regeneration.
    pub start_offset: usize,
}

/// Tally of what one call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub adds: usize,
    pub removes: usize,
    pub transposes: usize,
    /// Set when the call regenerated the whole pattern.
    pub regenerated: Option<GeneratorKind>,
    /// Set when the silence safety step had to add a note.
    pub forced_audible: bool,
}

impl MutationReport {
    pub fn changed(&self) -> bool {
        self.adds + self.removes + self.transposes > 0
            || self.regenerated.is_some()
            || self.forced_audible
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    pub added: usize,
    pub removed: usize,
    pub forced_audible: bool,
}

/// Number of steps visited by one `mutate` call. Zero only for an empty
/// pattern.
pub fn change_count(length: usize, intensity: f64, change_scale: f64) -> usize {
    if length == 0 {
        return 0;
    }
    let raw = length as f64 * intensity.clamp(0.0, 1.0) * change_scale.max(0.0);
    (raw.floor() as usize).max(1)
}

/// Apply one round of local edits to `pattern`.
pub fn mutate(pattern: &mut Pattern, ctx: &MutationContext<'_>, rng: &mut StepRng) -> MutationReport {
    let mut report = MutationReport::default();
    let length = pattern.len();
    if length == 0 {
        return report;
    }
    let voice = ctx.voice;
    let config = ctx.config;
    let candidates = build_candidates(ctx.scale, voice.base_note, voice.pitch_range);

    for _ in 0..change_count(length, config.intensity, config.change_scale) {
        let step = rng.range_usize(0, length);
        match pattern.get(step) {
            None => {
                if !candidates.is_empty() && rng.random_bool(config.add_probability) {
                    pattern.set(step, random_candidate(&candidates, rng));
                    report.adds += 1;
                }
            }
            Some(pitch) => {
                if ctx.allow_regenerate && rng.random_bool(config.regenerate_probability) {
                    let kind = voice.pattern_weights.choose(rng);
                    let req = GenerationRequest {
                        voice,
                        scale: ctx.scale,
                        start_offset: ctx.start_offset,
                        allow_zero: false,
                    };
                    *pattern = kind.generate(&req, rng);
                    report.regenerated = Some(kind);
                    debug!(generator = kind.name(), "mutation escalated to regeneration");
                    break;
                }
                if rng.random_bool(config.remove_probability) {
                    pattern.clear(step);
                    report.removes += 1;
                } else if rng.random_bool(config.transpose_probability) {
                    if let Some(moved) = transpose(pitch, voice, ctx.scale, config.max_degree_step, rng) {
                        pattern.set(step, moved);
                        report.transposes += 1;
                    }
                }
            }
        }
    }

    report.forced_audible = ensure_audible(pattern, &candidates, rng);
    report
}

/// Move `pitch` by 1..=`max_step` scale degrees in a random direction and
/// fold the result into the voice's range. `None` if the pitch is not in the
/// scale (e.g. after a global scale change) or no octave of the target fits.
fn transpose(
    pitch: Pitch,
    voice: &VoiceConfig,
    scale: &Scale,
    max_step: u32,
    rng: &mut StepRng,
) -> Option<Pitch> {
    let magnitude = rng.range_i32_inclusive(1, max_step.max(1) as i32);
    let delta = if rng.random_bool(0.5) { magnitude } else { -magnitude };
    let target = scale.step_degrees(pitch, voice.base_note, delta)?;
    fold_into_range(target, voice.pitch_range.min, voice.pitch_range.max)
}

/// Add or remove notes until the active count equals
/// `round(length * target_density)`.
pub fn rebalance_density(
    pattern: &mut Pattern,
    target_density: f64,
    ctx: &MutationContext<'_>,
    rng: &mut StepRng,
) -> RebalanceReport {
    let mut report = RebalanceReport::default();
    let length = pattern.len();
    if length == 0 {
        return report;
    }
    let candidates = build_candidates(ctx.scale, ctx.voice.base_note, ctx.voice.pitch_range);
    let target = density_count(length, target_density);

    let active = pattern.active_steps();
    let mut inactive = pattern.inactive_steps();
    rng.shuffle(&mut inactive);

    if active.len() > target {
        for i in rng.sample_indices(active.len(), active.len() - target) {
            pattern.clear(active[i]);
            report.removed += 1;
        }
    } else if active.len() < target {
        if candidates.is_empty() {
            warn!(target, "cannot fill steps: empty candidate set");
        } else {
            for &step in inactive.iter().take(target - active.len()) {
                pattern.set(step, random_candidate(&candidates, rng));
                report.added += 1;
            }
        }
    }

    report.forced_audible = ensure_audible(pattern, &candidates, rng);
    debug!(
        target,
        added = report.added,
        removed = report.removed,
        "density rebalanced"
    );
    report
}

/// Put a candidate pitch on step 0 if the pattern is entirely silent.
/// Returns whether a note was added. With no candidates the pattern stays
/// silent; there is no in-scale, in-range pitch to write.
pub fn ensure_audible(pattern: &mut Pattern, candidates: &[Pitch], rng: &mut StepRng) -> bool {
    if pattern.is_empty() || !pattern.is_silent() {
        return false;
    }
    if candidates.is_empty() {
        warn!("silent pattern left silent: empty candidate set");
        return false;
    }
    pattern.set(0, random_candidate(candidates, rng));
    true
}

fn random_candidate(candidates: &[Pitch], rng: &mut StepRng) -> Pitch {
    candidates[rng.range_usize(0, candidates.len())]
}
