// Pattern generators: three interchangeable strategies for filling a voice's
// pattern from scratch.
//
// - euclidean.rs: pulses from the position engine, pitches from a cursor
//   that walks the candidate list by small random steps (smooth contours)
// - random.rs: pitches spread evenly across (or cycled through) the whole
//   candidate list, placed in order over the chosen positions (full coverage)
// - lead_tail.rs: a bouncing "lead" pointer with descending tails builds a
//   dense scalar stream; positions only decide which steps are audible
//
// `GeneratorKind` is the tagged variant the engine draws from a voice's
// `PatternWeights`. `GeneratorKind::generate` validates the voice, builds the
// candidate set once, and dispatches. Malformed metadata and empty candidate
// sets both produce rests rather than errors; see `error.rs`.

pub mod euclidean;
pub mod lead_tail;
pub mod random;

use crate::candidates::build_candidates;
use crate::pattern::Pattern;
use crate::positions::{PositionRequest, TimingMode, select_positions};
use crate::scale::{Pitch, Scale};
use crate::voice::{MAX_LENGTH, MIN_LENGTH, VoiceConfig};
use loopweave_prng::StepRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The three generation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Euclidean,
    Random,
    LeadTail,
}

/// Everything a generator reads for one call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub voice: &'a VoiceConfig,
    pub scale: &'a Scale,
    /// Phase hint from the host's step cursor.
    pub start_offset: usize,
    /// Whether an empty position selection may stay empty.
    pub allow_zero: bool,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(voice: &'a VoiceConfig, scale: &'a Scale) -> Self {
        GenerationRequest {
            voice,
            scale,
            start_offset: 0,
            allow_zero: false,
        }
    }
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 3] = [
        GeneratorKind::Euclidean,
        GeneratorKind::Random,
        GeneratorKind::LeadTail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeneratorKind::Euclidean => "euclidean",
            GeneratorKind::Random => "random",
            GeneratorKind::LeadTail => "lead_tail",
        }
    }

    /// Timing model used when the voice does not override it.
    pub fn default_timing(self) -> TimingMode {
        match self {
            GeneratorKind::Euclidean => TimingMode::Euclidean,
            GeneratorKind::Random => TimingMode::Random,
            GeneratorKind::LeadTail => TimingMode::Even,
        }
    }

    /// Produce a full pattern for the requested voice.
    ///
    /// The result always has the voice's length (or is empty when the length
    /// itself is invalid), and every pitch is in range and in scale.
    pub fn generate(self, req: &GenerationRequest<'_>, rng: &mut StepRng) -> Pattern {
        let voice = req.voice;
        if let Err(err) = voice.validate() {
            warn!(generator = self.name(), %err, "invalid voice metadata, emitting rests");
            return if (MIN_LENGTH..=MAX_LENGTH).contains(&voice.length) {
                Pattern::rests(voice.length)
            } else {
                Pattern::default()
            };
        }

        let candidates = build_candidates(req.scale, voice.base_note, voice.pitch_range);
        if candidates.is_empty() {
            debug!(
                generator = self.name(),
                base_note = voice.base_note,
                min = voice.pitch_range.min,
                max = voice.pitch_range.max,
                "empty candidate set, emitting rests"
            );
            return Pattern::rests(voice.length);
        }

        match self {
            GeneratorKind::Euclidean => euclidean::generate(req, &candidates, rng),
            GeneratorKind::Random => random::generate(req, &candidates, rng),
            GeneratorKind::LeadTail => lead_tail::generate(req, &candidates, rng),
        }
    }
}

/// Run position selection for a generator, honoring the voice's timing
/// override.
fn select_for(kind: GeneratorKind, req: &GenerationRequest<'_>, rng: &mut StepRng) -> Vec<usize> {
    let voice = req.voice;
    let mode = voice.timing.unwrap_or(kind.default_timing());
    let positions = PositionRequest::new(voice.length, voice.density, mode)
        .with_start_offset(req.start_offset)
        .with_jitter(voice.jitter)
        .with_allow_zero(req.allow_zero);
    select_positions(&positions, rng)
}

/// Place `pitches[i]` at `positions[i]` in an otherwise silent pattern.
fn place(length: usize, positions: &[usize], pitches: impl IntoIterator<Item = Pitch>) -> Pattern {
    let mut pattern = Pattern::rests(length);
    for (&step, pitch) in positions.iter().zip(pitches) {
        pattern.set(step, pitch);
    }
    pattern
}
