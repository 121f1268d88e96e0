// Per-voice metadata.
//
// A voice ("loop") is one independent pattern track. `VoiceConfig` holds
// everything the engine reads about it: length, base note, pitch range,
// density, whether it is locked, how to weigh the three generators, and a
// few generator knobs. Defaults are resolved once when the config is built
// (`Default` + `#[serde(default)]`) so callers never re-derive them per call.
//
// Validation lives here too: the engine rejects malformed metadata up front
// (`EngineError::InvalidLength` etc.) rather than producing partial patterns.
//
// See also: `generators/mod.rs` for `GeneratorKind`, `store.rs` which owns
// one `VoiceConfig` per voice.

use crate::candidates::PitchRange;
use crate::error::{EngineError, Result};
use crate::generators::GeneratorKind;
use crate::positions::TimingMode;
use crate::scale::Pitch;
use loopweave_prng::StepRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest supported voice length, in steps.
pub const MIN_LENGTH: usize = 1;
/// Largest supported voice length, in steps.
pub const MAX_LENGTH: usize = 512;
/// Largest accepted lead-tail tail length. A tail can never be longer than
/// the candidate list, which a voice range keeps well below this.
pub const MAX_TAIL_LENGTH: usize = MAX_LENGTH;

/// Identifier of a voice in the pattern store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoiceId(pub u32);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoiceId({})", self.0)
    }
}

/// How evolution treats a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Fully regenerated on every evolution tick.
    #[default]
    Auto,
    /// Kept, and only edited step by step by the mutation engine.
    Locked,
}

/// Relative weights for choosing a generator. Need not sum to 1; negative
/// or non-finite weights count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternWeights {
    pub euclidean: f64,
    pub random: f64,
    pub lead_tail: f64,
}

impl Default for PatternWeights {
    fn default() -> Self {
        PatternWeights {
            euclidean: 1.0,
            random: 1.0,
            lead_tail: 1.0,
        }
    }
}

impl PatternWeights {
    /// Weights that always select one generator.
    pub fn only(kind: GeneratorKind) -> Self {
        let mut w = PatternWeights {
            euclidean: 0.0,
            random: 0.0,
            lead_tail: 0.0,
        };
        match kind {
            GeneratorKind::Euclidean => w.euclidean = 1.0,
            GeneratorKind::Random => w.random = 1.0,
            GeneratorKind::LeadTail => w.lead_tail = 1.0,
        }
        w
    }

    pub fn weight(&self, kind: GeneratorKind) -> f64 {
        let w = match kind {
            GeneratorKind::Euclidean => self.euclidean,
            GeneratorKind::Random => self.random,
            GeneratorKind::LeadTail => self.lead_tail,
        };
        if w.is_finite() && w > 0.0 { w } else { 0.0 }
    }

    /// Draw a generator from the normalized cumulative distribution; uniform
    /// when every weight is zero.
    pub fn choose(&self, rng: &mut StepRng) -> GeneratorKind {
        let total: f64 = GeneratorKind::ALL.iter().map(|&k| self.weight(k)).sum();
        if total <= 0.0 {
            return GeneratorKind::ALL[rng.range_usize(0, GeneratorKind::ALL.len())];
        }
        let r = rng.next_f64() * total;
        let mut cumulative = 0.0;
        for kind in GeneratorKind::ALL {
            let w = self.weight(kind);
            cumulative += w;
            if w > 0.0 && r < cumulative {
                return kind;
            }
        }
        // Floating-point rounding can leave r at the very top; take the last
        // generator that has any weight.
        GeneratorKind::ALL
            .into_iter()
            .rev()
            .find(|&k| self.weight(k) > 0.0)
            .unwrap_or(GeneratorKind::Euclidean)
    }
}

/// Metadata for one voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Step count of the voice's pattern.
    pub length: usize,
    /// Absolute pitch the scale intervals are measured from.
    pub base_note: Pitch,
    /// Inclusive pitch bounds for every note the voice plays.
    pub pitch_range: PitchRange,
    /// Target fraction of steps carrying a pitch, in [0, 1].
    pub density: f64,
    pub generation_mode: GenerationMode,
    pub pattern_weights: PatternWeights,
    /// Overrides each generator's default timing model when set.
    pub timing: Option<TimingMode>,
    /// Euclidean timing only: maximum random pulse displacement in steps.
    pub jitter: usize,
    /// Lead-tail generator: trailing notes emitted after each lead note.
    pub tail_length: usize,
    /// Lead-tail generator: circularly shift the finished pattern by a
    /// random offset.
    pub phase_shift: bool,
    /// Muted voices are neither evolved nor considered by counterpoint.
    pub active: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            length: 16,
            base_note: 60,
            pitch_range: PitchRange::new(48, 72),
            density: 0.5,
            generation_mode: GenerationMode::Auto,
            pattern_weights: PatternWeights::default(),
            timing: None,
            jitter: 0,
            tail_length: 2,
            phase_shift: false,
            active: true,
        }
    }
}

impl VoiceConfig {
    pub fn range(&self) -> PitchRange {
        self.pitch_range
    }

    pub fn is_locked(&self) -> bool {
        self.generation_mode == GenerationMode::Locked
    }

    /// Check the data-model invariants: length in bounds, min <= max,
    /// density a finite value in [0, 1].
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&self.length) {
            return Err(EngineError::InvalidLength {
                length: self.length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        if !self.pitch_range.is_valid() {
            return Err(EngineError::InvalidPitchRange {
                min: self.pitch_range.min,
                max: self.pitch_range.max,
            });
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(EngineError::InvalidDensity(self.density));
        }
        if self.tail_length > MAX_TAIL_LENGTH {
            return Err(EngineError::InvalidTailLength {
                tail_length: self.tail_length,
                max: MAX_TAIL_LENGTH,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(VoiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_metadata() {
        let bad_length = VoiceConfig {
            length: 0,
            ..Default::default()
        };
        assert!(matches!(
            bad_length.validate(),
            Err(EngineError::InvalidLength { length: 0, .. })
        ));

        let bad_range = VoiceConfig {
            pitch_range: PitchRange::new(72, 48),
            ..Default::default()
        };
        assert!(matches!(
            bad_range.validate(),
            Err(EngineError::InvalidPitchRange { .. })
        ));

        let bad_density = VoiceConfig {
            density: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            bad_density.validate(),
            Err(EngineError::InvalidDensity(_))
        ));

        let bad_tail = VoiceConfig {
            tail_length: usize::MAX / 2,
            ..Default::default()
        };
        assert!(matches!(
            bad_tail.validate(),
            Err(EngineError::InvalidTailLength { .. })
        ));
    }

    #[test]
    fn test_weights_only_always_chooses_that_kind() {
        let mut rng = StepRng::new(4);
        for kind in GeneratorKind::ALL {
            let w = PatternWeights::only(kind);
            for _ in 0..200 {
                assert_eq!(w.choose(&mut rng), kind);
            }
        }
    }

    #[test]
    fn test_all_zero_weights_fall_back_to_uniform() {
        let w = PatternWeights {
            euclidean: 0.0,
            random: -3.0,
            lead_tail: f64::NAN,
        };
        let mut rng = StepRng::new(10);
        let mut seen = [0usize; 3];
        for _ in 0..3000 {
            let idx = GeneratorKind::ALL
                .iter()
                .position(|&k| k == w.choose(&mut rng))
                .unwrap();
            seen[idx] += 1;
        }
        for count in seen {
            assert!(count > 800, "uniform fallback skewed: {seen:?}");
        }
    }

    #[test]
    fn test_weights_are_proportional() {
        let w = PatternWeights {
            euclidean: 3.0,
            random: 1.0,
            lead_tail: 0.0,
        };
        let mut rng = StepRng::new(77);
        let n = 8000;
        let euclid = (0..n)
            .filter(|_| w.choose(&mut rng) == GeneratorKind::Euclidean)
            .count();
        let frac = euclid as f64 / n as f64;
        assert!((0.70..0.80).contains(&frac), "euclidean share {frac}");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VoiceConfig =
            serde_json::from_str(r#"{"length": 32, "generation_mode": "locked"}"#).unwrap();
        assert_eq!(config.length, 32);
        assert!(config.is_locked());
        assert_eq!(config.base_note, 60);
        assert_eq!(config.tail_length, 2);
    }
}
