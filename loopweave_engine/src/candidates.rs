// Candidate pitch set construction.
//
// Given a scale, a base note and an inclusive pitch range, enumerates every
// scale-conformant pitch inside the range across all octaves that can
// intersect it. The result is the pitch vocabulary every generator, the
// mutation engine and the counterpoint resolver draw from.
//
// The set is derived and ephemeral: recomputed per call, never stored.

use crate::scale::{Pitch, Scale};
use serde::{Deserialize, Serialize};

/// Inclusive pitch bounds for a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchRange {
    pub min: Pitch,
    pub max: Pitch,
}

impl PitchRange {
    pub const fn new(min: Pitch, max: Pitch) -> Self {
        PitchRange { min, max }
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        (self.min..=self.max).contains(&pitch)
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// Every pitch `base + interval + 12k` inside `range`, sorted ascending.
///
/// Empty when the range is inverted or too narrow to hold any scale tone;
/// callers treat that as "emit rests only".
pub fn build_candidates(scale: &Scale, base: Pitch, range: PitchRange) -> Vec<Pitch> {
    if !range.is_valid() {
        return Vec::new();
    }
    // Octaves whose span [base + 12k, base + 12k + 11] can touch the range.
    let low_octave = (range.min - base - 11).div_euclid(12);
    let high_octave = (range.max - base).div_euclid(12);

    let mut out = Vec::new();
    for k in low_octave..=high_octave {
        for &interval in scale.intervals() {
            let pitch = base + interval as Pitch + 12 * k;
            if range.contains(pitch) {
                out.push(pitch);
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}
