// Scale definitions and scale-degree pitch arithmetic.
//
// A `Scale` is an ordered, deduplicated set of pitch-class intervals (0-11)
// measured from a voice's base note. Every pitch the engine writes must be
// congruent, modulo 12, to one of these intervals relative to the base note.
//
// This module provides:
// - Named presets (`ScaleKind`) for the usual modes and pentatonics
// - Membership checks relative to a base note
// - Scale-degree navigation with octave carry, used by mutation (transpose
//   by degree) and counterpoint (search outward by degree)
// - Octave folding of out-of-range pitches back into a pitch range
//
// The scale is always passed in explicitly by the caller; there is no
// ambient "current scale". A global scale change is the host's business.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Absolute pitch number (MIDI-style: 60 = middle C).
pub type Pitch = i32;

/// Named scale presets. Interval patterns are measured from the tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
    WholeTone,
    Chromatic,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 14] = [
        ScaleKind::Major,
        ScaleKind::NaturalMinor,
        ScaleKind::HarmonicMinor,
        ScaleKind::MelodicMinor,
        ScaleKind::Dorian,
        ScaleKind::Phrygian,
        ScaleKind::Lydian,
        ScaleKind::Mixolydian,
        ScaleKind::Locrian,
        ScaleKind::MajorPentatonic,
        ScaleKind::MinorPentatonic,
        ScaleKind::Blues,
        ScaleKind::WholeTone,
        ScaleKind::Chromatic,
    ];

    /// Semitone intervals from the tonic, ascending.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleKind::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleKind::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleKind::MinorPentatonic => &[0, 3, 5, 7, 10],
            ScaleKind::Blues => &[0, 3, 5, 6, 7, 10],
            ScaleKind::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleKind::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::NaturalMinor => "natural_minor",
            ScaleKind::HarmonicMinor => "harmonic_minor",
            ScaleKind::MelodicMinor => "melodic_minor",
            ScaleKind::Dorian => "dorian",
            ScaleKind::Phrygian => "phrygian",
            ScaleKind::Lydian => "lydian",
            ScaleKind::Mixolydian => "mixolydian",
            ScaleKind::Locrian => "locrian",
            ScaleKind::MajorPentatonic => "major_pentatonic",
            ScaleKind::MinorPentatonic => "minor_pentatonic",
            ScaleKind::Blues => "blues",
            ScaleKind::WholeTone => "whole_tone",
            ScaleKind::Chromatic => "chromatic",
        }
    }

    /// Look up a preset by name. Accepts a few common aliases
    /// ("ionian", "minor", "aeolian").
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase().replace(['-', ' '], "_");
        match lowered.as_str() {
            "ionian" => return Some(ScaleKind::Major),
            "minor" | "aeolian" => return Some(ScaleKind::NaturalMinor),
            _ => {}
        }
        ScaleKind::ALL.into_iter().find(|k| k.name() == lowered)
    }
}

/// A validated set of pitch-class intervals.
///
/// Invariant: non-empty, strictly ascending, every value in 0..=11.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Scale {
    intervals: Vec<u8>,
}

impl Scale {
    /// Build a scale from arbitrary intervals; sorts and deduplicates.
    pub fn new(intervals: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut intervals: Vec<u8> = intervals.into_iter().collect();
        if intervals.is_empty() {
            return Err(EngineError::InvalidScale {
                reason: "no intervals".into(),
            });
        }
        if let Some(&bad) = intervals.iter().find(|&&iv| iv > 11) {
            return Err(EngineError::InvalidScale {
                reason: format!("interval {bad} is outside 0..=11"),
            });
        }
        intervals.sort_unstable();
        intervals.dedup();
        Ok(Scale { intervals })
    }

    pub fn from_kind(kind: ScaleKind) -> Self {
        Scale {
            intervals: kind.intervals().to_vec(),
        }
    }

    /// Resolve a preset by name.
    pub fn named(name: &str) -> Result<Self> {
        ScaleKind::from_name(name)
            .map(Scale::from_kind)
            .ok_or_else(|| EngineError::UnknownScale(name.to_string()))
    }

    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }

    /// Number of degrees per octave.
    pub fn degree_count(&self) -> usize {
        self.intervals.len()
    }

    /// Check whether `pitch` is scale-conformant relative to `base`.
    pub fn contains(&self, pitch: Pitch, base: Pitch) -> bool {
        let pc = (pitch - base).rem_euclid(12) as u8;
        self.intervals.binary_search(&pc).is_ok()
    }

    /// Decompose a pitch into (octave, degree) relative to `base`, or `None`
    /// if the pitch is not in the scale. Octave 0 spans `base..base + 12`.
    pub fn degree_of(&self, pitch: Pitch, base: Pitch) -> Option<(i32, usize)> {
        let offset = pitch - base;
        let pc = offset.rem_euclid(12) as u8;
        let degree = self.intervals.binary_search(&pc).ok()?;
        Some((offset.div_euclid(12), degree))
    }

    /// Pitch of `degree` in `octave` relative to `base`. Degrees outside
    /// 0..degree_count carry into neighbouring octaves.
    pub fn pitch_at(&self, base: Pitch, octave: i32, degree: i32) -> Pitch {
        let n = self.intervals.len() as i32;
        let octave = octave + degree.div_euclid(n);
        let degree = degree.rem_euclid(n) as usize;
        base + octave * 12 + self.intervals[degree] as Pitch
    }

    /// Move an in-scale pitch by `delta` scale degrees (not semitones).
    /// Returns `None` if `pitch` is not in the scale.
    pub fn step_degrees(&self, pitch: Pitch, base: Pitch, delta: i32) -> Option<Pitch> {
        let (octave, degree) = self.degree_of(pitch, base)?;
        Some(self.pitch_at(base, octave, degree as i32 + delta))
    }
}

impl TryFrom<Vec<u8>> for Scale {
    type Error = EngineError;

    fn try_from(intervals: Vec<u8>) -> Result<Self> {
        Scale::new(intervals)
    }
}

impl From<Scale> for Vec<u8> {
    fn from(scale: Scale) -> Self {
        scale.intervals
    }
}

/// Shift `pitch` by whole octaves until it lies in `[min, max]`.
///
/// Returns `None` when no octave transposition of the pitch fits, which
/// happens when the range is narrower than an octave. The pitch class is
/// always preserved, never clamped.
pub fn fold_into_range(pitch: Pitch, min: Pitch, max: Pitch) -> Option<Pitch> {
    let mut p = pitch;
    if p > max {
        p -= (p - max + 11) / 12 * 12;
    } else if p < min {
        p += (min - p + 11) / 12 * 12;
    }
    (min..=max).contains(&p).then_some(p)
}

/// Compact note name for a pitch (e.g. "C4", "F#3"). Middle C (60) is C4.
pub fn pitch_name(pitch: Pitch) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
    ];
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", NAMES[pitch.rem_euclid(12) as usize], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_dedups() {
        let scale = Scale::new([7, 0, 4, 4, 0]).unwrap();
        assert_eq!(scale.intervals(), &[0, 4, 7]);
    }

    #[test]
    fn test_new_rejects_empty_and_out_of_range() {
        assert!(matches!(
            Scale::new(Vec::<u8>::new()),
            Err(EngineError::InvalidScale { .. })
        ));
        assert!(matches!(
            Scale::new([0, 12]),
            Err(EngineError::InvalidScale { .. })
        ));
    }

    #[test]
    fn test_named_lookup() {
        assert_eq!(Scale::named("Major").unwrap().intervals(), &[0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(Scale::named("aeolian").unwrap(), Scale::from_kind(ScaleKind::NaturalMinor));
        assert_eq!(
            Scale::named("minor pentatonic").unwrap(),
            Scale::from_kind(ScaleKind::MinorPentatonic)
        );
        assert!(matches!(Scale::named("nope"), Err(EngineError::UnknownScale(_))));
    }

    #[test]
    fn test_contains_relative_to_base() {
        let major = Scale::from_kind(ScaleKind::Major);
        // D major: D=62 base.
        assert!(major.contains(62, 62));
        assert!(major.contains(66, 62)); // F#
        assert!(!major.contains(65, 62)); // F natural
        assert!(major.contains(50, 62)); // D an octave below
    }

    #[test]
    fn test_degree_navigation_carries_octaves() {
        let major = Scale::from_kind(ScaleKind::Major);
        // B (71) up one degree from base 60 is C5 (72).
        assert_eq!(major.step_degrees(71, 60, 1), Some(72));
        // C (60) down one degree is B3 (59).
        assert_eq!(major.step_degrees(60, 60, -1), Some(59));
        // E (64) up two degrees is G (67).
        assert_eq!(major.step_degrees(64, 60, 2), Some(67));
        // Out-of-scale pitch cannot be stepped.
        assert_eq!(major.step_degrees(61, 60, 1), None);
    }

    #[test]
    fn test_degree_of_below_base() {
        let major = Scale::from_kind(ScaleKind::Major);
        assert_eq!(major.degree_of(59, 60), Some((-1, 6)));
        assert_eq!(major.pitch_at(60, -1, 6), 59);
    }

    #[test]
    fn test_fold_into_range() {
        assert_eq!(fold_into_range(74, 48, 72), Some(62));
        assert_eq!(fold_into_range(40, 48, 72), Some(52));
        assert_eq!(fold_into_range(60, 48, 72), Some(60));
        // Range narrower than an octave may not host the pitch class.
        assert_eq!(fold_into_range(61, 62, 64), None);
    }

    #[test]
    fn test_pitch_name() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(66), "F#4");
        assert_eq!(pitch_name(47), "B2");
    }

    #[test]
    fn test_scale_serde_validates() {
        let scale: Scale = serde_json::from_str("[9, 0, 4]").unwrap();
        assert_eq!(scale.intervals(), &[0, 4, 9]);
        assert!(serde_json::from_str::<Scale>("[]").is_err());
    }
}
