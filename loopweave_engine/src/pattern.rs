// The step pattern: one voice's loop as a fixed-length row of slots.
//
// Each slot holds an absolute pitch or a rest. A pattern is created wholesale
// by a generator, replaced wholesale on regeneration, edited slot by slot by
// the mutation engine, and discarded when its voice changes length. Playback
// only ever reads it.
//
// Invariant (checked by `conforms_to`, maintained by every writer in this
// crate): every present pitch lies inside the voice's pitch range and is
// scale-conformant relative to the voice's base note.

use crate::candidates::PitchRange;
use crate::scale::{Pitch, Scale, pitch_name};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pattern {
    slots: Vec<Option<Pitch>>,
}

impl Pattern {
    /// An all-rest pattern of the given length.
    pub fn rests(length: usize) -> Self {
        Pattern {
            slots: vec![None; length],
        }
    }

    pub fn from_slots(slots: Vec<Option<Pitch>>) -> Self {
        Pattern { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<Pitch>] {
        &self.slots
    }

    /// Pitch at `step`, or `None` for a rest or an out-of-bounds step.
    pub fn get(&self, step: usize) -> Option<Pitch> {
        self.slots.get(step).copied().flatten()
    }

    /// Write a pitch. Out-of-bounds steps are ignored.
    pub fn set(&mut self, step: usize, pitch: Pitch) {
        if let Some(slot) = self.slots.get_mut(step) {
            *slot = Some(pitch);
        }
    }

    pub fn clear(&mut self, step: usize) {
        if let Some(slot) = self.slots.get_mut(step) {
            *slot = None;
        }
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn active_steps(&self) -> Vec<usize> {
        self.steps_where(true)
    }

    pub fn inactive_steps(&self) -> Vec<usize> {
        self.steps_where(false)
    }

    fn steps_where(&self, active: bool) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some() == active)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_silent(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Fraction of steps holding a pitch. 0.0 for an empty pattern.
    pub fn density(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.active_count() as f64 / self.slots.len() as f64
        }
    }

    /// Circularly shift every slot `by` steps later.
    pub fn rotate_right(&mut self, by: usize) {
        if !self.slots.is_empty() {
            let by = by % self.slots.len();
            self.slots.rotate_right(by);
        }
    }

    /// True when every present pitch is in range and in scale.
    pub fn conforms_to(&self, scale: &Scale, base: Pitch, range: PitchRange) -> bool {
        self.slots
            .iter()
            .flatten()
            .all(|&p| range.contains(p) && scale.contains(p, base))
    }

    /// Compact one-line rendering: note names for pitches, `.` for rests,
    /// `|` every `group` steps.
    pub fn summary(&self, group: usize) -> String {
        let mut out = String::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if group > 0 && i > 0 && i % group == 0 {
                out.push('|');
            } else if i > 0 {
                out.push(' ');
            }
            match slot {
                Some(p) => out.push_str(&pitch_name(*p)),
                None => out.push('.'),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleKind;

    #[test]
    fn test_rests_and_counts() {
        let mut p = Pattern::rests(8);
        assert_eq!(p.len(), 8);
        assert!(p.is_silent());
        p.set(1, 60);
        p.set(5, 67);
        p.set(99, 70); // ignored
        assert_eq!(p.active_count(), 2);
        assert_eq!(p.active_steps(), vec![1, 5]);
        assert_eq!(p.inactive_steps(), vec![0, 2, 3, 4, 6, 7]);
        assert_eq!(p.get(5), Some(67));
        assert_eq!(p.get(99), None);
        assert!((p.density() - 0.25).abs() < 1e-9);
        p.clear(1);
        assert_eq!(p.active_steps(), vec![5]);
    }

    #[test]
    fn test_rotate_right() {
        let mut p = Pattern::from_slots(vec![Some(60), None, None, Some(64)]);
        p.rotate_right(5);
        assert_eq!(p.slots(), &[Some(64), Some(60), None, None]);
    }

    #[test]
    fn test_conforms_to() {
        let major = Scale::from_kind(ScaleKind::Major);
        let range = PitchRange::new(48, 72);
        let ok = Pattern::from_slots(vec![Some(60), None, Some(71)]);
        assert!(ok.conforms_to(&major, 60, range));
        let out_of_scale = Pattern::from_slots(vec![Some(61)]);
        assert!(!out_of_scale.conforms_to(&major, 60, range));
        let out_of_range = Pattern::from_slots(vec![Some(74)]);
        assert!(!out_of_range.conforms_to(&major, 60, range));
    }

    #[test]
    fn test_summary() {
        let p = Pattern::from_slots(vec![Some(60), None, Some(62), None, Some(64)]);
        assert_eq!(p.summary(4), "C4 . D4 .|E4");
    }
}
