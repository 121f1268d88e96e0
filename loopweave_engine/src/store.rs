// The shared pattern store: one config and one pattern per voice.
//
// The engine never writes to the store directly. Every generation or
// evolution call borrows the store immutably, computes new patterns, and
// returns them as a `Batch`; the host applies the batch with `commit`. While
// the engine holds its shared borrow nothing can write, so every voice in a
// tick is computed (and counterpoint-resolved) against the same pre-batch
// state, and a reader sees either all of a batch or none of it.
//
// Patterns are replaced wholesale on commit. Playback reads go through
// `read_step`, which never mutates.
//
// BTreeMap keyed by `VoiceId` keeps iteration (and therefore RNG draw
// order) deterministic.

use crate::error::{EngineError, Result};
use crate::pattern::Pattern;
use crate::scale::Pitch;
use crate::voice::{VoiceConfig, VoiceId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One voice's state in the store.
#[derive(Debug, Clone)]
pub struct VoiceSlot {
    pub config: VoiceConfig,
    pub pattern: Pattern,
}

/// A set of whole-pattern writes to apply as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    writes: Vec<(VoiceId, Pattern)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write. A later write to the same voice replaces the earlier
    /// one.
    pub fn push(&mut self, voice: VoiceId, pattern: Pattern) {
        if let Some(existing) = self.writes.iter_mut().find(|(id, _)| *id == voice) {
            existing.1 = pattern;
        } else {
            self.writes.push((voice, pattern));
        }
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn get(&self, voice: VoiceId) -> Option<&Pattern> {
        self.writes.iter().find(|(id, _)| *id == voice).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoiceId, &Pattern)> {
        self.writes.iter().map(|(id, p)| (*id, p))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    voices: BTreeMap<VoiceId, VoiceSlot>,
    next_id: u32,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a voice with an all-rest pattern of its length.
    pub fn add_voice(&mut self, config: VoiceConfig) -> Result<VoiceId> {
        config.validate()?;
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        let pattern = Pattern::rests(config.length);
        self.voices.insert(id, VoiceSlot { config, pattern });
        Ok(id)
    }

    pub fn remove_voice(&mut self, id: VoiceId) -> Option<VoiceSlot> {
        self.voices.remove(&id)
    }

    /// Replace a voice's metadata. A length change discards the pattern
    /// (it becomes all rests at the new length).
    pub fn reconfigure(&mut self, id: VoiceId, config: VoiceConfig) -> Result<()> {
        config.validate()?;
        let slot = self.voices.get_mut(&id).ok_or(EngineError::UnknownVoice(id))?;
        if slot.config.length != config.length {
            debug!(voice = %id, from = slot.config.length, to = config.length, "length changed, pattern discarded");
            slot.pattern = Pattern::rests(config.length);
        }
        slot.config = config;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voice_ids(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.voices.keys().copied()
    }

    pub fn slot(&self, id: VoiceId) -> Option<&VoiceSlot> {
        self.voices.get(&id)
    }

    pub fn config(&self, id: VoiceId) -> Option<&VoiceConfig> {
        self.voices.get(&id).map(|s| &s.config)
    }

    pub fn pattern(&self, id: VoiceId) -> Option<&Pattern> {
        self.voices.get(&id).map(|s| &s.pattern)
    }

    /// Playback read: the pitch a voice plays at a global step, looping the
    /// pattern. `None` for a rest, an unknown voice, or an empty pattern.
    pub fn read_step(&self, id: VoiceId, step: usize) -> Option<Pitch> {
        let pattern = self.pattern(id)?;
        if pattern.is_empty() {
            return None;
        }
        pattern.get(step % pattern.len())
    }

    /// Active voices whose pattern holds at least one note.
    pub fn sounding(&self) -> Vec<(VoiceId, &Pattern)> {
        self.voices
            .iter()
            .filter(|(_, s)| s.config.active && !s.pattern.is_silent())
            .map(|(id, s)| (*id, &s.pattern))
            .collect()
    }

    /// Apply every write in the batch. Writes for unknown voices, or whose
    /// length no longer matches the voice (reconfigured since the batch was
    /// computed), are skipped. Returns the number of writes applied.
    pub fn commit(&mut self, batch: Batch) -> usize {
        let mut applied = 0;
        for (id, pattern) in batch.writes {
            let Some(slot) = self.voices.get_mut(&id) else {
                warn!(voice = %id, "batch write for unknown voice skipped");
                continue;
            };
            if pattern.len() != slot.config.length {
                warn!(
                    voice = %id,
                    expected = slot.config.length,
                    got = pattern.len(),
                    "stale batch write skipped"
                );
                continue;
            }
            slot.pattern = pattern;
            applied += 1;
        }
        applied
    }
}
