// Counterpoint resolution between simultaneously sounding voices.
//
// Two voices must not sound the identical pitch on the same step. For a
// proposed pattern, each step's pitch is compared with what every other voice
// plays at that step; a collision is moved to the nearest in-scale, in-range
// pitch nobody else occupies, searching outward one scale degree at a time
// (upward first at each distance). If every candidate is taken the original
// pitch is kept: a doubled note is preferable to a dropped one.
//
// Voices of different lengths loop independently, so another voice's pitch
// at step `s` is read at `s % its_length`.
//
// The engine calls this only when counterpoint is enabled and passes a
// snapshot taken before any write of the current batch.

use crate::candidates::build_candidates;
use crate::pattern::Pattern;
use crate::scale::{Pitch, Scale};
use crate::voice::{VoiceConfig, VoiceId};
use tracing::debug;

/// Outcome of resolving one voice's pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveReport {
    pub pattern: Pattern,
    /// Steps whose pitch was moved to avoid a collision.
    pub moved: usize,
    /// Colliding steps left as they were because no free pitch existed.
    pub unresolved: usize,
}

/// Adjust `proposed` so it avoids every other voice's pitch at each step.
///
/// `others` may include `voice_id` itself; it is skipped. With no other
/// sounding voice the pattern is returned unchanged.
pub fn resolve(
    voice_id: VoiceId,
    proposed: &Pattern,
    others: &[(VoiceId, &Pattern)],
    scale: &Scale,
    voice: &VoiceConfig,
) -> ResolveReport {
    let others: Vec<&Pattern> = others
        .iter()
        .filter(|(id, p)| *id != voice_id && !p.is_silent())
        .map(|(_, p)| *p)
        .collect();

    let mut report = ResolveReport {
        pattern: proposed.clone(),
        moved: 0,
        unresolved: 0,
    };
    if others.is_empty() {
        return report;
    }

    let candidates = build_candidates(scale, voice.base_note, voice.pitch_range);
    let mut occupied: Vec<Pitch> = Vec::with_capacity(others.len());

    for step in 0..proposed.len() {
        let Some(pitch) = proposed.get(step) else {
            continue;
        };
        occupied.clear();
        occupied.extend(others.iter().filter_map(|p| p.get(step % p.len())));
        if !occupied.contains(&pitch) {
            continue;
        }
        match nearest_free(pitch, &candidates, &occupied) {
            Some(free) => {
                report.pattern.set(step, free);
                report.moved += 1;
            }
            None => {
                report.unresolved += 1;
            }
        }
    }

    if report.moved > 0 || report.unresolved > 0 {
        debug!(
            voice = %voice_id,
            moved = report.moved,
            unresolved = report.unresolved,
            "counterpoint collisions"
        );
    }
    report
}

/// Nearest candidate (by scale-degree distance) not in `occupied`.
fn nearest_free(pitch: Pitch, candidates: &[Pitch], occupied: &[Pitch]) -> Option<Pitch> {
    let n = candidates.len() as isize;
    // An in-scale pitch is its own centre; an off-scale one sits between two
    // candidates and both neighbours are distance zero.
    let (up, down) = match candidates.binary_search(&pitch) {
        Ok(i) => (i as isize + 1, i as isize - 1),
        Err(i) => (i as isize, i as isize - 1),
    };
    let free_at = |idx: isize| -> Option<Pitch> {
        if (0..n).contains(&idx) {
            let p = candidates[idx as usize];
            (!occupied.contains(&p)).then_some(p)
        } else {
            None
        }
    };
    for k in 0..n {
        if up + k >= n && down - k < 0 {
            break;
        }
        if let Some(p) = free_at(up + k).or_else(|| free_at(down - k)) {
            return Some(p);
        }
    }
    None
}
