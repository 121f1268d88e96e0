// Euclidean-placement generator.
//
// Pulses come from the position engine (Euclidean timing unless the voice
// overrides it). Pitches come from a cursor over the sorted candidate list:
// it starts at a random index and advances 1-3 places (wrapping) after each
// pulse, so consecutive notes stay close and the line reads as a contour
// rather than independent random picks.

use super::{GenerationRequest, GeneratorKind, place, select_for};
use crate::pattern::Pattern;
use crate::scale::Pitch;
use loopweave_prng::StepRng;

/// Largest cursor advance between consecutive pulses.
const MAX_CURSOR_STEP: usize = 3;

pub(super) fn generate(
    req: &GenerationRequest<'_>,
    candidates: &[Pitch],
    rng: &mut StepRng,
) -> Pattern {
    let positions = select_for(GeneratorKind::Euclidean, req, rng);
    let n = candidates.len();
    let mut cursor = rng.range_usize(0, n);
    let mut pitches = Vec::with_capacity(positions.len());
    for _ in &positions {
        pitches.push(candidates[cursor]);
        cursor = (cursor + rng.range_usize_inclusive(1, MAX_CURSOR_STEP)) % n;
    }
    place(req.voice.length, &positions, pitches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::build_candidates;
    use crate::scale::{Scale, ScaleKind};
    use crate::voice::VoiceConfig;

    #[test]
    fn test_consecutive_pulses_move_by_small_cursor_steps() {
        let scale = Scale::from_kind(ScaleKind::Major);
        let voice = VoiceConfig {
            length: 32,
            density: 1.0,
            ..Default::default()
        };
        let candidates = build_candidates(&scale, voice.base_note, voice.pitch_range);
        let n = candidates.len();
        for seed in 0..50 {
            let mut rng = StepRng::new(seed);
            let p = generate(&GenerationRequest::new(&voice, &scale), &candidates, &mut rng);
            let idx: Vec<usize> = p
                .slots()
                .iter()
                .flatten()
                .map(|pitch| candidates.iter().position(|c| c == pitch).unwrap())
                .collect();
            assert_eq!(idx.len(), 32);
            for w in idx.windows(2) {
                let advance = (w[1] + n - w[0]) % n;
                assert!((1..=MAX_CURSOR_STEP).contains(&advance), "advance {advance}");
            }
        }
    }

    #[test]
    fn test_single_candidate() {
        let scale = Scale::from_kind(ScaleKind::Major);
        let voice = VoiceConfig {
            length: 8,
            density: 0.5,
            ..Default::default()
        };
        let mut rng = StepRng::new(9);
        let p = generate(&GenerationRequest::new(&voice, &scale), &[64], &mut rng);
        assert_eq!(p.active_steps(), vec![0, 2, 4, 6]);
        assert!(p.slots().iter().flatten().all(|&pitch| pitch == 64));
    }
}
