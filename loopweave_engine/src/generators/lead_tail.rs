// Lead-tail scalar generator.
//
// A "lead" pointer walks the sorted candidate list with a step size and
// direction drawn once per call, bouncing off both ends of the list. At each
// stop it emits the lead pitch followed by up to `tail_length` trailing
// pitches at `lead - step * k`; a tail that would leave the list is cut
// short, never bounced. Lead+tail groups repeat until the stream covers the
// voice length.
//
// The stream is dense: one pitch per step. Position selection then decides
// which steps are audible, so density thins the line without changing its
// contour. With `phase_shift` set, the finished pattern is rotated by a
// random offset to decorrelate it from the global step clock.

use super::{GenerationRequest, GeneratorKind, select_for};
use crate::pattern::Pattern;
use crate::scale::Pitch;
use loopweave_prng::StepRng;

/// Largest lead step, in candidate-list places.
const MAX_LEAD_STEP: usize = 3;

pub(super) fn generate(
    req: &GenerationRequest<'_>,
    candidates: &[Pitch],
    rng: &mut StepRng,
) -> Pattern {
    let voice = req.voice;
    let stream = build_stream(candidates, voice.length, voice.tail_length, rng);
    let positions = select_for(GeneratorKind::LeadTail, req, rng);

    let mut pattern = Pattern::rests(voice.length);
    for step in positions {
        if let Some(&pitch) = stream.get(step) {
            pattern.set(step, pitch);
        }
    }
    if voice.phase_shift && voice.length > 1 {
        pattern.rotate_right(rng.range_usize(0, voice.length));
    }
    pattern
}

/// Dense scalar stream of exactly `length` pitches.
fn build_stream(
    candidates: &[Pitch],
    length: usize,
    tail_length: usize,
    rng: &mut StepRng,
) -> Vec<Pitch> {
    let n = candidates.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![candidates[0]; length];
    }

    // Tails stop at index 0, so none can outrun the list.
    let tail_length = tail_length.min(n - 1);
    let last = (n - 1) as isize;
    let step = rng.range_usize_inclusive(1, (n - 1).min(MAX_LEAD_STEP)) as isize;
    let mut dir: isize = if rng.random_bool(0.5) { 1 } else { -1 };
    let mut lead = rng.range_usize(0, n) as isize;

    let mut stream = Vec::with_capacity(length);
    while stream.len() < length {
        stream.push(candidates[lead as usize]);
        for k in 1..=tail_length as isize {
            let idx = lead - step * k;
            if idx < 0 {
                break;
            }
            stream.push(candidates[idx as usize]);
        }

        // step <= last, so one reflection always lands back inside the list.
        let mut next = lead + dir * step;
        if next > last {
            next = 2 * last - next;
            dir = -1;
        } else if next < 0 {
            next = -next;
            dir = 1;
        }
        lead = next;
    }
    stream.truncate(length);
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::build_candidates;
    use crate::scale::{Scale, ScaleKind};
    use crate::voice::VoiceConfig;

    #[test]
    fn test_stream_has_exact_length_and_stays_in_list() {
        let candidates: Vec<Pitch> = vec![60, 62, 64, 65, 67, 69, 71];
        for seed in 0..200 {
            let mut rng = StepRng::new(seed);
            let length = 1 + seed as usize % 40;
            let stream = build_stream(&candidates, length, (seed % 4) as usize, &mut rng);
            assert_eq!(stream.len(), length);
            assert!(stream.iter().all(|p| candidates.contains(p)));
        }
    }

    #[test]
    fn test_oversized_tail_is_clamped_to_list() {
        let candidates: Vec<Pitch> = vec![60, 62, 64, 65];
        let mut rng = StepRng::new(4);
        let stream = build_stream(&candidates, 12, usize::MAX / 2, &mut rng);
        assert_eq!(stream.len(), 12);
        assert!(stream.iter().all(|p| candidates.contains(p)));
    }

    #[test]
    fn test_oversized_tail_voice_emits_rests_not_panic() {
        let scale = Scale::from_kind(ScaleKind::Major);
        let voice = VoiceConfig {
            tail_length: usize::MAX / 2,
            ..Default::default()
        };
        let mut rng = StepRng::new(2);
        let pattern =
            GeneratorKind::LeadTail.generate(&GenerationRequest::new(&voice, &scale), &mut rng);
        assert_eq!(pattern, Pattern::rests(voice.length));
    }

    #[test]
    fn test_single_candidate_is_constant() {
        let mut rng = StepRng::new(1);
        assert_eq!(build_stream(&[67], 5, 3, &mut rng), vec![67; 5]);
    }

    #[test]
    fn test_no_tail_leads_move_by_fixed_step_with_bounce() {
        let candidates: Vec<Pitch> = (0..10).map(|i| 60 + i).collect();
        for seed in 0..50 {
            let mut rng = StepRng::new(seed);
            let stream = build_stream(&candidates, 40, 0, &mut rng);
            let moves: Vec<i32> = stream.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
            let step = moves[0];
            assert!((1..=MAX_LEAD_STEP as i32).contains(&step));
            // A bounce folds a move, so a move is either the step or shorter
            // (reflection off an end).
            assert!(moves.iter().all(|&m| m <= step), "{moves:?}");
        }
    }

    #[test]
    fn test_density_controls_audibility_not_contour() {
        let scale = Scale::from_kind(ScaleKind::Major);
        let dense = VoiceConfig {
            length: 16,
            density: 1.0,
            ..Default::default()
        };
        let sparse = VoiceConfig {
            density: 0.25,
            ..dense.clone()
        };
        let candidates = build_candidates(&scale, 60, dense.pitch_range);
        // Same seed, same stream: the sparse pattern's notes must match the
        // dense pattern at the same steps.
        let full = generate(
            &GenerationRequest::new(&dense, &scale),
            &candidates,
            &mut StepRng::new(33),
        );
        let thin = generate(
            &GenerationRequest::new(&sparse, &scale),
            &candidates,
            &mut StepRng::new(33),
        );
        assert_eq!(thin.active_count(), 4);
        for step in thin.active_steps() {
            assert_eq!(thin.get(step), full.get(step));
        }
    }

    #[test]
    fn test_phase_shift_preserves_notes() {
        let scale = Scale::from_kind(ScaleKind::Major);
        let voice = VoiceConfig {
            length: 16,
            density: 0.5,
            phase_shift: true,
            ..Default::default()
        };
        let candidates = build_candidates(&scale, 60, voice.pitch_range);
        for seed in 0..20 {
            let mut rng = StepRng::new(seed);
            let p = generate(&GenerationRequest::new(&voice, &scale), &candidates, &mut rng);
            assert_eq!(p.len(), 16);
            assert_eq!(p.active_count(), 8);
        }
    }
}
