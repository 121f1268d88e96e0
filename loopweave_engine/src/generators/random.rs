// Random-placement generator.
//
// Positions default to a uniform random sample. Pitches are chosen for
// coverage: with no more positions than candidates they are spread evenly
// across the sorted candidate list (from a random starting phase), otherwise
// the full list is cycled as many times as needed. The i-th active step gets
// the i-th pitch, so the line follows candidate order.

use super::{GenerationRequest, GeneratorKind, place, select_for};
use crate::pattern::Pattern;
use crate::scale::Pitch;
use loopweave_prng::StepRng;

pub(super) fn generate(
    req: &GenerationRequest<'_>,
    candidates: &[Pitch],
    rng: &mut StepRng,
) -> Pattern {
    let positions = select_for(GeneratorKind::Random, req, rng);
    let pitches = spread_pitches(candidates, positions.len(), rng);
    place(req.voice.length, &positions, pitches)
}

/// `count` pitches covering the whole candidate list.
fn spread_pitches(candidates: &[Pitch], count: usize, rng: &mut StepRng) -> Vec<Pitch> {
    let n = candidates.len();
    if count == 0 || n == 0 {
        return Vec::new();
    }
    if count <= n {
        // floor(i * n / count) + phase stays below n for phase < n / count.
        let phase = rng.range_usize(0, n / count);
        (0..count).map(|i| candidates[i * n / count + phase]).collect()
    } else {
        (0..count).map(|i| candidates[i % n]).collect()
    }
}
