// Position selection: which steps of a pattern carry a pitch.
//
// Given a step count and a density, selects the set of "active" step indices
// under one of several timing models:
// - Euclidean: Bjorklund-style even pulse distribution (modulo rule)
// - Even: floor-spaced placement of round(length * density) pulses
// - Random: uniform sample without replacement of the same count
// - FillAll: every step, ordered by a back-and-forth sweep from the offset
// - Bernoulli: independent per-step trials
// - Poisson / Geometric: accumulated inter-arrival gaps
// - Markov: two-state silent/active chain, burstier than Bernoulli
//
// Every index is rotated by `start_offset` so a voice regenerated mid-loop
// keeps its phase against the host's step cursor. When a model yields no
// index and the caller disallows silence, the result falls back to the single
// step at `start_offset`.
//
// Pure aside from the `StepRng` draws. Consumed by every generator in
// `generators/`.

use loopweave_prng::StepRng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Persistence of the Markov model's current state, in [0, 1). 0 reduces the
/// chain to independent Bernoulli trials.
const MARKOV_STICKINESS: f64 = 0.5;

/// Timing model for position selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    Euclidean,
    Even,
    Random,
    FillAll,
    Bernoulli,
    Poisson,
    Geometric,
    Markov,
}

impl TimingMode {
    pub const ALL: [TimingMode; 8] = [
        TimingMode::Euclidean,
        TimingMode::Even,
        TimingMode::Random,
        TimingMode::FillAll,
        TimingMode::Bernoulli,
        TimingMode::Poisson,
        TimingMode::Geometric,
        TimingMode::Markov,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "euclidean" => Some(TimingMode::Euclidean),
            "even" => Some(TimingMode::Even),
            "random" => Some(TimingMode::Random),
            "fill_all" | "fillall" => Some(TimingMode::FillAll),
            "bernoulli" => Some(TimingMode::Bernoulli),
            "poisson" => Some(TimingMode::Poisson),
            "geometric" => Some(TimingMode::Geometric),
            "markov" => Some(TimingMode::Markov),
            _ => None,
        }
    }
}

/// Inputs to `select_positions`.
#[derive(Debug, Clone, Copy)]
pub struct PositionRequest {
    pub length: usize,
    /// Fraction of steps to activate; clamped to [0, 1].
    pub density: f64,
    pub mode: TimingMode,
    /// Phase rotation applied to every produced index.
    pub start_offset: usize,
    /// Euclidean only: maximum random displacement of each pulse, in steps.
    pub jitter: usize,
    /// When false, an empty selection falls back to `[start_offset % length]`.
    pub allow_zero: bool,
}

impl PositionRequest {
    pub fn new(length: usize, density: f64, mode: TimingMode) -> Self {
        PositionRequest {
            length,
            density,
            mode,
            start_offset: 0,
            jitter: 0,
            allow_zero: false,
        }
    }

    pub fn with_start_offset(mut self, start_offset: usize) -> Self {
        self.start_offset = start_offset;
        self
    }

    pub fn with_jitter(mut self, jitter: usize) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_allow_zero(mut self, allow_zero: bool) -> Self {
        self.allow_zero = allow_zero;
        self
    }
}

/// Clamp a density to [0, 1]; NaN counts as 0.
pub fn clamp_density(density: f64) -> f64 {
    if density.is_nan() {
        0.0
    } else {
        density.clamp(0.0, 1.0)
    }
}

/// Number of pulses for count-based modes: `round(length * density)`.
pub fn density_count(length: usize, density: f64) -> usize {
    ((length as f64 * clamp_density(density)).round() as usize).min(length)
}

/// Select the active step indices for a pattern.
///
/// Returns distinct indices in `[0, length)`, ascending, except for
/// `TimingMode::FillAll`, which returns every index in sweep order.
pub fn select_positions(req: &PositionRequest, rng: &mut StepRng) -> Vec<usize> {
    let length = req.length;
    if length == 0 {
        return Vec::new();
    }
    let density = clamp_density(req.density);
    let start = req.start_offset % length;

    let raw = match req.mode {
        TimingMode::Euclidean => {
            let pulses = euclidean(length, density_count(length, density));
            if req.jitter > 0 {
                jittered(&pulses, length, req.jitter, rng)
            } else {
                pulses
            }
        }
        TimingMode::Even => even(length, density_count(length, density)),
        TimingMode::Random => rng.sample_indices(length, density_count(length, density)),
        TimingMode::FillAll => {
            // Density is ignored, except that an explicitly allowed zero
            // density still means silence.
            if density == 0.0 && req.allow_zero {
                return Vec::new();
            }
            return boustrophedon(length, start);
        }
        TimingMode::Bernoulli => (0..length).filter(|_| rng.random_bool(density)).collect(),
        TimingMode::Poisson => {
            if density == 0.0 {
                Vec::new()
            } else {
                gap_positions(length, || {
                    (rng.exponential(density).round() as usize).max(1)
                })
            }
        }
        TimingMode::Geometric => {
            if density == 0.0 {
                Vec::new()
            } else {
                let cap = length as u64 + 1;
                gap_positions(length, || rng.geometric(density).min(cap) as usize)
            }
        }
        TimingMode::Markov => markov(length, density, rng),
    };

    if raw.is_empty() {
        if req.allow_zero {
            return Vec::new();
        }
        trace!(length, density, mode = ?req.mode, "empty selection, falling back to offset step");
        return vec![start];
    }

    let mut rotated: Vec<usize> = raw.into_iter().map(|i| (i + start) % length).collect();
    rotated.sort_unstable();
    rotated.dedup();
    rotated
}

/// Index `i` is a pulse iff `(i * count) mod length < count`.
fn euclidean(length: usize, count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    if count >= length {
        return (0..length).collect();
    }
    (0..length).filter(|&i| (i * count) % length < count).collect()
}

fn even(length: usize, count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    if count >= length {
        return (0..length).collect();
    }
    (0..count).map(|i| i * length / count).collect()
}

/// Displace each pulse by a random amount in `[-jitter, +jitter]` (mod
/// length). A displaced pulse landing on an occupied step probes forward to
/// the next free one, so the pulse count is unchanged.
fn jittered(pulses: &[usize], length: usize, jitter: usize, rng: &mut StepRng) -> Vec<usize> {
    let jitter = jitter.min(length) as i32;
    let mut taken = vec![false; length];
    let mut out = Vec::with_capacity(pulses.len());
    for &pulse in pulses {
        let offset = rng.range_i32_inclusive(-jitter, jitter);
        let mut idx = (pulse as i64 + offset as i64).rem_euclid(length as i64) as usize;
        while taken[idx] {
            idx = (idx + 1) % length;
        }
        taken[idx] = true;
        out.push(idx);
    }
    out
}

/// All indices, starting at `start`, sweeping up to the end, then back down
/// from `start - 1` to zero. One pass turns only once, at the top; the sweep
/// ends at index 0 and never reverses there.
fn boustrophedon(length: usize, start: usize) -> Vec<usize> {
    (start..length).chain((0..start).rev()).collect()
}

/// Accumulate inter-arrival gaps (each at least 1) from just before step 0.
fn gap_positions(length: usize, mut next_gap: impl FnMut() -> usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut pos = next_gap() - 1;
    while pos < length {
        out.push(pos);
        pos = pos.saturating_add(next_gap());
    }
    out
}

/// Two-state chain whose stationary probability of "active" equals
/// `density`; `MARKOV_STICKINESS` lengthens runs of either state.
fn markov(length: usize, density: f64, rng: &mut StepRng) -> Vec<usize> {
    let stay_active = density + (1.0 - density) * MARKOV_STICKINESS;
    let enter_active = density * (1.0 - MARKOV_STICKINESS);
    let mut active = rng.random_bool(density);
    let mut out = Vec::new();
    for i in 0..length {
        if active {
            out.push(i);
        }
        active = if active {
            rng.random_bool(stay_active)
        } else {
            rng.random_bool(enter_active)
        };
    }
    out
}
