//! Deterministic per-incident and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each incident gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (incident_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive incident IDs uniformly across the seed space.
//! An incident's dwell jitter and branch choices therefore do not depend on
//! how many other incidents drew numbers before it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::IncidentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── IncidentRng ───────────────────────────────────────────────────────────────

/// Per-incident deterministic RNG, owned by the incident it drives.
pub struct IncidentRng(SmallRng);

impl IncidentRng {
    /// Seed deterministically from the run's global seed and an incident ID.
    pub fn new(global_seed: u64, incident: IncidentId) -> Self {
        let seed = global_seed ^ (incident.0 as u64).wrapping_mul(MIXING_CONSTANT);
        IncidentRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform sample in `[lo, hi]`; returns `lo` when the range is empty.
    pub fn between(&mut self, lo: f32, hi: f32) -> f32 {
        if hi > lo { self.0.gen_range(lo..=hi) } else { lo }
    }
}

impl std::fmt::Debug for IncidentRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IncidentRng")
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for adapter decisions (spawn chances, kind picks).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` for stream `offset`.  Each adapter gets its
    /// own stream, so adding one does not perturb another's draws.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
