//! Per-adapter tuning.
//!
//! Priorities order the adapters against each other in the arbiter: a
//! collision outranks a scripted encounter, which outranks a traffic nudge.

use crate::{AdapterError, AdapterResult};

// ── Traffic blockage ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlockageConfig {
    pub enabled:            bool,
    pub interval_ticks:     u64,
    pub priority:           i32,
    /// Vehicles farther than this from the player are ignored.
    pub scan_radius:        f32,
    /// At or below this speed (m/s) a vehicle counts as stopped.
    pub stopped_speed:      f32,
    /// How long a vehicle must sit still on a route before it is nudged.
    pub stall_secs:         f32,
    /// How far ahead the stalled vehicle is sent.
    pub nudge_distance:     f32,
    pub nudge_speed_mps:    f32,
    /// Ownership is handed back after this long even if the vehicle has
    /// not cleared the spot.
    pub nudge_timeout_secs: f32,
    /// Concurrent nudges.
    pub max_nudges:         usize,
}

impl Default for BlockageConfig {
    fn default() -> Self {
        Self {
            enabled:            true,
            interval_ticks:     5,
            priority:           1,
            scan_radius:        120.0,
            stopped_speed:      0.5,
            stall_secs:         8.0,
            nudge_distance:     25.0,
            nudge_speed_mps:    6.0,
            nudge_timeout_secs: 15.0,
            max_nudges:         3,
        }
    }
}

// ── Collisions ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollisionConfig {
    pub enabled:           bool,
    pub interval_ticks:    u64,
    pub priority:          i32,
    /// Active accidents above which new collisions are ignored.
    pub max_active:        usize,
    /// How long a collision that could not become an incident yet (crowded
    /// spot, contested entities) is retried before it is dropped.
    pub retry_window_secs: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled:           true,
            interval_ticks:    1,
            priority:          20,
            max_active:        2,
            retry_window_secs: 10.0,
        }
    }
}

// ── Spontaneous encounters ────────────────────────────────────────────────────

/// Relative odds of each encounter kind.  Zero disables a kind.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncounterWeights {
    pub breakdown:   u32,
    pub police_stop: u32,
    pub paramedics:  u32,
    pub altercation: u32,
}

impl Default for EncounterWeights {
    fn default() -> Self {
        Self { breakdown: 4, police_stop: 2, paramedics: 1, altercation: 2 }
    }
}

impl EncounterWeights {
    pub fn total(&self) -> u32 {
        self.breakdown + self.police_stop + self.paramedics + self.altercation
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncounterConfig {
    pub enabled:        bool,
    pub interval_ticks: u64,
    pub priority:       i32,
    /// Chance of starting an encounter on each run.
    pub spawn_chance:   f64,
    /// Encounters of this generator alive at once.
    pub max_active:     usize,
    /// Distance band from the player in which encounters are placed.
    pub min_distance:   f32,
    pub max_distance:   f32,
    /// Existing pedestrians this close to the chosen spot are cast before
    /// anyone is spawned.
    pub recruit_radius: f32,
    /// A police cruiser pulls in this far behind the stopped vehicle.
    pub cruiser_gap:    f32,
    pub weights:        EncounterWeights,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            enabled:        true,
            interval_ticks: 50,
            priority:       5,
            spawn_chance:   0.3,
            max_active:     3,
            min_distance:   80.0,
            max_distance:   180.0,
            recruit_radius: 25.0,
            cruiser_gap:    12.0,
            weights:        EncounterWeights::default(),
        }
    }
}

// ── Aggregate ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdapterConfig {
    pub blockage:   BlockageConfig,
    pub collisions: CollisionConfig,
    pub encounters: EncounterConfig,
}

impl AdapterConfig {
    pub fn validate(&self) -> AdapterResult<()> {
        let b = &self.blockage;
        if b.interval_ticks == 0 || self.collisions.interval_ticks == 0 || self.encounters.interval_ticks == 0 {
            return Err(AdapterError::Config("interval_ticks must be at least 1".into()));
        }
        if b.scan_radius <= 0.0 || b.nudge_distance <= 0.0 || b.nudge_speed_mps <= 0.0 {
            return Err(AdapterError::Config("blockage radii and speeds must be positive".into()));
        }
        if b.stall_secs < 0.0 || b.nudge_timeout_secs <= 0.0 {
            return Err(AdapterError::Config("blockage timings must be positive".into()));
        }
        if self.collisions.retry_window_secs < 0.0 {
            return Err(AdapterError::Config("retry_window_secs must not be negative".into()));
        }
        let e = &self.encounters;
        if !(0.0..=1.0).contains(&e.spawn_chance) {
            return Err(AdapterError::Config(format!("spawn_chance {} is not a probability", e.spawn_chance)));
        }
        if e.min_distance < 0.0 || e.max_distance < e.min_distance {
            return Err(AdapterError::Config(format!(
                "encounter distance band [{}, {}] is empty", e.min_distance, e.max_distance
            )));
        }
        if e.enabled && e.weights.total() == 0 {
            return Err(AdapterError::Config("every encounter weight is zero".into()));
        }
        Ok(())
    }
}
