//! Incident timing and distances.
//!
//! All durations are simulated seconds; the engine converts them through
//! the director's `SimClock`.  Two-element arrays are `[min, max]` ranges
//! that each incident samples from its own RNG stream.

use crate::{IncidentError, IncidentResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IncidentConfig {
    /// Hard cap on incident lifetime.  Exceeding it tears the incident down
    /// regardless of phase.
    pub max_age_secs: f32,

    /// No two incidents may start within this distance of each other.
    pub exclusion_radius: f32,

    // ── Dwell ranges ─────────────────────────────────────────────────────
    /// How long a stranded driver looks under the hood.
    pub inspect_secs: [f32; 2],

    /// Generic beat length (questioning, arguing, treating, loading).
    pub scene_secs: [f32; 2],

    /// Short reaction beat (collapse, thanks, drop-off).
    pub beat_secs: [f32; 2],

    // ── Phase limits ─────────────────────────────────────────────────────
    /// How long an incident waits for the player to interact.
    pub interaction_window_secs: f32,

    /// Time the player's roadside repair takes.
    pub repair_secs: f32,

    /// Maximum time to get a service vehicle spawned.
    pub spawn_timeout_secs: f32,

    /// Maximum time a service vehicle may take to reach the scene.
    pub service_timeout_secs: f32,

    /// Maximum time for someone to walk up to a target on foot.
    pub approach_timeout_secs: f32,

    /// Maximum time spent getting people into vehicles.
    pub boarding_timeout_secs: f32,

    /// Interval between re-issued boarding orders.
    pub board_retry_secs: f32,

    /// Maximum time a passenger follows the player on foot.
    pub follow_timeout_secs: f32,

    /// Maximum time the player has to deliver a passenger.
    pub transport_timeout_secs: f32,

    /// How long departing vehicles are kept before release.
    pub departure_secs: f32,

    /// Maximum length of any chase.
    pub chase_timeout_secs: f32,

    /// A collapsed pedestrian nobody helps recovers after this long.
    pub unattended_recovery_secs: f32,

    // ── Distances ────────────────────────────────────────────────────────
    /// Service vehicles spawn this far from the scene.
    pub service_spawn_distance: [f32; 2],

    /// Ride destinations are chosen this far from the pick-up.
    pub dropoff_distance: [f32; 2],

    /// A service vehicle counts as arrived within this distance.
    pub arrival_distance: f32,

    /// A follower must be this close to the player's vehicle to board it.
    pub boarding_distance: f32,

    /// The player's vehicle counts as at the destination within this radius.
    pub destination_radius: f32,

    /// Walking targets count as reached within this distance.
    pub reach_distance: f32,

    /// A fleeing victim who gets this far away has escaped.
    pub escape_distance: f32,

    /// Cruise speed for scripted service vehicles.
    pub service_speed_mps: f32,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            max_age_secs:             600.0,
            exclusion_radius:         60.0,
            inspect_secs:             [3.0, 10.0],
            scene_secs:               [5.0, 12.0],
            beat_secs:                [2.0, 4.0],
            interaction_window_secs:  300.0,
            repair_secs:              8.0,
            spawn_timeout_secs:       20.0,
            service_timeout_secs:     120.0,
            approach_timeout_secs:    45.0,
            boarding_timeout_secs:    30.0,
            board_retry_secs:         3.0,
            follow_timeout_secs:      90.0,
            transport_timeout_secs:   300.0,
            departure_secs:           15.0,
            chase_timeout_secs:       45.0,
            unattended_recovery_secs: 90.0,
            service_spawn_distance:   [80.0, 160.0],
            dropoff_distance:         [150.0, 400.0],
            arrival_distance:         15.0,
            boarding_distance:        5.0,
            destination_radius:       20.0,
            reach_distance:           3.0,
            escape_distance:          60.0,
            service_speed_mps:        14.0,
        }
    }
}

impl IncidentConfig {
    pub fn validate(&self) -> IncidentResult<()> {
        if self.max_age_secs <= 0.0 {
            return Err(IncidentError::Config("max_age_secs must be positive".into()));
        }
        if self.exclusion_radius < 0.0 {
            return Err(IncidentError::Config("exclusion_radius must not be negative".into()));
        }
        for (name, [lo, hi]) in [
            ("inspect_secs", self.inspect_secs),
            ("scene_secs", self.scene_secs),
            ("beat_secs", self.beat_secs),
            ("service_spawn_distance", self.service_spawn_distance),
            ("dropoff_distance", self.dropoff_distance),
        ] {
            if lo < 0.0 || hi < lo {
                return Err(IncidentError::Config(format!("{name} must be [min, max] with 0 <= min <= max")));
            }
        }
        if self.inspect_secs[1] >= self.max_age_secs {
            return Err(IncidentError::Config("inspect_secs must end before max_age_secs".into()));
        }
        if self.board_retry_secs <= 0.0 {
            return Err(IncidentError::Config("board_retry_secs must be positive".into()));
        }
        if self.service_speed_mps <= 0.0 {
            return Err(IncidentError::Config("service_speed_mps must be positive".into()));
        }
        Ok(())
    }
}
