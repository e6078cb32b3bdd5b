//! Top-level configuration for a director run.

use amb_adapters::AdapterConfig;
use amb_arbiter::ArbiterConfig;
use amb_core::SimClock;
use amb_incident::IncidentConfig;
use amb_placement::PlacementConfig;

use crate::{DirectorError, DirectorResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockConfig {
    /// Simulated milliseconds per tick.  Default: 100 (10 Hz).
    pub tick_duration_ms: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_duration_ms: 100 }
    }
}

impl ClockConfig {
    /// A clock at tick zero with this tick length.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration_ms)
    }
}

/// Everything a [`Director`](crate::Director) needs, in one tree.
///
/// Every section falls back to its defaults, so a config file only lists
/// what it changes:
///
/// ```json
/// { "seed": 7, "incidents": { "max_age_secs": 300 } }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AmbientConfig {
    /// Master seed.  The same seed over the same world replays the same run.
    pub seed:      u64,
    pub clock:     ClockConfig,
    pub arbiter:   ArbiterConfig,
    pub placement: PlacementConfig,
    pub incidents: IncidentConfig,
    pub adapters:  AdapterConfig,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            seed:      0x5EED,
            clock:     ClockConfig::default(),
            arbiter:   ArbiterConfig::default(),
            placement: PlacementConfig::default(),
            incidents: IncidentConfig::default(),
            adapters:  AdapterConfig::default(),
        }
    }
}

impl AmbientConfig {
    pub fn validate(&self) -> DirectorResult<()> {
        if self.clock.tick_duration_ms == 0 {
            return Err(DirectorError::Config("tick_duration_ms must be at least 1".into()));
        }
        self.arbiter.validate()?;
        self.placement.validate()?;
        self.incidents.validate()?;
        self.adapters.validate()?;
        Ok(())
    }
}
