//! Arbiter tuning.

use crate::{ArbiterError, ArbiterResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArbiterConfig {
    /// Priority used by [`try_acquire_default`](crate::OwnershipArbiter::try_acquire_default).
    pub default_priority: i32,

    /// Maximum records examined per [`sweep`](crate::OwnershipArbiter::sweep).
    pub sweep_batch: usize,

    /// Ticks between sweeps when driven by the director.
    pub sweep_interval_ticks: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            default_priority:     0,
            sweep_batch:          16,
            sweep_interval_ticks: 50,
        }
    }
}

impl ArbiterConfig {
    pub fn validate(&self) -> ArbiterResult<()> {
        if self.sweep_batch == 0 {
            return Err(ArbiterError::Config("sweep_batch must be at least 1".into()));
        }
        if self.sweep_interval_ticks == 0 {
            return Err(ArbiterError::Config("sweep_interval_ticks must be at least 1".into()));
        }
        Ok(())
    }
}
