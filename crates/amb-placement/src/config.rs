//! Placement search tuning.

use crate::{PlacementError, PlacementResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlacementConfig {
    /// Number of rings between the requested min and max distance.
    pub distance_steps: usize,

    /// Angular offsets (degrees) from the forward hint tried first.
    pub ahead_angles_deg: Vec<f32>,

    /// Step (degrees) of the full-circle fallback pass.
    pub fallback_angle_step_deg: f32,

    /// Hard cap on candidates probed per search.
    pub max_candidates: usize,

    /// Playable area: `|x|` and `|y|` must not exceed this.
    pub world_half_extent: f32,
    pub min_z: f32,
    pub max_z: f32,

    /// Ground closer than this to a water surface counts as submerged.
    pub submersion_tolerance: f32,

    /// A road-graph node within this radius corroborates the road probe.
    pub route_node_radius: f32,

    /// Without a positive road probe, a node must be this close; the
    /// candidate then snaps onto it.
    pub fallback_node_radius: f32,

    /// Any vehicle within this radius also corroborates the road probe.
    pub traffic_radius: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            distance_steps:          4,
            ahead_angles_deg:        vec![0.0, 15.0, -15.0, 30.0, -30.0, 45.0, -45.0],
            fallback_angle_step_deg: 45.0,
            max_candidates:          64,
            world_half_extent:       8_000.0,
            min_z:                   -50.0,
            max_z:                   1_500.0,
            submersion_tolerance:    1.0,
            route_node_radius:       12.0,
            fallback_node_radius:    6.0,
            traffic_radius:          25.0,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> PlacementResult<()> {
        if self.distance_steps == 0 {
            return Err(PlacementError::Config("distance_steps must be at least 1".into()));
        }
        if self.max_candidates == 0 {
            return Err(PlacementError::Config("max_candidates must be at least 1".into()));
        }
        if !(self.fallback_angle_step_deg > 0.0 && self.fallback_angle_step_deg <= 360.0) {
            return Err(PlacementError::Config("fallback_angle_step_deg must be in (0, 360]".into()));
        }
        if self.min_z >= self.max_z {
            return Err(PlacementError::Config(format!(
                "min_z {} must be below max_z {}", self.min_z, self.max_z
            )));
        }
        if self.world_half_extent <= 0.0 {
            return Err(PlacementError::Config("world_half_extent must be positive".into()));
        }
        Ok(())
    }
}
