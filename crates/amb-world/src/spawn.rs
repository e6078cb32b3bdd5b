//! Entity creation and release.

use amb_core::{EntityHandle, Vec3};

use crate::{Seat, WorldResult};

/// Vehicle models an incident may ask the host to create.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleModel {
    Civilian,
    TowTruck,
    Ambulance,
    Police,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentRole {
    Civilian,
    Mechanic,
    Medic,
    Officer,
}

/// Creates entities and hands them back to population management.
pub trait EntitySpawner {
    fn spawn_vehicle(&mut self, model: VehicleModel, position: Vec3, heading: f32)
        -> WorldResult<EntityHandle>;

    fn spawn_agent(&mut self, role: AgentRole, position: Vec3) -> WorldResult<EntityHandle>;

    /// Spawn an agent already seated in `vehicle`.
    fn spawn_agent_in_vehicle(&mut self, role: AgentRole, vehicle: EntityHandle, seat: Seat)
        -> WorldResult<EntityHandle>;

    /// Clear every protection flag so the host may recycle the entity.
    /// A no-op for handles that no longer resolve.
    fn mark_non_essential(&mut self, entity: EntityHandle);
}
