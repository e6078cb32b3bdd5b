//! The World Query Service: read-only questions about the host world.

use amb_core::{EntityHandle, EntityKind, Vec3};

/// Read-only adapter over the host simulation.
///
/// Every answer is a snapshot; handles returned here may stop resolving on
/// the very next tick.  Callers re-check [`exists`](Self::exists) before
/// acting on a handle they kept around.
pub trait WorldQuery {
    // ── Entity state ──────────────────────────────────────────────────────

    /// `true` while the handle still resolves to a world object.
    fn exists(&self, entity: EntityHandle) -> bool;

    /// `true` if the entity exists and is not dead or wrecked.
    fn is_alive(&self, entity: EntityHandle) -> bool;

    fn kind(&self, entity: EntityHandle) -> Option<EntityKind>;

    fn position(&self, entity: EntityHandle) -> Option<Vec3>;

    /// Compass heading in degrees.
    fn heading(&self, entity: EntityHandle) -> Option<f32>;

    /// Current speed in m/s.
    fn speed(&self, entity: EntityHandle) -> Option<f32>;

    /// The vehicle an agent is seated in, if any.
    fn vehicle_of(&self, agent: EntityHandle) -> Option<EntityHandle>;

    /// The agent in a vehicle's driver seat, if any.
    fn driver_of(&self, vehicle: EntityHandle) -> Option<EntityHandle>;

    /// `true` while the entity is in a transition that must not be
    /// interrupted (getting in or out of a seat).
    fn is_busy(&self, entity: EntityHandle) -> bool;

    // ── Player ────────────────────────────────────────────────────────────

    /// The player's agent.  Never owned by the engine.
    fn player(&self) -> Option<EntityHandle>;

    fn player_vehicle(&self) -> Option<EntityHandle> {
        self.player().and_then(|p| self.vehicle_of(p))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Agents within `radius` metres (planar), nearest first.
    fn nearby_agents(&self, position: Vec3, radius: f32) -> Vec<EntityHandle>;

    /// Vehicles within `radius` metres (planar), nearest first.
    fn nearby_vehicles(&self, position: Vec3, radius: f32) -> Vec<EntityHandle>;

    /// Height of the walkable surface under `position`, if there is one.
    fn ground_height(&self, position: Vec3) -> Option<f32>;

    /// Height of the water surface at `position`, if any water is there.
    fn water_height(&self, position: Vec3) -> Option<f32>;

    fn is_submerged(&self, position: Vec3) -> bool {
        self.water_height(position).is_some_and(|w| position.z < w)
    }

    /// Direct "is this a road" probe.  Unreliable near intersections.
    fn is_on_route(&self, position: Vec3) -> bool;

    /// Closest road-graph node within `radius`, if any.
    fn nearest_route_node(&self, position: Vec3, radius: f32) -> Option<Vec3>;

    /// Vehicle pairs that collided since the previous host update.
    fn recent_collisions(&self) -> Vec<(EntityHandle, EntityHandle)>;
}
