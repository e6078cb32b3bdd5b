//! The `Subsystem` trait and the context every adapter runs in.

use amb_arbiter::OwnershipArbiter;
use amb_core::{EntityHandle, IncidentId, OwnerId, SimClock, Tick, Vec3};
use amb_incident::{IncidentEngine, IncidentObserver};
use amb_placement::PlacementValidator;
use amb_world::World;

use crate::AdapterResult;

/// Borrowed view of the shared state handed to a subsystem for one update.
///
/// Every mutation of a world entity must be preceded by a successful
/// [`OwnershipArbiter::try_acquire`] (or `try_acquire_all`) under the
/// subsystem's own [`OwnerId`].
pub struct AdapterCtx<'a, W: World + ?Sized> {
    pub clock:     &'a SimClock,
    pub world:     &'a mut W,
    pub arbiter:   &'a mut OwnershipArbiter,
    pub engine:    &'a mut IncidentEngine,
    pub placement: &'a PlacementValidator,
    pub observer:  &'a mut dyn IncidentObserver,
}

impl<W: World + ?Sized> AdapterCtx<'_, W> {
    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Where the player is and which way they face (their vehicle's heading
    /// while seated).
    pub fn player_anchor(&self) -> Option<(Vec3, f32)> {
        let player = self.world.player()?;
        let body = self.world.player_vehicle().unwrap_or(player);
        let position = self.world.position(body)?;
        let heading = self.world.heading(body).unwrap_or(0.0);
        Some((position, heading))
    }

    /// The player or the vehicle they sit in.  Never acquired.
    pub fn is_player(&self, handle: EntityHandle) -> bool {
        self.world.player() == Some(handle) || self.world.player_vehicle() == Some(handle)
    }

    /// Alive, not the player, unclaimed and not cast in any incident.
    pub fn is_free(&self, handle: EntityHandle) -> bool {
        self.world.exists(handle)
            && self.world.is_alive(handle)
            && !self.is_player(handle)
            && !self.arbiter.is_locked(handle)
            && self.engine.involving(handle).is_none()
    }

    /// Incidents started by `owner` that are still running.
    pub fn active_for(&self, owner: &OwnerId) -> usize {
        self.engine.iter().filter(|i| &i.owner == owner).count()
    }

    /// Give back `held` and let the host cull `spawned`.
    ///
    /// Handles that are members of a running incident started by `owner`
    /// stay held; that incident still needs them.
    pub fn abandon(&mut self, owner: &OwnerId, held: &[EntityHandle], spawned: &[EntityHandle]) {
        for &h in held {
            if !self.engine.iter().any(|i| &i.owner == owner && i.involves(h)) {
                self.arbiter.release_if_owned(h, owner);
            }
        }
        for &h in spawned {
            self.world.mark_non_essential(h);
        }
    }
}

/// An independently scheduled caller of the arbiter and the incident engine.
///
/// Subsystems are peers: none may assume another has run before it in the
/// same tick, and none may assume an ownership record survives between two
/// of its own updates.
pub trait Subsystem<W: World + ?Sized> {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Identity used for every ownership record this subsystem holds.
    fn owner(&self) -> &OwnerId;

    /// Run every this many ticks.
    fn interval_ticks(&self) -> u64;

    /// One scheduled update.  Returns the incidents it started.
    fn update(&mut self, ctx: &mut AdapterCtx<'_, W>) -> AdapterResult<Vec<IncidentId>>;

    /// Hand back anything held outside the incident engine.
    ///
    /// Default: nothing is held between updates.
    fn shutdown(&mut self, _ctx: &mut AdapterCtx<'_, W>) {}
}
