//! Handler plumbing and choreography shared by every incident kind.

use tracing::{debug, warn};

use amb_arbiter::OwnershipArbiter;
use amb_core::{EntityHandle, EntityKind, SimClock, Tick, Vec3};
use amb_placement::{ExclusionSet, PlacementValidator};
use amb_world::{AgentRole, Directives, Protection, Seat, VehicleModel, World};

use crate::{Incident, IncidentConfig, IncidentError, IncidentResult, Role};

/// What a handler wants after one call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step<P> {
    /// Keep the current phase.
    Stay,
    /// Move to the given phase (must be a listed successor or terminal).
    Advance(P),
}

impl<P> Step<P> {
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Step<Q> {
        match self {
            Step::Stay       => Step::Stay,
            Step::Advance(p) => Step::Advance(f(p)),
        }
    }
}

/// Everything a phase handler may touch during one call.
pub struct PhaseCtx<'a, W: World + ?Sized> {
    pub clock:      &'a SimClock,
    pub world:      &'a mut W,
    pub arbiter:    &'a mut OwnershipArbiter,
    pub placement:  &'a PlacementValidator,
    pub config:     &'a IncidentConfig,
    pub advisories: Vec<String>,
}

impl<W: World + ?Sized> PhaseCtx<'_, W> {
    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Queue a player-facing message for the observer.
    pub fn advise(&mut self, message: impl Into<String>) {
        self.advisories.push(message.into());
    }

    pub fn distance(&self, a: EntityHandle, b: EntityHandle) -> Option<f32> {
        Some(self.world.position(a)?.distance_2d(self.world.position(b)?))
    }

    pub fn position_of(&self, h: EntityHandle) -> IncidentResult<Vec3> {
        self.world.position(h).ok_or(IncidentError::World(amb_world::WorldError::Missing(h)))
    }
}

/// The member playing `role`, or a `MissingRole` error.
pub(crate) fn need(inc: &Incident, role: Role) -> IncidentResult<EntityHandle> {
    inc.member(role).ok_or(IncidentError::MissingRole { kind: inc.kind, role })
}

// ── Posture ───────────────────────────────────────────────────────────────────

/// Get `agent` out of whatever vehicle it is in.  `Ok(true)` once standing
/// and free to take orders.
pub(crate) fn ensure_on_foot<W: World + ?Sized>(world: &mut W, agent: EntityHandle) -> IncidentResult<bool> {
    if world.is_busy(agent) {
        return Ok(false);
    }
    if world.vehicle_of(agent).is_some() {
        world.leave_vehicle(agent)?;
        return Ok(false);
    }
    Ok(true)
}

/// Get `agent` into `seat` of `vehicle`.  `Ok(true)` once seated.
///
/// The boarding order is re-issued every `board_retry_secs` for as long as
/// the agent is outside and free, so an agent that gets out again or
/// loses its path simply boards again.
pub(crate) fn ensure_seated<W: World + ?Sized>(
    inc:     &mut Incident,
    ctx:     &mut PhaseCtx<'_, W>,
    agent:   EntityHandle,
    vehicle: EntityHandle,
    seat:    Seat,
) -> IncidentResult<bool> {
    match ctx.world.vehicle_of(agent) {
        Some(v) if v == vehicle => return Ok(true),
        _ if ctx.world.is_busy(agent) => return Ok(false),
        Some(_) => {
            ctx.world.leave_vehicle(agent)?;
            return Ok(false);
        }
        None => {}
    }
    if inc.retry_due(agent, ctx.clock, ctx.config.board_retry_secs) {
        ctx.world.enter_vehicle(agent, vehicle, seat)?;
    }
    Ok(false)
}

/// Walk `agent` to `target`, getting out of any vehicle first and
/// re-issuing the order periodically.  `Ok(true)` once standing within
/// `reach_distance`.
pub(crate) fn ensure_near<W: World + ?Sized>(
    inc:    &mut Incident,
    ctx:    &mut PhaseCtx<'_, W>,
    agent:  EntityHandle,
    target: Vec3,
) -> IncidentResult<bool> {
    if !ensure_on_foot(ctx.world, agent)? {
        return Ok(false);
    }
    if ctx.position_of(agent)?.within_2d(target, ctx.config.reach_distance) {
        return Ok(true);
    }
    if inc.retry_due(agent, ctx.clock, ctx.config.board_retry_secs) {
        ctx.world.move_to(agent, target)?;
    }
    Ok(false)
}

// ── Services ──────────────────────────────────────────────────────────────────

/// A crew member to seat in a dispatched vehicle.
pub(crate) struct Crew {
    pub role:      AgentRole,
    pub member:    Role,
    pub seat:      Seat,
}

/// Spawn a service vehicle with its crew on a road near the incident,
/// acquire everything under the incident's owner and enlist it.
///
/// On any failure the already-spawned entities are handed back to the host
/// and nothing is enlisted.
pub(crate) fn dispatch<W: World + ?Sized>(
    inc:     &mut Incident,
    ctx:     &mut PhaseCtx<'_, W>,
    model:   VehicleModel,
    as_role: Role,
    crew:    &[Crew],
) -> IncidentResult<EntityHandle> {
    let [lo, hi] = ctx.config.service_spawn_distance;
    // Arrive from behind the scene, along whatever the members are facing.
    let hint = scene_heading(inc, ctx) + 180.0;
    let spot = ctx
        .placement
        .find_position(&*ctx.world, inc.position, hint, lo, hi, &ExclusionSet::new())
        .ok_or(IncidentError::NoPlacement)?;

    let vehicle = ctx.world.spawn_vehicle(model, spot, spot.heading_to(inc.position))?;
    let mut spawned = vec![vehicle];
    for c in crew {
        match ctx.world.spawn_agent_in_vehicle(c.role, vehicle, c.seat) {
            Ok(h) => spawned.push(h),
            Err(e) => {
                abandon(ctx.world, &spawned);
                return Err(e.into());
            }
        }
    }

    if !ctx.arbiter.try_acquire_all(&*ctx.world, &spawned, &inc.owner, inc.priority, ctx.now()) {
        abandon(ctx.world, &spawned);
        return Err(IncidentError::AcquisitionFailed(vehicle));
    }

    inc.enlist(as_role, vehicle, EntityKind::Vehicle);
    for (c, h) in crew.iter().zip(&spawned[1..]) {
        inc.enlist(c.member, *h, EntityKind::Agent);
    }
    for h in &spawned {
        if let Err(e) = ctx.world.set_protection_flags(*h, Protection::SCRIPTED) {
            warn!(incident = %inc.id, entity = %h, error = %e, "could not protect dispatched entity");
        }
    }
    debug!(incident = %inc.id, ?model, %vehicle, position = %spot, "service dispatched");
    Ok(vehicle)
}

/// Heading of the first member vehicle, else of the first member at all.
pub(crate) fn scene_heading<W: World + ?Sized>(inc: &Incident, ctx: &PhaseCtx<'_, W>) -> f32 {
    inc.vehicles()
        .into_iter()
        .chain(inc.participants())
        .find_map(|h| ctx.world.heading(h))
        .unwrap_or(0.0)
}

fn abandon<W: World + ?Sized>(world: &mut W, spawned: &[EntityHandle]) {
    for h in spawned {
        world.mark_non_essential(*h);
    }
}
