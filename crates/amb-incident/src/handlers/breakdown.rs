//! Stalled car: the driver inspects, then waits for the player to repair
//! it, call a tow truck or offer a ride.

use amb_core::{EntityHandle, Vec3};
use amb_placement::ExclusionSet;
use amb_world::{AgentRole, Directive, Directives, InteractionKind, Seat, VehicleModel, World};

use crate::script::{Crew, dispatch, ensure_near, ensure_on_foot, ensure_seated, need};
use crate::{BreakdownPhase, Incident, IncidentError, IncidentResult, Interaction, PhaseCtx, Role, Step};

use BreakdownPhase::*;

type Out = IncidentResult<Step<BreakdownPhase>>;

// One-shot slots.
const LOOK:      u32 = 0;
const WAVE:      u32 = 1;
const CALL_OUT:  u32 = 2;
const DRIVE_OFF: u32 = 3;
const HITCH:     u32 = 4;
const THANK:     u32 = 5;
const HOOK:      u32 = 6;

/// Follow distance for a passenger walking behind the player.
const FOLLOW_GAP: f32 = 2.0;
/// Below this speed the player's vehicle counts as stopped.
const STOPPED_MPS: f32 = 1.0;

pub(super) fn step<W: World + ?Sized>(phase: BreakdownPhase, inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    match phase {
        Inspecting                => inspecting(inc, ctx),
        Diagnosing                => diagnosing(inc, ctx),
        Repairing                 => repairing(inc, ctx),
        Departing                 => departing(inc, ctx),
        TowCalled                 => tow_called(inc, ctx),
        TowEnRoute                => tow_en_route(inc, ctx),
        TowArrived                => tow_arrived(inc, ctx),
        Loading                   => loading(inc, ctx),
        TowDeparting              => tow_departing(inc, ctx),
        RideOffered               => ride_offered(inc, ctx),
        FollowingOnFoot           => following(inc, ctx),
        BoardingVehicle           => boarding(inc, ctx),
        TransportingToDestination => transporting(inc, ctx),
        Dropoff                   => dropoff(inc, ctx),
        Terminal                  => Ok(Step::Stay),
    }
}

/// Point just in front of the car's bonnet.
fn hood<W: World + ?Sized>(ctx: &PhaseCtx<'_, W>, car: EntityHandle) -> IncidentResult<Vec3> {
    let heading = ctx.world.heading(car).unwrap_or(0.0);
    Ok(ctx.position_of(car)?.offset_polar(heading, 3.0))
}

// ── Roadside ──────────────────────────────────────────────────────────────────

fn inspecting<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;
    let car = need(inc, Role::Car)?;

    let dwell = inc.dwell(ctx.config.inspect_secs);
    if inc.phase_secs(ctx.clock) >= dwell {
        return Ok(Step::Advance(Diagnosing));
    }
    if !inc.done(LOOK) {
        let front = hood(ctx, car)?;
        if ensure_near(inc, ctx, driver, front)? {
            ctx.world.play_interaction(driver, InteractionKind::InspectEngine)?;
            inc.mark(LOOK);
        }
    }
    Ok(Step::Stay)
}

fn diagnosing<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;

    if !inc.done(CALL_OUT) {
        ctx.advise("A stranded motorist is waving for help");
        inc.mark(CALL_OUT);
    }

    match inc.take_interaction() {
        Some(Interaction::Repair) => return Ok(Step::Advance(Repairing)),
        Some(Interaction::CallServices) => {
            inc.flags.services_called = true;
            return Ok(Step::Advance(TowCalled));
        }
        Some(Interaction::OfferRide) => match ctx.world.player_vehicle() {
            Some(v) => {
                inc.flags.ride_accepted = true;
                inc.ride_vehicle = Some(v);
                return Ok(Step::Advance(RideOffered));
            }
            None => ctx.advise("You need a vehicle to offer a ride"),
        },
        None => {}
    }

    if !inc.done(WAVE) && ensure_on_foot(ctx.world, driver)? {
        ctx.world.play_interaction(driver, InteractionKind::Wave)?;
        inc.mark(WAVE);
    }
    Ok(Step::Stay)
}

fn repairing<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    if inc.phase_secs(ctx.clock) >= ctx.config.repair_secs {
        inc.flags.is_repaired = true;
        ctx.advise("The engine turns over");
        return Ok(Step::Advance(Departing));
    }
    Ok(Step::Stay)
}

fn departing<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;
    let car = need(inc, Role::Car)?;

    if !inc.done(DRIVE_OFF) {
        if !ensure_seated(inc, ctx, driver, car, Seat::Driver)? {
            return Ok(Step::Stay);
        }
        ctx.world.wander(driver)?;
        inc.mark(DRIVE_OFF);
        inc.start_anchor(ctx.now());
    }
    if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= ctx.config.departure_secs) {
        return Ok(Step::Advance(Terminal));
    }
    Ok(Step::Stay)
}

// ── Tow branch ────────────────────────────────────────────────────────────────

fn tow_called<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    if inc.member(Role::TowTruck).is_none() {
        let crew = [Crew { role: AgentRole::Mechanic, member: Role::TowDriver, seat: Seat::Driver }];
        dispatch(inc, ctx, VehicleModel::TowTruck, Role::TowTruck, &crew)?;
        ctx.advise("A tow truck is on its way");
    }
    Ok(Step::Advance(TowEnRoute))
}

fn tow_en_route<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let truck = need(inc, Role::TowTruck)?;
    let mechanic = need(inc, Role::TowDriver)?;
    let car = need(inc, Role::Car)?;

    if ctx.distance(truck, car).is_some_and(|d| d <= ctx.config.arrival_distance) {
        return Ok(Step::Advance(TowArrived));
    }
    if !inc.done(DRIVE_OFF) {
        let stop = hood(ctx, car)?;
        let heading = ctx.world.heading(car).unwrap_or(0.0);
        ctx.world.drive_to(mechanic, stop.offset_polar(heading, 7.0), ctx.config.service_speed_mps)?;
        inc.mark(DRIVE_OFF);
    }
    Ok(Step::Stay)
}

fn tow_arrived<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let mechanic = need(inc, Role::TowDriver)?;
    let car = need(inc, Role::Car)?;

    let front = hood(ctx, car)?;
    if !ensure_near(inc, ctx, mechanic, front)? {
        return Ok(Step::Stay);
    }
    if !inc.done(HOOK) {
        ctx.world.play_interaction(mechanic, InteractionKind::HookUp)?;
        inc.mark(HOOK);
    }
    Ok(Step::Advance(Loading))
}

fn loading<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let truck = need(inc, Role::TowTruck)?;
    let mechanic = need(inc, Role::TowDriver)?;
    let driver = need(inc, Role::Driver)?;
    let car = need(inc, Role::Car)?;

    let dwell = inc.dwell(ctx.config.scene_secs);
    if inc.phase_secs(ctx.clock) < dwell {
        return Ok(Step::Stay);
    }
    if !inc.done(HITCH) {
        ctx.world.issue(truck, Directive::Tow { vehicle: car })?;
        inc.mark(HITCH);
    }
    let mechanic_in = ensure_seated(inc, ctx, mechanic, truck, Seat::Driver)?;
    let driver_in = ensure_seated(inc, ctx, driver, truck, Seat::Passenger)?;
    if mechanic_in && driver_in {
        return Ok(Step::Advance(TowDeparting));
    }
    Ok(Step::Stay)
}

fn tow_departing<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let mechanic = need(inc, Role::TowDriver)?;

    if !inc.done(DRIVE_OFF) {
        ctx.world.wander(mechanic)?;
        inc.mark(DRIVE_OFF);
        inc.start_anchor(ctx.now());
    }
    if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= ctx.config.departure_secs) {
        return Ok(Step::Advance(Terminal));
    }
    Ok(Step::Stay)
}

// ── Ride branch ───────────────────────────────────────────────────────────────

/// The player's vehicle, if it is still around.
fn ride<W: World + ?Sized>(inc: &Incident, ctx: &PhaseCtx<'_, W>) -> Option<EntityHandle> {
    inc.ride_vehicle.filter(|v| ctx.world.exists(*v))
}

fn ride_offered<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;

    if !inc.done(THANK) && ensure_on_foot(ctx.world, driver)? {
        ctx.world.play_interaction(driver, InteractionKind::Thank)?;
        ctx.advise("The motorist accepts a lift");
        inc.mark(THANK);
    }
    let dwell = inc.dwell(ctx.config.beat_secs);
    if inc.phase_secs(ctx.clock) >= dwell {
        return Ok(Step::Advance(FollowingOnFoot));
    }
    Ok(Step::Stay)
}

fn following<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;
    let (Some(player), Some(vehicle)) = (ctx.world.player(), ride(inc, ctx)) else {
        ctx.advise("The lift fell through");
        return Ok(Step::Advance(Terminal));
    };

    if ctx.distance(driver, vehicle).is_some_and(|d| d <= ctx.config.boarding_distance) {
        return Ok(Step::Advance(BoardingVehicle));
    }
    if ensure_on_foot(ctx.world, driver)? && inc.retry_due(driver, ctx.clock, ctx.config.board_retry_secs) {
        ctx.world.issue(driver, Directive::Follow { target: player, distance: FOLLOW_GAP })?;
    }
    Ok(Step::Stay)
}

fn boarding<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;
    let Some(vehicle) = ride(inc, ctx) else {
        ctx.advise("The lift fell through");
        return Ok(Step::Advance(Terminal));
    };

    if ensure_seated(inc, ctx, driver, vehicle, Seat::Passenger)? {
        return Ok(Step::Advance(TransportingToDestination));
    }
    Ok(Step::Stay)
}

fn transporting<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;
    let Some(vehicle) = ride(inc, ctx) else {
        ctx.advise("The lift fell through");
        return Ok(Step::Advance(Terminal));
    };

    let destination = match inc.destination {
        Some(d) => d,
        None => {
            let [lo, hi] = ctx.config.dropoff_distance;
            let hint = ctx.world.heading(vehicle).unwrap_or(0.0);
            let d = ctx
                .placement
                .find_position(&*ctx.world, inc.position, hint, lo, hi, &ExclusionSet::new())
                .ok_or(IncidentError::NoPlacement)?;
            inc.destination = Some(d);
            ctx.advise("Drop your passenger at the marked spot");
            d
        }
    };

    // A passenger who got out is sent back in rather than failing the ride.
    if !ensure_seated(inc, ctx, driver, vehicle, Seat::Passenger)? {
        return Ok(Step::Stay);
    }
    let arrived = ctx.position_of(vehicle)?.within_2d(destination, ctx.config.destination_radius);
    let stopped = ctx.world.speed(vehicle).is_some_and(|s| s < STOPPED_MPS);
    if arrived && stopped {
        return Ok(Step::Advance(Dropoff));
    }
    Ok(Step::Stay)
}

fn dropoff<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let driver = need(inc, Role::Driver)?;

    if !ensure_on_foot(ctx.world, driver)? {
        return Ok(Step::Stay);
    }
    if !inc.done(THANK) {
        ctx.world.play_interaction(driver, InteractionKind::Thank)?;
        inc.mark(THANK);
        inc.start_anchor(ctx.now());
    }
    let dwell = inc.dwell(ctx.config.beat_secs);
    if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= dwell) {
        ctx.world.wander(driver)?;
        return Ok(Step::Advance(Terminal));
    }
    Ok(Step::Stay)
}
