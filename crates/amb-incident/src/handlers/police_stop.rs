//! A patrol car pulls a motorist over.  Questioning ends in a ticket, an
//! arrest, or the driver bolting and a short pursuit.

use amb_world::{Directive, Directives, InteractionKind, Seat, World};

use crate::script::{ensure_near, ensure_on_foot, ensure_seated, need};
use crate::{Incident, IncidentResult, PhaseCtx, PoliceStopPhase, Role, Step};

use PoliceStopPhase::*;

type Out = IncidentResult<Step<PoliceStopPhase>>;

const HALT:  u32 = 0;
const PULL:  u32 = 1;
const TALK:  u32 = 2;
const CUFF:  u32 = 3;
const FLEE:  u32 = 4;
const LEAVE: u32 = 5;

/// The cruiser parks this far behind the stopped car.
const PARK_GAP: f32 = 8.0;
/// The cruiser counts as parked within this distance of the stopped car.
const PARKED_WITHIN: f32 = 12.0;
/// Cumulative outcome odds after questioning: ticket, then arrest, else flight.
const P_TICKET: f32 = 0.6;
const P_ARREST: f32 = 0.85;
/// Seconds between pursuit route updates.
const PURSUIT_REPLAN_SECS: f32 = 2.0;

pub(super) fn step<W: World + ?Sized>(phase: PoliceStopPhase, inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let officer = need(inc, Role::Officer)?;
    let cruiser = need(inc, Role::Cruiser)?;
    let suspect = need(inc, Role::Suspect)?;
    let car = need(inc, Role::SuspectVehicle)?;

    match phase {
        Stopping => {
            if !inc.done(HALT) {
                ctx.world.issue(car, Directive::ClearTasks)?;
                inc.mark(HALT);
            }
            if !inc.done(PULL) {
                let heading = ctx.world.heading(car).unwrap_or(0.0);
                let behind = ctx.position_of(car)?.offset_polar(heading + 180.0, PARK_GAP);
                ctx.world.drive_to(officer, behind, ctx.config.service_speed_mps)?;
                inc.mark(PULL);
            }
            if ctx.distance(cruiser, car).is_some_and(|d| d <= PARKED_WITHIN) {
                return Ok(Step::Advance(OfficerApproaching));
            }
            Ok(Step::Stay)
        }

        OfficerApproaching => {
            let heading = ctx.world.heading(car).unwrap_or(0.0);
            let window = ctx.position_of(car)?.offset_polar(heading - 90.0, 2.0);
            if ensure_near(inc, ctx, officer, window)? {
                return Ok(Step::Advance(Questioning));
            }
            Ok(Step::Stay)
        }

        Questioning => {
            if !inc.done(TALK) && ensure_on_foot(ctx.world, officer)? {
                ctx.world.play_interaction(officer, InteractionKind::Talk)?;
                inc.mark(TALK);
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.phase_secs(ctx.clock) < dwell {
                return Ok(Step::Stay);
            }
            let roll = inc.rng.between(0.0, 1.0);
            Ok(Step::Advance(if roll < P_TICKET {
                Citing
            } else if roll < P_ARREST {
                Arresting
            } else {
                SuspectFleeing
            }))
        }

        Citing => {
            if !inc.done(TALK) {
                ctx.world.play_interaction(officer, InteractionKind::WriteTicket)?;
                inc.mark(TALK);
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(Dispersing));
            }
            Ok(Step::Stay)
        }

        Arresting => {
            if !ensure_on_foot(ctx.world, suspect)? {
                return Ok(Step::Stay);
            }
            if !inc.done(CUFF) {
                ctx.world.play_interaction(officer, InteractionKind::Cuff)?;
                inc.mark(CUFF);
                inc.start_anchor(ctx.now());
            }
            let dwell = inc.dwell(ctx.config.beat_secs);
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= dwell) {
                return Ok(Step::Advance(Escorting));
            }
            Ok(Step::Stay)
        }

        Escorting => {
            let suspect_in = ensure_seated(inc, ctx, suspect, cruiser, Seat::RearRight)?;
            let officer_in = ensure_seated(inc, ctx, officer, cruiser, Seat::Driver)?;
            if suspect_in && officer_in {
                ctx.advise("The driver has been taken into custody");
                return Ok(Step::Advance(Dispersing));
            }
            Ok(Step::Stay)
        }

        SuspectFleeing => {
            if !inc.done(FLEE) {
                ctx.world.flee_from(suspect, officer)?;
                ctx.advise("The driver is making a run for it");
                inc.mark(FLEE);
            }
            if ensure_seated(inc, ctx, officer, cruiser, Seat::Driver)? {
                return Ok(Step::Advance(Pursuit));
            }
            Ok(Step::Stay)
        }

        Pursuit => {
            let chase = inc.dwell([ctx.config.chase_timeout_secs * 0.5, ctx.config.chase_timeout_secs * 0.8]);
            if inc.phase_secs(ctx.clock) >= chase {
                return Ok(Step::Advance(Dispersing));
            }
            if inc.retry_due(officer, ctx.clock, PURSUIT_REPLAN_SECS) {
                let target = ctx.position_of(car)?;
                ctx.world.drive_to(officer, target, ctx.config.service_speed_mps)?;
            }
            Ok(Step::Stay)
        }

        Dispersing => {
            if !inc.done(LEAVE) {
                let officer_in = ensure_seated(inc, ctx, officer, cruiser, Seat::Driver)?;
                let in_custody = ctx.world.vehicle_of(suspect) == Some(cruiser);
                let suspect_in = in_custody || ensure_seated(inc, ctx, suspect, car, Seat::Driver)?;
                if !(officer_in && suspect_in) {
                    return Ok(Step::Stay);
                }
                ctx.world.wander(officer)?;
                if !in_custody {
                    ctx.world.wander(suspect)?;
                }
                inc.mark(LEAVE);
                inc.start_anchor(ctx.now());
            }
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= ctx.config.departure_secs) {
                return Ok(Step::Advance(Terminal));
            }
            Ok(Step::Stay)
        }

        Terminal => Ok(Step::Stay),
    }
}
