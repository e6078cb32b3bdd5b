//! A pedestrian collapses.  If the player calls it in, an ambulance crew
//! treats and collects them; otherwise they eventually get back up.

use amb_core::EntityHandle;
use amb_world::{AgentRole, Directives, InteractionKind, Seat, VehicleModel, World};

use crate::script::{Crew, dispatch, ensure_near, ensure_on_foot, ensure_seated, need};
use crate::{Incident, IncidentError, IncidentResult, Interaction, ParamedicsPhase, PhaseCtx, Role, Step};

use ParamedicsPhase::*;

type Out = IncidentResult<Step<ParamedicsPhase>>;

const FALL:  u32 = 0;
const PLEA:  u32 = 1;
const DRIVE: u32 = 2;
const TREAT: u32 = 3;
const GO:    u32 = 4;
const UP:    u32 = 5;

pub(super) fn step<W: World + ?Sized>(phase: ParamedicsPhase, inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let victim = need(inc, Role::Victim)?;

    match phase {
        Collapsed => {
            if !inc.done(FALL) && ensure_on_foot(ctx.world, victim)? {
                ctx.world.play_interaction(victim, InteractionKind::Collapse)?;
                inc.mark(FALL);
            }
            let dwell = inc.dwell(ctx.config.beat_secs);
            if inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(AwaitingHelp));
            }
            Ok(Step::Stay)
        }

        AwaitingHelp => {
            if !inc.done(PLEA) {
                ctx.advise("Someone has collapsed on the pavement");
                inc.mark(PLEA);
            }
            if let Some(Interaction::CallServices) = inc.take_interaction() {
                inc.flags.services_called = true;
                return Ok(Step::Advance(AmbulanceEnRoute));
            }
            if inc.phase_secs(ctx.clock) >= ctx.config.unattended_recovery_secs {
                return Ok(Step::Advance(Recovering));
            }
            Ok(Step::Stay)
        }

        AmbulanceEnRoute => {
            if inc.member(Role::Ambulance).is_none() {
                let crew = [
                    Crew { role: AgentRole::Medic, member: Role::Medic, seat: Seat::Driver },
                    Crew { role: AgentRole::Medic, member: Role::Medic, seat: Seat::Passenger },
                ];
                dispatch(inc, ctx, VehicleModel::Ambulance, Role::Ambulance, &crew)?;
                ctx.advise("An ambulance is on its way");
            }
            let ambulance = need(inc, Role::Ambulance)?;
            let (driver, _) = medics(inc)?;
            if ctx.distance(ambulance, victim).is_some_and(|d| d <= ctx.config.arrival_distance) {
                return Ok(Step::Advance(Treating));
            }
            if !inc.done(DRIVE) {
                let scene = ctx.position_of(victim)?;
                ctx.world.drive_to(driver, scene, ctx.config.service_speed_mps)?;
                inc.mark(DRIVE);
            }
            Ok(Step::Stay)
        }

        Treating => {
            let (m1, m2) = medics(inc)?;
            if !inc.done(TREAT) {
                let scene = ctx.position_of(victim)?;
                let m1_there = ensure_near(inc, ctx, m1, scene)?;
                let m2_there = ensure_near(inc, ctx, m2, scene)?;
                if !(m1_there && m2_there) {
                    return Ok(Step::Stay);
                }
                ctx.world.play_interaction(m1, InteractionKind::Treat)?;
                ctx.world.play_interaction(m2, InteractionKind::Treat)?;
                inc.mark(TREAT);
                inc.start_anchor(ctx.now());
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= dwell) {
                return Ok(Step::Advance(LoadingPatient));
            }
            Ok(Step::Stay)
        }

        LoadingPatient => {
            let ambulance = need(inc, Role::Ambulance)?;
            let (m1, m2) = medics(inc)?;
            let patient_in = ensure_seated(inc, ctx, victim, ambulance, Seat::RearLeft)?;
            let m1_in = ensure_seated(inc, ctx, m1, ambulance, Seat::Driver)?;
            let m2_in = ensure_seated(inc, ctx, m2, ambulance, Seat::Passenger)?;
            if patient_in && m1_in && m2_in {
                return Ok(Step::Advance(AmbulanceDeparting));
            }
            Ok(Step::Stay)
        }

        AmbulanceDeparting => {
            let (driver, _) = medics(inc)?;
            if !inc.done(GO) {
                ctx.world.wander(driver)?;
                inc.mark(GO);
                inc.start_anchor(ctx.now());
            }
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= ctx.config.departure_secs) {
                return Ok(Step::Advance(Terminal));
            }
            Ok(Step::Stay)
        }

        Recovering => {
            if !inc.done(UP) {
                ctx.world.play_interaction(victim, InteractionKind::Thank)?;
                inc.mark(UP);
                inc.start_anchor(ctx.now());
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= dwell) {
                ctx.world.wander(victim)?;
                return Ok(Step::Advance(Terminal));
            }
            Ok(Step::Stay)
        }

        Terminal => Ok(Step::Stay),
    }
}

/// The two medics, driver first.
fn medics(inc: &Incident) -> IncidentResult<(EntityHandle, EntityHandle)> {
    let mut crew = inc.members_with(Role::Medic);
    match (crew.next(), crew.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(IncidentError::MissingRole { kind: inc.kind, role: Role::Medic }),
    }
}
