//! Two drivers after a crash: they get out, argue, then either swap details
//! or come to blows before driving off.

use amb_world::{Directives, InteractionKind, Seat, World};

use crate::script::{ensure_near, ensure_on_foot, ensure_seated, need};
use crate::{AccidentPhase, Incident, IncidentResult, Interaction, PhaseCtx, Role, Step};

use AccidentPhase::*;

type Out = IncidentResult<Step<AccidentPhase>>;

const NOTICE: u32 = 0;
const FACE:   u32 = 1;
const TALK:   u32 = 2;
const FIGHT:  u32 = 3;
const LEAVE:  u32 = 4;
const POLICE: u32 = 5;

/// Odds an argument cools down into exchanging details.
const P_CALM: f32 = 0.7;

pub(super) fn step<W: World + ?Sized>(phase: AccidentPhase, inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let a = need(inc, Role::Driver)?;
    let b = need(inc, Role::OtherDriver)?;

    take_call(inc, ctx);

    match phase {
        Aftermath => {
            if !inc.done(NOTICE) {
                ctx.advise("A collision has stopped traffic");
                inc.mark(NOTICE);
            }
            let a_out = ensure_on_foot(ctx.world, a)?;
            let b_out = ensure_on_foot(ctx.world, b)?;
            let dwell = inc.dwell(ctx.config.beat_secs);
            if a_out && b_out && inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(Arguing));
            }
            Ok(Step::Stay)
        }

        Arguing => {
            if !inc.done(FACE) {
                let (pa, pb) = (ctx.position_of(a)?, ctx.position_of(b)?);
                let middle = pa.lerp(pb, 0.5);
                let a_there = ensure_near(inc, ctx, a, middle)?;
                let b_there = ensure_near(inc, ctx, b, middle)?;
                if !(a_there && b_there) {
                    return Ok(Step::Stay);
                }
                ctx.world.play_interaction(a, InteractionKind::Argue)?;
                ctx.world.play_interaction(b, InteractionKind::Argue)?;
                inc.mark(FACE);
                inc.start_anchor(ctx.now());
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= dwell) {
                let calm = inc.rng.gen_bool(P_CALM as f64);
                return Ok(Step::Advance(if calm { ExchangingDetails } else { Fighting }));
            }
            Ok(Step::Stay)
        }

        ExchangingDetails => {
            if !inc.done(TALK) {
                ctx.world.play_interaction(a, InteractionKind::Talk)?;
                ctx.world.play_interaction(b, InteractionKind::Talk)?;
                inc.mark(TALK);
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(Dispersing));
            }
            Ok(Step::Stay)
        }

        Fighting => {
            if !inc.done(FIGHT) {
                ctx.world.engage(a, b)?;
                ctx.world.engage(b, a)?;
                inc.mark(FIGHT);
            }
            if inc.flags.services_called && !inc.done(POLICE) {
                ctx.advise("Police have been told about the fight");
                inc.mark(POLICE);
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(Dispersing));
            }
            Ok(Step::Stay)
        }

        Dispersing => {
            let car_a = need(inc, Role::Car)?;
            let car_b = need(inc, Role::OtherVehicle)?;
            if !inc.done(LEAVE) {
                let a_in = ensure_seated(inc, ctx, a, car_a, Seat::Driver)?;
                let b_in = ensure_seated(inc, ctx, b, car_b, Seat::Driver)?;
                if !(a_in && b_in) {
                    return Ok(Step::Stay);
                }
                ctx.world.wander(a)?;
                ctx.world.wander(b)?;
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

/// Calling it in only sets the flag; the scene plays out either way.
fn take_call<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) {
    if let Some(Interaction::CallServices) = inc.take_interaction() {
        if !inc.flags.services_called {
            inc.flags.services_called = true;
            ctx.advise("Emergency services have been notified");
        }
    }
}
