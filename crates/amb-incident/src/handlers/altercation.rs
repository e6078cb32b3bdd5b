//! One pedestrian squares up to another.  The victim runs; the aggressor
//! either catches them or gives up.  The incident moves with the aggressor.

use amb_world::{Directive, Directives, InteractionKind, World};

use crate::script::{ensure_near, need};
use crate::{AltercationPhase, Incident, IncidentResult, PhaseCtx, Role, Step};

use AltercationPhase::*;

type Out = IncidentResult<Step<AltercationPhase>>;

const FREEZE: u32 = 0;
const SHOUT:  u32 = 1;
const CHASE:  u32 = 2;
const BRAWL:  u32 = 3;
const SPLIT:  u32 = 4;

/// A chase can only end in a brawl after this long.
const CATCH_GRACE_SECS: f32 = 3.0;
/// Aggressor this close to the victim has caught them.
const CATCH_DISTANCE: f32 = 2.0;

pub(super) fn step<W: World + ?Sized>(phase: AltercationPhase, inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> Out {
    let aggressor = need(inc, Role::Aggressor)?;
    let victim = need(inc, Role::Victim)?;

    match phase {
        Confrontation => {
            if !inc.done(FREEZE) {
                ctx.world.issue(victim, Directive::ClearTasks)?;
                inc.mark(FREEZE);
            }
            if !inc.done(SHOUT) {
                let target = ctx.position_of(victim)?;
                if !ensure_near(inc, ctx, aggressor, target)? {
                    return Ok(Step::Stay);
                }
                ctx.world.play_interaction(aggressor, InteractionKind::Argue)?;
                ctx.world.play_interaction(victim, InteractionKind::Cower)?;
                inc.mark(SHOUT);
                inc.start_anchor(ctx.now());
            }
            let dwell = inc.dwell(ctx.config.beat_secs);
            if inc.anchor_secs(ctx.clock).is_some_and(|s| s >= dwell) {
                return Ok(Step::Advance(Chasing));
            }
            Ok(Step::Stay)
        }

        Chasing => {
            if !inc.done(CHASE) {
                ctx.world.flee_from(victim, aggressor)?;
                ctx.world.engage(aggressor, victim)?;
                inc.mark(CHASE);
            }
            let Some(gap) = ctx.distance(aggressor, victim) else {
                return Ok(Step::Stay);
            };
            if gap >= ctx.config.escape_distance {
                return Ok(Step::Advance(Escaped));
            }
            if gap <= CATCH_DISTANCE && inc.phase_secs(ctx.clock) >= CATCH_GRACE_SECS {
                return Ok(Step::Advance(Brawling));
            }
            Ok(Step::Stay)
        }

        Brawling => {
            if !inc.done(BRAWL) {
                ctx.world.engage(victim, aggressor)?;
                inc.mark(BRAWL);
            }
            let dwell = inc.dwell(ctx.config.scene_secs);
            if inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(Terminal));
            }
            Ok(Step::Stay)
        }

        Escaped => {
            if !inc.done(SPLIT) {
                ctx.world.wander(aggressor)?;
                ctx.world.wander(victim)?;
                inc.mark(SPLIT);
            }
            let dwell = inc.dwell(ctx.config.beat_secs);
            if inc.phase_secs(ctx.clock) >= dwell {
                return Ok(Step::Advance(Terminal));
            }
            Ok(Step::Stay)
        }

        Terminal => Ok(Step::Stay),
    }
}
