//! Phase handlers, one module per incident kind.
//!
//! A handler is called once per tick for the incident's current phase.  It
//! must be idempotent: one-shot orders are guarded by the phase scratch
//! bits, everything else is a condition check.  Returning `Err` leaves the
//! phase unchanged so the engine can retry on the next tick.

mod accident;
mod altercation;
mod breakdown;
mod paramedics;
mod police_stop;

use amb_world::World;

use crate::{Incident, IncidentResult, Phase, PhaseCtx, Step};

pub(crate) fn step<W: World + ?Sized>(inc: &mut Incident, ctx: &mut PhaseCtx<'_, W>) -> IncidentResult<Step<Phase>> {
    Ok(match inc.phase {
        Phase::Breakdown(p)   => breakdown::step(p, inc, ctx)?.map(Phase::from),
        Phase::PoliceStop(p)  => police_stop::step(p, inc, ctx)?.map(Phase::from),
        Phase::Accident(p)    => accident::step(p, inc, ctx)?.map(Phase::from),
        Phase::Paramedics(p)  => paramedics::step(p, inc, ctx)?.map(Phase::from),
        Phase::Altercation(p) => altercation::step(p, inc, ctx)?.map(Phase::from),
    })
}
