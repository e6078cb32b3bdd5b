//! The `Director` and its tick loop.

use amb_adapters::{AdapterCtx, SubsystemScheduler};
use amb_arbiter::OwnershipArbiter;
use amb_core::{EntityHandle, IncidentId, SimClock, Tick};
use amb_incident::{IncidentEngine, Interaction, TickReport};
use amb_placement::PlacementValidator;
use amb_world::{SandboxWorld, World};
use tracing::{debug, info, trace};

use crate::{AmbientConfig, DirectorObserver, DirectorResult};

// ── Host stepping ─────────────────────────────────────────────────────────────

/// A world the director advances itself after each tick.
///
/// Hosts that run their own frame loop implement this as a no-op.
pub trait Steppable {
    fn step_world(&mut self, dt_secs: f32);
}

impl Steppable for SandboxWorld {
    fn step_world(&mut self, dt_secs: f32) {
        self.step(dt_secs);
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

/// What happened during one [`Director::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickSummary {
    pub tick:    Tick,
    /// Incidents started by adapters this tick.
    pub created: Vec<IncidentId>,
    pub engine:  TickReport,
    /// Ownership records dropped by this tick's sweep.
    pub evicted: Vec<EntityHandle>,
}

/// Running totals since the director was built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectorStats {
    pub ticks:       u64,
    pub created:     u64,
    pub torn_down:   u64,
    /// Teardowns that ended normally (completed or cancelled).
    pub clean:       u64,
    pub transitions: u64,
    pub errors:      u64,
    pub evicted:     u64,
}

// ── Director ──────────────────────────────────────────────────────────────────

/// Owns the shared state and runs the per-tick order:
///
/// 1. **Adapters**: every subsystem due this tick runs in registration order.
/// 2. **Engine**: validity pass, then phase pass, over all incidents.
/// 3. **Sweep**: every `arbiter.sweep_interval_ticks`, one bounded batch of
///    records for entities that no longer exist.
/// 4. **World**: the host advances by one tick's worth of seconds.
///
/// Create via [`DirectorBuilder`][crate::DirectorBuilder].
pub struct Director<W: World + Steppable + 'static> {
    pub config:    AmbientConfig,
    pub clock:     SimClock,
    pub world:     W,
    pub arbiter:   OwnershipArbiter,
    pub engine:    IncidentEngine,
    pub placement: PlacementValidator,
    pub scheduler: SubsystemScheduler<W>,
    pub stats:     DirectorStats,
}

impl<W: World + Steppable + 'static> Director<W> {
    /// Run exactly `n` ticks from the current position.
    pub fn run_ticks<O: DirectorObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            self.tick(observer);
        }
    }

    /// Run one tick.
    pub fn tick<O: DirectorObserver>(&mut self, observer: &mut O) -> TickSummary {
        let now = self.clock.now();
        observer.on_tick_start(now);

        // ① adapters
        let created = {
            let mut ctx = AdapterCtx {
                clock:     &self.clock,
                world:     &mut self.world,
                arbiter:   &mut self.arbiter,
                engine:    &mut self.engine,
                placement: &self.placement,
                observer:  &mut *observer,
            };
            self.scheduler.run_due(&mut ctx)
        };

        // ② incidents
        let engine = self.engine.tick(&self.clock, &mut self.world, &mut self.arbiter, &self.placement, observer);

        // ③ sweep
        let interval = self.config.arbiter.sweep_interval_ticks.max(1);
        let evicted = if now.0 > 0 && now.0 % interval == 0 {
            self.arbiter.sweep(&self.world)
        } else {
            Vec::new()
        };
        if !evicted.is_empty() {
            debug!(tick = now.0, evicted = evicted.len(), "stale ownership swept");
            observer.on_sweep(now, &evicted);
        }

        // ④ host
        self.world.step_world(self.clock.tick_secs());

        let s = &mut self.stats;
        s.ticks += 1;
        s.created += created.len() as u64;
        s.torn_down += engine.torn_down.len() as u64;
        s.clean += engine.torn_down.iter().filter(|(_, r)| r.is_clean()).count() as u64;
        s.transitions += engine.transitions as u64;
        s.errors += engine.errors as u64;
        s.evicted += evicted.len() as u64;

        let summary = TickSummary { tick: now, created, engine, evicted };
        trace!(
            tick = now.0,
            created = summary.created.len(),
            active = self.engine.len(),
            held = self.arbiter.len(),
            "tick done"
        );
        observer.on_tick_end(now, &summary);
        self.clock.advance();
        summary
    }

    /// Forward a player interaction to an incident.
    pub fn interact(&mut self, id: IncidentId, interaction: Interaction) -> DirectorResult<()> {
        Ok(self.engine.interact(id, interaction)?)
    }

    /// End the session: adapters hand back what they hold, every incident
    /// is cancelled.  Returns how many incidents were cancelled.
    pub fn shutdown<O: DirectorObserver>(&mut self, observer: &mut O) -> usize {
        {
            let mut ctx = AdapterCtx {
                clock:     &self.clock,
                world:     &mut self.world,
                arbiter:   &mut self.arbiter,
                engine:    &mut self.engine,
                placement: &self.placement,
                observer:  &mut *observer,
            };
            self.scheduler.shutdown(&mut ctx);
        }
        let cancelled = self.engine.cancel_all(&mut self.world, &mut self.arbiter, observer);
        let now = self.clock.now();
        info!(tick = now.0, cancelled, still_held = self.arbiter.len(), "director shut down");
        observer.on_shutdown(now, cancelled);
        cancelled
    }
}
