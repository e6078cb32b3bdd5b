//! Turns vehicle-on-vehicle collisions reported by the host into accidents.

use amb_core::{EntityHandle, EntityKind, IncidentId, OwnerId, Tick};
use amb_incident::{IncidentError, IncidentKind, IncidentSpec, Role};
use amb_world::World;
use tracing::{debug, warn};

use crate::{AdapterCtx, AdapterResult, CollisionConfig, Subsystem};

/// A collision waiting to become an incident.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingCrash {
    pub car:          EntityHandle,
    pub driver:       EntityHandle,
    pub other:        EntityHandle,
    pub other_driver: EntityHandle,
    pub seen_at:      Tick,
}

impl PendingCrash {
    fn handles(&self) -> [EntityHandle; 4] {
        [self.car, self.driver, self.other, self.other_driver]
    }

    fn same_pair(&self, a: EntityHandle, b: EntityHandle) -> bool {
        (self.car == a && self.other == b) || (self.car == b && self.other == a)
    }
}

enum Attempt {
    Created(IncidentId),
    Retry,
    Drop,
}

/// Runs at elevated priority: a crash may take entities away from a
/// lower-priority incident, which then ends on its next validity pass.
pub struct CollisionHandler {
    owner:   OwnerId,
    config:  CollisionConfig,
    pending: Vec<PendingCrash>,
}

impl CollisionHandler {
    pub fn new(config: CollisionConfig) -> Self {
        Self::with_owner(OwnerId::from("traffic.collisions"), config)
    }

    pub fn with_owner(owner: OwnerId, config: CollisionConfig) -> Self {
        Self { owner, config, pending: Vec::new() }
    }

    pub fn pending(&self) -> &[PendingCrash] {
        &self.pending
    }

    /// Queue fresh collisions between two driven civilian vehicles.
    fn collect<W: World + ?Sized>(&mut self, ctx: &AdapterCtx<'_, W>) {
        let now = ctx.now();
        for (a, b) in ctx.world.recent_collisions() {
            if a == b || self.pending.iter().any(|p| p.same_pair(a, b)) {
                continue;
            }
            let both_vehicles = [a, b].iter().all(|&h| ctx.world.kind(h) == Some(EntityKind::Vehicle));
            if !both_vehicles || ctx.is_player(a) || ctx.is_player(b) {
                continue;
            }
            let (Some(da), Some(db)) = (ctx.world.driver_of(a), ctx.world.driver_of(b)) else {
                continue;
            };
            if ctx.is_player(da) || ctx.is_player(db) {
                continue;
            }
            // A pair already in one of our accidents keeps colliding while it sits there.
            if [a, b].iter().any(|&h| self.in_own_accident(ctx, h)) {
                continue;
            }
            debug!(car = %a, other = %b, "collision queued");
            self.pending.push(PendingCrash { car: a, driver: da, other: b, other_driver: db, seen_at: now });
        }
    }

    fn in_own_accident<W: World + ?Sized>(&self, ctx: &AdapterCtx<'_, W>, handle: EntityHandle) -> bool {
        ctx.engine.iter().any(|i| i.owner == self.owner && i.involves(handle))
    }

    fn attempt<W: World + ?Sized>(&self, ctx: &mut AdapterCtx<'_, W>, crash: &PendingCrash) -> Attempt {
        let handles = crash.handles();
        if handles.iter().any(|&h| !ctx.world.exists(h) || !ctx.world.is_alive(h)) {
            return Attempt::Drop;
        }
        // Pile-up: one car is already part of an accident we started.
        if handles.iter().any(|&h| self.in_own_accident(ctx, h)) {
            return Attempt::Drop;
        }
        if ctx.engine.count_of(IncidentKind::Accident) >= self.config.max_active {
            return Attempt::Retry;
        }
        let now = ctx.now();
        if !ctx.arbiter.try_acquire_all(&*ctx.world, &handles, &self.owner, self.config.priority, now) {
            return Attempt::Retry;
        }
        let (Some(pa), Some(pb)) = (ctx.world.position(crash.car), ctx.world.position(crash.other)) else {
            return Attempt::Drop;
        };
        let spec = IncidentSpec::new(IncidentKind::Accident, pa.lerp(pb, 0.5), self.owner.clone(), self.config.priority)
            .agent(Role::Driver, crash.driver)
            .vehicle(Role::Car, crash.car)
            .agent(Role::OtherDriver, crash.other_driver)
            .vehicle(Role::OtherVehicle, crash.other);
        match ctx.engine.create(spec, now, &mut *ctx.world, &*ctx.arbiter, &mut *ctx.observer) {
            Ok(id) => Attempt::Created(id),
            // The incident these entities were taken from has not been torn
            // down yet; it will be before our next update.
            Err(IncidentError::Overlap(_) | IncidentError::EntityInUse(_)) => Attempt::Retry,
            Err(e) => {
                warn!(car = %crash.car, other = %crash.other, error = %e, "accident rejected");
                Attempt::Drop
            }
        }
    }
}

impl<W: World + ?Sized> Subsystem<W> for CollisionHandler {
    fn name(&self) -> &'static str {
        "collisions"
    }

    fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn interval_ticks(&self) -> u64 {
        self.config.interval_ticks
    }

    fn update(&mut self, ctx: &mut AdapterCtx<'_, W>) -> AdapterResult<Vec<IncidentId>> {
        self.collect(ctx);

        let mut created = Vec::new();
        let queue = std::mem::take(&mut self.pending);
        for crash in queue {
            match self.attempt(ctx, &crash) {
                Attempt::Created(id) => created.push(id),
                Attempt::Retry if ctx.clock.secs_since(crash.seen_at) < self.config.retry_window_secs => {
                    self.pending.push(crash);
                }
                Attempt::Retry | Attempt::Drop => {
                    debug!(car = %crash.car, other = %crash.other, "collision dropped");
                    ctx.abandon(&self.owner, &crash.handles(), &[]);
                }
            }
        }
        Ok(created)
    }

    fn shutdown(&mut self, ctx: &mut AdapterCtx<'_, W>) {
        for crash in self.pending.drain(..) {
            ctx.abandon(&self.owner, &crash.handles(), &[]);
        }
    }
}
