//! Clears civilian vehicles that have stalled on a route near the player.
//!
//! Unlike the other adapters this one never starts an incident.  It drives
//! its own short script across several updates, so it must re-check every
//! tick that it still holds what it is steering.

use amb_core::{EntityHandle, IncidentId, OwnerId, Tick, Vec3};
use amb_world::{Directives, World};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{AdapterCtx, AdapterResult, BlockageConfig, Subsystem};

/// A vehicle being moved along.
#[derive(Clone, Debug, PartialEq)]
pub struct Nudge {
    pub vehicle: EntityHandle,
    pub driver:  EntityHandle,
    pub from:    Vec3,
    pub started: Tick,
}

pub struct TrafficBlockageHandler {
    owner:         OwnerId,
    config:        BlockageConfig,
    /// First tick each watched vehicle was seen standing still.
    stopped_since: FxHashMap<EntityHandle, Tick>,
    nudges:        Vec<Nudge>,
    completed:     u64,
}

impl TrafficBlockageHandler {
    pub fn new(config: BlockageConfig) -> Self {
        Self::with_owner(OwnerId::from("traffic.blockage"), config)
    }

    pub fn with_owner(owner: OwnerId, config: BlockageConfig) -> Self {
        Self { owner, config, stopped_since: FxHashMap::default(), nudges: Vec::new(), completed: 0 }
    }

    pub fn nudges(&self) -> &[Nudge] {
        &self.nudges
    }

    /// Nudges that ran to the end (cleared or timed out) and were handed back.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    fn is_nudging(&self, vehicle: EntityHandle) -> bool {
        self.nudges.iter().any(|n| n.vehicle == vehicle)
    }

    /// Advance running nudges; drop the ones that are done or were taken away.
    fn progress<W: World + ?Sized>(&mut self, ctx: &mut AdapterCtx<'_, W>) {
        let cfg = &self.config;
        let owner = &self.owner;
        let mut completed = 0;
        self.nudges.retain(|n| {
            if !ctx.arbiter.holds(n.vehicle, owner) || !ctx.arbiter.holds(n.driver, owner) {
                debug!(vehicle = %n.vehicle, %owner, "nudge lost ownership");
                ctx.arbiter.release_if_owned(n.vehicle, owner);
                ctx.arbiter.release_if_owned(n.driver, owner);
                return false;
            }
            let gone = [n.vehicle, n.driver]
                .iter()
                .any(|&h| !ctx.world.exists(h) || !ctx.world.is_alive(h));
            let moved = ctx.world.position(n.vehicle).map_or(0.0, |p| p.distance_2d(n.from));
            let cleared = moved >= cfg.nudge_distance * 0.8;
            let expired = ctx.clock.secs_since(n.started) >= cfg.nudge_timeout_secs;
            if !(gone || cleared || expired) {
                return true;
            }
            if !gone {
                if let Err(e) = ctx.world.wander(n.driver) {
                    warn!(driver = %n.driver, error = %e, "could not release stalled driver into traffic");
                }
            }
            ctx.arbiter.release_if_owned(n.vehicle, owner);
            ctx.arbiter.release_if_owned(n.driver, owner);
            debug!(vehicle = %n.vehicle, moved, cleared, expired, gone, "nudge finished");
            completed += 1;
            false
        });
        self.completed += completed;
    }

    /// Track stopped vehicles around the player and start nudging the ones
    /// that have waited too long.
    fn scan<W: World + ?Sized>(&mut self, ctx: &mut AdapterCtx<'_, W>) {
        let Some((center, _)) = ctx.player_anchor() else {
            self.stopped_since.clear();
            return;
        };
        let now = ctx.now();
        let seen = ctx.world.nearby_vehicles(center, self.config.scan_radius);
        self.stopped_since.retain(|h, _| seen.contains(h));

        for v in seen {
            if ctx.is_player(v) || self.is_nudging(v) {
                continue;
            }
            let Some(driver) = ctx.world.driver_of(v) else {
                self.stopped_since.remove(&v);
                continue;
            };
            let stopped = ctx.world.speed(v).is_some_and(|s| s <= self.config.stopped_speed)
                && ctx.world.position(v).is_some_and(|p| ctx.world.is_on_route(p));
            if !stopped {
                self.stopped_since.remove(&v);
                continue;
            }
            let since = *self.stopped_since.entry(v).or_insert(now);
            if ctx.clock.secs_between(since, now) < self.config.stall_secs
                || self.nudges.len() >= self.config.max_nudges
                || !ctx.is_free(v)
                || !ctx.is_free(driver)
            {
                continue;
            }
            self.start(ctx, v, driver);
        }
    }

    fn start<W: World + ?Sized>(&mut self, ctx: &mut AdapterCtx<'_, W>, vehicle: EntityHandle, driver: EntityHandle) {
        let now = ctx.now();
        if !ctx.arbiter.try_acquire_all(&*ctx.world, &[vehicle, driver], &self.owner, self.config.priority, now) {
            return;
        }
        let (Some(from), Some(heading)) = (ctx.world.position(vehicle), ctx.world.heading(vehicle)) else {
            ctx.abandon(&self.owner, &[vehicle, driver], &[]);
            return;
        };
        let ahead = from.offset_polar(heading, self.config.nudge_distance);
        if let Err(e) = ctx.world.drive_to(driver, ahead, self.config.nudge_speed_mps) {
            warn!(%vehicle, %driver, error = %e, "nudge refused");
            ctx.abandon(&self.owner, &[vehicle, driver], &[]);
            return;
        }
        debug!(%vehicle, %driver, position = %from, "nudging stalled vehicle");
        self.stopped_since.remove(&vehicle);
        self.nudges.push(Nudge { vehicle, driver, from, started: now });
    }
}

impl<W: World + ?Sized> Subsystem<W> for TrafficBlockageHandler {
    fn name(&self) -> &'static str {
        "traffic-blockage"
    }

    fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn interval_ticks(&self) -> u64 {
        self.config.interval_ticks
    }

    fn update(&mut self, ctx: &mut AdapterCtx<'_, W>) -> AdapterResult<Vec<IncidentId>> {
        self.progress(ctx);
        self.scan(ctx);
        Ok(Vec::new())
    }

    fn shutdown(&mut self, ctx: &mut AdapterCtx<'_, W>) {
        for n in self.nudges.drain(..) {
            ctx.arbiter.release_if_owned(n.vehicle, &self.owner);
            ctx.arbiter.release_if_owned(n.driver, &self.owner);
        }
        self.stopped_since.clear();
    }
}
