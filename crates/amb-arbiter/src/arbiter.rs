//! The ownership registry.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::{debug, trace};

use amb_core::{EntityHandle, OwnerId, Tick};
use amb_world::WorldQuery;

use crate::ArbiterConfig;

// ── OwnershipRecord ───────────────────────────────────────────────────────────

/// The exclusivity grant one subsystem holds over one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub handle:      EntityHandle,
    pub owner:       OwnerId,
    pub priority:    i32,
    pub acquired_at: Tick,
}

/// Running counters, handy for logs and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ArbiterStats {
    pub grants:      u64,
    pub preemptions: u64,
    pub denials:     u64,
    pub evictions:   u64,
}

/// Outcome of checking one handle, before anything is written.
enum Grant {
    Fresh,
    Preempt(OwnerId),
    AlreadyHeld,
    Denied,
}

// ── OwnershipArbiter ──────────────────────────────────────────────────────────

/// Process-wide (per engine instance) map of entity → current owner.
///
/// Records live in a `BTreeMap` so sweeps walk handles in a stable order
/// and can resume from a cursor.
#[derive(Debug, Default)]
pub struct OwnershipArbiter {
    records:      BTreeMap<EntityHandle, OwnershipRecord>,
    sweep_cursor: Option<EntityHandle>,
    config:       ArbiterConfig,
    stats:        ArbiterStats,
}

impl OwnershipArbiter {
    pub fn new(config: ArbiterConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn stats(&self) -> ArbiterStats {
        self.stats
    }

    // ── Acquisition ───────────────────────────────────────────────────────

    fn check<Q: WorldQuery + ?Sized>(
        &self,
        world:    &Q,
        handle:   EntityHandle,
        owner:    &OwnerId,
        priority: i32,
    ) -> Grant {
        if !handle.is_valid() || !world.exists(handle) {
            return Grant::Denied;
        }
        // The player and whatever they drive are never scripted.
        if world.player() == Some(handle) || world.player_vehicle() == Some(handle) {
            return Grant::Denied;
        }
        match self.records.get(&handle) {
            None => Grant::Fresh,
            Some(r) if r.owner == *owner => Grant::AlreadyHeld,
            Some(r) if r.priority < priority => Grant::Preempt(r.owner.clone()),
            Some(_) => Grant::Denied,
        }
    }

    fn grant(&mut self, handle: EntityHandle, owner: &OwnerId, priority: i32, now: Tick) {
        self.records.insert(handle, OwnershipRecord {
            handle,
            owner: owner.clone(),
            priority,
            acquired_at: now,
        });
        self.stats.grants += 1;
    }

    /// Try to take exclusive control of `handle`.
    ///
    /// Succeeds when the entity exists, is not the player or the player's
    /// vehicle, and either nobody holds it or the holder's priority is
    /// strictly lower than `priority`.  A request from
    /// the current holder succeeds without touching its record.
    pub fn try_acquire<Q: WorldQuery + ?Sized>(
        &mut self,
        world:    &Q,
        handle:   EntityHandle,
        owner:    &OwnerId,
        priority: i32,
        now:      Tick,
    ) -> bool {
        match self.check(world, handle, owner, priority) {
            Grant::Fresh => {
                self.grant(handle, owner, priority, now);
                debug!(%handle, %owner, priority, "ownership granted");
                true
            }
            Grant::Preempt(previous) => {
                self.grant(handle, owner, priority, now);
                self.stats.preemptions += 1;
                debug!(%handle, %owner, %previous, priority, "ownership preempted");
                true
            }
            Grant::AlreadyHeld => true,
            Grant::Denied => {
                self.stats.denials += 1;
                trace!(%handle, %owner, priority, "ownership denied");
                false
            }
        }
    }

    /// [`try_acquire`](Self::try_acquire) at the configured default priority.
    pub fn try_acquire_default<Q: WorldQuery + ?Sized>(
        &mut self,
        world:  &Q,
        handle: EntityHandle,
        owner:  &OwnerId,
        now:    Tick,
    ) -> bool {
        let priority = self.config.default_priority;
        self.try_acquire(world, handle, owner, priority, now)
    }

    /// All-or-nothing acquisition of several entities.
    ///
    /// Every handle is checked before any record is written, so a failure
    /// leaves the registry exactly as it was.  Duplicate handles are fine.
    pub fn try_acquire_all<Q: WorldQuery + ?Sized>(
        &mut self,
        world:    &Q,
        handles:  &[EntityHandle],
        owner:    &OwnerId,
        priority: i32,
        now:      Tick,
    ) -> bool {
        let blocked = handles
            .iter()
            .find(|&&h| matches!(self.check(world, h, owner, priority), Grant::Denied));
        if let Some(&h) = blocked {
            self.stats.denials += 1;
            trace!(handle = %h, %owner, priority, batch = handles.len(), "batch acquisition denied");
            return false;
        }
        for &h in handles {
            self.try_acquire(world, h, owner, priority, now);
        }
        true
    }

    // ── Release ───────────────────────────────────────────────────────────

    /// Drop the record for `handle`, whoever holds it.  Idempotent.
    pub fn release(&mut self, handle: EntityHandle) -> Option<OwnershipRecord> {
        let removed = self.records.remove(&handle);
        if let Some(r) = &removed {
            debug!(%handle, owner = %r.owner, "ownership released");
        }
        removed
    }

    /// Release `handle` only if `owner` still holds it.
    ///
    /// A preempted owner calling this leaves the new holder's record alone.
    pub fn release_if_owned(&mut self, handle: EntityHandle, owner: &OwnerId) -> bool {
        if self.holds(handle, owner) {
            self.release(handle);
            true
        } else {
            false
        }
    }

    /// Release every record held by `owner`; returns the freed handles.
    pub fn release_all_owned_by(&mut self, owner: &OwnerId) -> Vec<EntityHandle> {
        let freed: Vec<EntityHandle> = self
            .records
            .values()
            .filter(|r| r.owner == *owner)
            .map(|r| r.handle)
            .collect();
        for h in &freed {
            self.records.remove(h);
        }
        if !freed.is_empty() {
            debug!(%owner, count = freed.len(), "released all records for owner");
        }
        freed
    }

    /// Owner-initiated timeout: release `owner`'s records older than
    /// `max_hold_ticks`.
    pub fn release_expired(&mut self, owner: &OwnerId, max_hold_ticks: u64, now: Tick) -> Vec<EntityHandle> {
        let expired: Vec<EntityHandle> = self
            .records
            .values()
            .filter(|r| r.owner == *owner && now.since(r.acquired_at) > max_hold_ticks)
            .map(|r| r.handle)
            .collect();
        for h in &expired {
            self.records.remove(h);
            debug!(handle = %h, %owner, "ownership expired");
        }
        expired
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_locked(&self, handle: EntityHandle) -> bool {
        self.records.contains_key(&handle)
    }

    pub fn owner_of(&self, handle: EntityHandle) -> Option<&OwnerId> {
        self.records.get(&handle).map(|r| &r.owner)
    }

    /// `true` if `owner` currently holds `handle`.
    pub fn holds(&self, handle: EntityHandle, owner: &OwnerId) -> bool {
        self.owner_of(handle) == Some(owner)
    }

    pub fn record(&self, handle: EntityHandle) -> Option<&OwnershipRecord> {
        self.records.get(&handle)
    }

    pub fn records(&self) -> impl Iterator<Item = &OwnershipRecord> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ── Sweep ─────────────────────────────────────────────────────────────

    /// Evict records whose entity no longer exists.
    ///
    /// Examines at most `sweep_batch` records, resuming after the last
    /// handle examined by the previous call and wrapping at the end, so
    /// repeated calls cover the whole table at bounded cost.  Returns the
    /// evicted handles.
    pub fn sweep<Q: WorldQuery + ?Sized>(&mut self, world: &Q) -> Vec<EntityHandle> {
        let batch = self.config.sweep_batch.max(1).min(self.records.len());
        if batch == 0 {
            self.sweep_cursor = None;
            return Vec::new();
        }

        let start = match self.sweep_cursor {
            Some(c) => Bound::Excluded(c),
            None    => Bound::Unbounded,
        };
        let mut examined: Vec<EntityHandle> = self
            .records
            .range((start, Bound::Unbounded))
            .map(|(h, _)| *h)
            .take(batch)
            .collect();
        if examined.len() < batch {
            let wrap: Vec<EntityHandle> = self
                .records
                .keys()
                .copied()
                .filter(|h| !examined.contains(h))
                .take(batch - examined.len())
                .collect();
            examined.extend(wrap);
        }
        self.sweep_cursor = examined.last().copied();

        let evicted: Vec<EntityHandle> = examined
            .into_iter()
            .filter(|h| !world.exists(*h))
            .collect();
        for h in &evicted {
            if let Some(r) = self.records.remove(h) {
                debug!(handle = %h, owner = %r.owner, "sweep evicted stale record");
            }
        }
        self.stats.evictions += evicted.len() as u64;
        evicted
    }
}
