//! Runs each subsystem on its own interval.

use amb_core::IncidentId;
use amb_world::World;
use tracing::{trace, warn};

use crate::{AdapterCtx, Subsystem};

struct Slot<W: World + ?Sized + 'static> {
    subsystem: Box<dyn Subsystem<W>>,
    /// Tick residue (mod interval) on which the subsystem runs.
    offset:    u64,
    runs:      u64,
    failures:  u64,
}

/// Counters for one registered subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotStats {
    pub name:     &'static str,
    pub offset:   u64,
    pub runs:     u64,
    pub failures: u64,
}

/// Ordered set of subsystems with staggered schedules.
///
/// Each subsystem gets an offset equal to its registration index modulo its
/// interval, so two adapters with the same interval never run on the same
/// tick unless there are more adapters than ticks in the interval.
pub struct SubsystemScheduler<W: World + ?Sized + 'static> {
    slots: Vec<Slot<W>>,
}

impl<W: World + ?Sized + 'static> Default for SubsystemScheduler<W> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<W: World + ?Sized + 'static> SubsystemScheduler<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subsystem: Box<dyn Subsystem<W>>) {
        let offset = self.slots.len() as u64 % subsystem.interval_ticks().max(1);
        self.add_with_offset(subsystem, offset);
    }

    pub fn add_with_offset(&mut self, subsystem: Box<dyn Subsystem<W>>, offset: u64) {
        let offset = offset % subsystem.interval_ticks().max(1);
        self.slots.push(Slot { subsystem, offset, runs: 0, failures: 0 });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> Vec<SlotStats> {
        self.slots
            .iter()
            .map(|s| SlotStats {
                name:     s.subsystem.name(),
                offset:   s.offset,
                runs:     s.runs,
                failures: s.failures,
            })
            .collect()
    }

    /// Run every subsystem due on the current tick, in registration order.
    ///
    /// A failing subsystem is logged and skipped; it runs again on its next
    /// slot.
    pub fn run_due(&mut self, ctx: &mut AdapterCtx<'_, W>) -> Vec<IncidentId> {
        let tick = ctx.now().0;
        let mut created = Vec::new();
        for slot in &mut self.slots {
            let interval = slot.subsystem.interval_ticks().max(1);
            if tick % interval != slot.offset {
                continue;
            }
            slot.runs += 1;
            trace!(subsystem = slot.subsystem.name(), tick, "subsystem update");
            match slot.subsystem.update(ctx) {
                Ok(ids) => created.extend(ids),
                Err(e) => {
                    slot.failures += 1;
                    warn!(subsystem = slot.subsystem.name(), tick, error = %e, "subsystem update failed");
                }
            }
        }
        created
    }

    pub fn shutdown(&mut self, ctx: &mut AdapterCtx<'_, W>) {
        for slot in &mut self.slots {
            slot.subsystem.shutdown(ctx);
        }
    }
}
