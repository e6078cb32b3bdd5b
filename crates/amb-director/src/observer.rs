//! Director observer: incident presentation hooks plus tick-loop progress.

use amb_core::{EntityHandle, Tick};
use amb_incident::{IncidentObserver, NoopIncidentObserver, RecordingObserver};

use crate::TickSummary;

/// Callbacks invoked by [`Director::run_ticks`][crate::Director::run_ticks].
///
/// Extends [`IncidentObserver`], so one value receives both the incident
/// lifecycle events (markers, phase changes, advisories) and the tick-loop
/// events below.  Every method has a no-op default.
pub trait DirectorObserver: IncidentObserver {
    /// Called at the very start of each tick, before any adapter runs.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once the tick's adapters, engine pass and sweep are done.
    fn on_tick_end(&mut self, _tick: Tick, _summary: &TickSummary) {}

    /// Called after a sweep that evicted at least one stale record.
    fn on_sweep(&mut self, _tick: Tick, _evicted: &[EntityHandle]) {}

    /// Called once by [`Director::shutdown`][crate::Director::shutdown].
    fn on_shutdown(&mut self, _tick: Tick, _cancelled: usize) {}
}

impl DirectorObserver for NoopIncidentObserver {}

impl DirectorObserver for RecordingObserver {}

/// A [`DirectorObserver`] that does nothing.  Use when you need to run ticks
/// but don't want markers or progress callbacks.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl IncidentObserver for NoopObserver {}

impl DirectorObserver for NoopObserver {}
