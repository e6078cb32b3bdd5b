//! Presentation hooks: markers, phase changes, advisories, teardown.

use amb_core::{IncidentId, MarkerRef, Tick};

use crate::{Incident, IncidentKind, Phase, TeardownReason};

/// Callbacks invoked by [`IncidentEngine`][crate::IncidentEngine] as
/// incidents start, move between phases and end.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait IncidentObserver {
    /// Called once an incident has been accepted.  The returned marker is
    /// stored on the incident and handed back in
    /// [`on_torn_down`](Self::on_torn_down).
    fn on_created(&mut self, _incident: &Incident) -> Option<MarkerRef> {
        None
    }

    fn on_phase_changed(&mut self, _id: IncidentId, _from: Phase, _to: Phase, _at: Tick) {}

    /// A player-facing message (help prompts, progress notes).
    fn on_advisory(&mut self, _id: IncidentId, _message: &str) {}

    /// Called after the incident's entities have been released.  The
    /// observer owns cleanup of `marker`.
    fn on_torn_down(
        &mut self,
        _id:     IncidentId,
        _kind:   IncidentKind,
        _marker: Option<MarkerRef>,
        _reason: &TeardownReason,
    ) {}
}

/// An [`IncidentObserver`] that does nothing.
pub struct NoopIncidentObserver;

impl IncidentObserver for NoopIncidentObserver {}

// ── Recording ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum IncidentEvent {
    Created      { id: IncidentId, kind: IncidentKind, marker: MarkerRef },
    PhaseChanged { id: IncidentId, from: Phase, to: Phase, at: Tick },
    Advisory     { id: IncidentId, message: String },
    TornDown     { id: IncidentId, kind: IncidentKind, marker: Option<MarkerRef>, reason: TeardownReason },
}

/// Keeps every event and hands out sequential markers.  Handy for tests and
/// for replaying what happened in a demo run.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    pub events:  Vec<IncidentEvent>,
    next_marker: u32,
    /// Markers handed out and not yet returned through teardown.
    pub live_markers: Vec<MarkerRef>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phases `id` has entered, in order (initial phase excluded).
    pub fn phases_of(&self, id: IncidentId) -> Vec<Phase> {
        self.events
            .iter()
            .filter_map(|e| match e {
                IncidentEvent::PhaseChanged { id: i, to, .. } if *i == id => Some(*to),
                _ => None,
            })
            .collect()
    }

    pub fn teardown_of(&self, id: IncidentId) -> Option<&TeardownReason> {
        self.events.iter().find_map(|e| match e {
            IncidentEvent::TornDown { id: i, reason, .. } if *i == id => Some(reason),
            _ => None,
        })
    }

    pub fn advisories_of(&self, id: IncidentId) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                IncidentEvent::Advisory { id: i, message } if *i == id => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn torn_down(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, IncidentEvent::TornDown { .. })).count()
    }
}

impl IncidentObserver for RecordingObserver {
    fn on_created(&mut self, incident: &Incident) -> Option<MarkerRef> {
        let marker = MarkerRef(self.next_marker);
        self.next_marker += 1;
        self.live_markers.push(marker);
        self.events.push(IncidentEvent::Created { id: incident.id, kind: incident.kind, marker });
        Some(marker)
    }

    fn on_phase_changed(&mut self, id: IncidentId, from: Phase, to: Phase, at: Tick) {
        self.events.push(IncidentEvent::PhaseChanged { id, from, to, at });
    }

    fn on_advisory(&mut self, id: IncidentId, message: &str) {
        self.events.push(IncidentEvent::Advisory { id, message: message.to_string() });
    }

    fn on_torn_down(
        &mut self,
        id:     IncidentId,
        kind:   IncidentKind,
        marker: Option<MarkerRef>,
        reason: &TeardownReason,
    ) {
        if let Some(m) = marker {
            self.live_markers.retain(|x| *x != m);
        }
        self.events.push(IncidentEvent::TornDown { id, kind, marker, reason: reason.clone() });
    }
}
