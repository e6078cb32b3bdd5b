//! `IncidentEngine`: creation, the two-pass tick, interaction and teardown.

use std::fmt;

use tracing::{debug, info, warn};

use amb_arbiter::OwnershipArbiter;
use amb_core::{EntityHandle, IncidentId, IncidentRng, OwnerId, SimClock, Tick, Vec3};
use amb_placement::{ExclusionSet, PlacementValidator};
use amb_world::{Directives, Protection, World};

use crate::{
    handlers, Incident, IncidentConfig, IncidentError, IncidentKind, IncidentObserver,
    IncidentResult, IncidentSpec, Interaction, Phase, PhaseCtx, Step,
};

/// Why an incident ended.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TeardownReason {
    /// Reached its terminal phase normally.
    Completed,
    /// Lived past `max_age_secs`.
    AgeCap,
    /// A member vanished or died.
    ParticipantInvalid(EntityHandle),
    /// A member is no longer held by the incident's owner.
    OwnershipLost(EntityHandle),
    /// Stayed in `phase` past its maximum dwell.
    PhaseTimeout(Phase),
    /// A handler asked for a transition its table does not allow.
    Fault(Phase),
    /// Ended from outside via [`IncidentEngine::cancel`].
    Cancelled,
}

impl TeardownReason {
    /// Whether this is an orderly end rather than a failure.
    pub fn is_clean(&self) -> bool {
        matches!(self, TeardownReason::Completed | TeardownReason::Cancelled)
    }
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownReason::Completed             => f.write_str("completed"),
            TeardownReason::AgeCap                => f.write_str("age cap"),
            TeardownReason::ParticipantInvalid(h) => write!(f, "participant {h} invalid"),
            TeardownReason::OwnershipLost(h)      => write!(f, "ownership of {h} lost"),
            TeardownReason::PhaseTimeout(p)       => write!(f, "timed out in {p}"),
            TeardownReason::Fault(p)              => write!(f, "illegal step from {p}"),
            TeardownReason::Cancelled             => f.write_str("cancelled"),
        }
    }
}

/// Summary of one [`IncidentEngine::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Phase changes applied this tick.
    pub transitions: usize,
    /// Handler errors contained this tick.
    pub errors:      usize,
    /// Incidents removed this tick, in teardown order.
    pub torn_down:   Vec<(IncidentId, TeardownReason)>,
}

// ── IncidentEngine ────────────────────────────────────────────────────────────

/// Owns every active incident and advances them once per tick.
///
/// Incidents are kept in creation order, which is also the order both
/// passes visit them, so runs with the same seed are reproducible.
pub struct IncidentEngine {
    config:    IncidentConfig,
    incidents: Vec<Incident>,
    next_id:   u32,
    seed:      u64,
}

impl IncidentEngine {
    pub fn new(config: IncidentConfig, seed: u64) -> Self {
        Self { config, incidents: Vec::new(), next_id: 0, seed }
    }

    pub fn config(&self) -> &IncidentConfig {
        &self.config
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    pub fn get(&self, id: IncidentId) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Incident> + '_ {
        self.incidents.iter()
    }

    pub fn ids(&self) -> Vec<IncidentId> {
        self.incidents.iter().map(|i| i.id).collect()
    }

    pub fn count_of(&self, kind: IncidentKind) -> usize {
        self.incidents.iter().filter(|i| i.kind == kind).count()
    }

    /// The active incident listing `handle` as a member, if any.
    pub fn involving(&self, handle: EntityHandle) -> Option<IncidentId> {
        self.incidents.iter().find(|i| i.involves(handle)).map(|i| i.id)
    }

    /// Keep-out zones around every active incident, for placement.
    pub fn exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::from_points(self.incidents.iter().map(|i| i.position), self.config.exclusion_radius)
    }

    pub fn would_overlap(&self, position: Vec3) -> bool {
        self.incidents.iter().any(|i| i.position.within_2d(position, self.config.exclusion_radius))
    }

    // ── Creation ──────────────────────────────────────────────────────────

    /// Start an incident over entities `spec.owner` already holds.
    ///
    /// Rejects the request when a required role is empty, a member is gone
    /// or not held by the owner, a member still belongs to another incident
    /// under that incident's own ownership, or the position crowds an active
    /// incident.  Nothing is changed on rejection.
    pub fn create<W, O>(
        &mut self,
        spec:     IncidentSpec,
        now:      Tick,
        world:    &mut W,
        arbiter:  &OwnershipArbiter,
        observer: &mut O,
    ) -> IncidentResult<IncidentId>
    where
        W: World + ?Sized,
        O: IncidentObserver + ?Sized,
    {
        for &role in spec.kind.required_roles() {
            if !spec.members.iter().any(|m| m.role == role) {
                return Err(IncidentError::MissingRole { kind: spec.kind, role });
            }
        }
        for m in &spec.members {
            if !world.exists(m.handle) || !world.is_alive(m.handle) {
                return Err(IncidentError::Unavailable(m.handle));
            }
            if !arbiter.holds(m.handle, &spec.owner) {
                return Err(IncidentError::NotOwned(m.handle));
            }
            let taken = self
                .incidents
                .iter()
                .any(|i| i.involves(m.handle) && arbiter.holds(m.handle, &i.owner));
            if taken {
                return Err(IncidentError::EntityInUse(m.handle));
            }
        }
        if self.would_overlap(spec.position) {
            return Err(IncidentError::Overlap(spec.position));
        }

        let id = IncidentId(self.next_id);
        self.next_id += 1;
        let mut incident = Incident::new(id, spec, now, IncidentRng::new(self.seed, id));

        for h in incident.handles() {
            if let Err(e) = world.set_protection_flags(h, Protection::SCRIPTED) {
                warn!(incident = %id, entity = %h, error = %e, "could not protect member");
            }
        }
        incident.marker = observer.on_created(&incident);
        info!(
            incident = %id,
            kind = %incident.kind,
            position = %incident.position,
            owner = %incident.owner,
            members = incident.members.len(),
            "incident created"
        );
        self.incidents.push(incident);
        Ok(id)
    }

    // ── Player interaction ────────────────────────────────────────────────

    /// Queue a player interaction; the current phase consumes it on the
    /// next tick.  Refused while the incident is not accepting interaction.
    pub fn interact(&mut self, id: IncidentId, interaction: Interaction) -> IncidentResult<()> {
        let inc = self
            .incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(IncidentError::NotFound(id))?;
        if !inc.flags.can_interact {
            return Err(IncidentError::InteractionRejected { id, reason: "not accepting interaction" });
        }
        debug!(incident = %id, ?interaction, phase = %inc.phase, "interaction queued");
        inc.pending = Some(interaction);
        Ok(())
    }

    // ── Cancellation ──────────────────────────────────────────────────────

    pub fn cancel<W, O>(
        &mut self,
        id:       IncidentId,
        world:    &mut W,
        arbiter:  &mut OwnershipArbiter,
        observer: &mut O,
    ) -> IncidentResult<()>
    where
        W: World + ?Sized,
        O: IncidentObserver + ?Sized,
    {
        let idx = self.index_of(id).ok_or(IncidentError::NotFound(id))?;
        let inc = self.incidents.remove(idx);
        teardown(inc, &TeardownReason::Cancelled, world, arbiter, observer);
        Ok(())
    }

    /// Cancel every incident.  Returns how many were active.
    pub fn cancel_all<W, O>(&mut self, world: &mut W, arbiter: &mut OwnershipArbiter, observer: &mut O) -> usize
    where
        W: World + ?Sized,
        O: IncidentObserver + ?Sized,
    {
        let all = std::mem::take(&mut self.incidents);
        let n = all.len();
        for inc in all {
            teardown(inc, &TeardownReason::Cancelled, world, arbiter, observer);
        }
        n
    }

    /// Cancel every incident created by `owner`.
    pub fn cancel_owned_by<W, O>(
        &mut self,
        owner:    &OwnerId,
        world:    &mut W,
        arbiter:  &mut OwnershipArbiter,
        observer: &mut O,
    ) -> usize
    where
        W: World + ?Sized,
        O: IncidentObserver + ?Sized,
    {
        let (doomed, kept): (Vec<Incident>, Vec<Incident>) =
            std::mem::take(&mut self.incidents).into_iter().partition(|i| &i.owner == owner);
        self.incidents = kept;
        let n = doomed.len();
        for inc in doomed {
            teardown(inc, &TeardownReason::Cancelled, world, arbiter, observer);
        }
        n
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance every incident by one tick.  See the crate docs for the
    /// two-pass shape.
    pub fn tick<W, O>(
        &mut self,
        clock:     &SimClock,
        world:     &mut W,
        arbiter:   &mut OwnershipArbiter,
        placement: &PlacementValidator,
        observer:  &mut O,
    ) -> TickReport
    where
        W: World + ?Sized,
        O: IncidentObserver + ?Sized,
    {
        let mut report = TickReport::default();

        // ① validity
        let invalid: Vec<(IncidentId, TeardownReason)> = self
            .incidents
            .iter()
            .filter_map(|inc| self.check_validity(inc, clock, &*world, arbiter).map(|r| (inc.id, r)))
            .collect();
        for (id, reason) in invalid {
            self.remove_and_teardown(id, reason, world, arbiter, observer, &mut report);
        }

        // ② phases
        let mut finished = Vec::new();
        for inc in self.incidents.iter_mut() {
            if let Some(reason) = advance(inc, &self.config, clock, world, arbiter, placement, observer, &mut report) {
                finished.push((inc.id, reason));
            }
        }
        for (id, reason) in finished {
            self.remove_and_teardown(id, reason, world, arbiter, observer, &mut report);
        }
        report
    }

    fn check_validity<W: World + ?Sized>(
        &self,
        inc:     &Incident,
        clock:   &SimClock,
        world:   &W,
        arbiter: &OwnershipArbiter,
    ) -> Option<TeardownReason> {
        if inc.age_secs(clock) > self.config.max_age_secs {
            return Some(TeardownReason::AgeCap);
        }
        if let Some(h) = inc.handles().find(|h| !world.exists(*h) || !world.is_alive(*h)) {
            return Some(TeardownReason::ParticipantInvalid(h));
        }
        if let Some(h) = inc.handles().find(|h| !arbiter.holds(*h, &inc.owner)) {
            return Some(TeardownReason::OwnershipLost(h));
        }
        None
    }

    fn index_of(&self, id: IncidentId) -> Option<usize> {
        self.incidents.iter().position(|i| i.id == id)
    }

    fn remove_and_teardown<W, O>(
        &mut self,
        id:       IncidentId,
        reason:   TeardownReason,
        world:    &mut W,
        arbiter:  &mut OwnershipArbiter,
        observer: &mut O,
        report:   &mut TickReport,
    ) where
        W: World + ?Sized,
        O: IncidentObserver + ?Sized,
    {
        if let Some(idx) = self.index_of(id) {
            let inc = self.incidents.remove(idx);
            teardown(inc, &reason, world, arbiter, observer);
            report.torn_down.push((id, reason));
        }
    }
}

// ── Phase pass ────────────────────────────────────────────────────────────────

/// Run one incident's current phase.  Returns a teardown reason once the
/// incident has reached (or been forced to) its terminal phase.
#[allow(clippy::too_many_arguments)]
fn advance<W, O>(
    inc:       &mut Incident,
    config:    &IncidentConfig,
    clock:     &SimClock,
    world:     &mut W,
    arbiter:   &mut OwnershipArbiter,
    placement: &PlacementValidator,
    observer:  &mut O,
    report:    &mut TickReport,
) -> Option<TeardownReason>
where
    W: World + ?Sized,
    O: IncidentObserver + ?Sized,
{
    let now = clock.now();

    if let Some(h) = inc.phase.tracked_role().and_then(|r| inc.member(r)) {
        if let Some(p) = world.position(h) {
            inc.position = p;
        }
    }

    let mut ctx = PhaseCtx { clock, world, arbiter, placement, config, advisories: Vec::new() };
    let result = handlers::step(inc, &mut ctx);
    for message in ctx.advisories.drain(..) {
        observer.on_advisory(inc.id, &message);
    }

    let from = inc.phase;
    let overdue = inc.phase_secs(clock) > from.max_dwell_secs(config);
    match result {
        Ok(Step::Advance(next)) if from.can_transition_to(next) => {
            inc.enter_phase(next, now);
            report.transitions += 1;
            debug!(incident = %inc.id, %from, to = %next, "phase changed");
            observer.on_phase_changed(inc.id, from, next, now);
        }
        Ok(Step::Advance(next)) => {
            warn!(incident = %inc.id, %from, to = %next, "illegal transition refused");
            force_terminal(inc, now, observer);
            return Some(TeardownReason::Fault(from));
        }
        Ok(Step::Stay) if overdue => {
            warn!(incident = %inc.id, phase = %from, "phase timed out");
            force_terminal(inc, now, observer);
            return Some(TeardownReason::PhaseTimeout(from));
        }
        Ok(Step::Stay) => {}
        Err(e) => {
            inc.faults += 1;
            report.errors += 1;
            warn!(incident = %inc.id, phase = %from, error = %e, "phase handler failed");
            if overdue {
                force_terminal(inc, now, observer);
                return Some(TeardownReason::PhaseTimeout(from));
            }
        }
    }

    inc.phase.is_terminal().then_some(TeardownReason::Completed)
}

fn force_terminal<O: IncidentObserver + ?Sized>(inc: &mut Incident, now: Tick, observer: &mut O) {
    let from = inc.phase;
    let to = Phase::terminal(inc.kind);
    if from != to {
        inc.enter_phase(to, now);
        observer.on_phase_changed(inc.id, from, to, now);
    }
}

// ── Teardown ──────────────────────────────────────────────────────────────────

/// Release what the incident still holds and hand it back to the host.
///
/// Members that another owner has since taken over are left alone.
fn teardown<W, O>(
    inc:      Incident,
    reason:   &TeardownReason,
    world:    &mut W,
    arbiter:  &mut OwnershipArbiter,
    observer: &mut O,
) where
    W: World + ?Sized,
    O: IncidentObserver + ?Sized,
{
    let mut released = 0usize;
    for h in inc.handles() {
        if arbiter.release_if_owned(h, &inc.owner) {
            world.mark_non_essential(h);
            released += 1;
        }
    }
    if reason.is_clean() {
        info!(incident = %inc.id, kind = %inc.kind, %reason, released, "incident torn down");
    } else {
        warn!(incident = %inc.id, kind = %inc.kind, phase = %inc.phase, %reason, released, "incident torn down");
    }
    observer.on_torn_down(inc.id, inc.kind, inc.marker, reason);
}
