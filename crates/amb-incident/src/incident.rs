//! The incident record and its creation request.

use amb_core::{EntityHandle, EntityKind, IncidentId, IncidentRng, MarkerRef, OwnerId, SimClock, Tick, Vec3};

use crate::{IncidentKind, Interaction, Phase, Role};

/// One entity taking part in an incident.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub role:   Role,
    pub handle: EntityHandle,
    pub kind:   EntityKind,
}

/// Flags the presentation layer and interaction code read.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionFlags {
    /// The player may interact with the incident right now.
    pub can_interact:    bool,
    /// Emergency services (tow, ambulance, police) have been called.
    pub services_called: bool,
    /// The player fixed the broken-down vehicle.
    pub is_repaired:     bool,
    /// The player offered a ride and it was accepted.
    pub ride_accepted:   bool,
}

/// Per-phase bookkeeping, reset on every phase change.
#[derive(Clone, Debug, Default)]
pub(crate) struct PhaseScratch {
    /// Bit set of one-shot steps already carried out in this phase.
    done:        u32,
    /// Sampled dwell for this phase, once rolled.
    dwell:       Option<f32>,
    /// Start of a sub-step timer (e.g. when a vehicle drove off).
    anchor:      Option<Tick>,
    /// Last time a retried order was issued, per entity.
    last_retry:  Vec<(EntityHandle, Tick)>,
}

/// A live scripted scenario.
#[derive(Debug)]
pub struct Incident {
    pub id:               IncidentId,
    pub kind:             IncidentKind,
    pub owner:            OwnerId,
    pub priority:         i32,
    pub phase:            Phase,
    /// Anchor position; follows the tracked member while the phase moves.
    pub position:         Vec3,
    pub created_at:       Tick,
    pub phase_entered_at: Tick,
    pub members:          Vec<Member>,
    pub marker:           Option<MarkerRef>,
    pub flags:            InteractionFlags,
    /// The player's vehicle carrying a passenger.  Never owned.
    pub ride_vehicle:     Option<EntityHandle>,
    /// Where a passenger wants to be dropped off, once chosen.
    pub destination:      Option<Vec3>,
    /// Handler errors seen over the incident's life.
    pub faults:           u32,

    pub(crate) rng:       IncidentRng,
    pub(crate) pending:   Option<Interaction>,
    pub(crate) scratch:   PhaseScratch,
}

impl Incident {
    pub(crate) fn new(id: IncidentId, spec: IncidentSpec, now: Tick, rng: IncidentRng) -> Self {
        let phase = Phase::initial(spec.kind);
        Self {
            id,
            kind:             spec.kind,
            owner:            spec.owner,
            priority:         spec.priority,
            phase,
            position:         spec.position,
            created_at:       now,
            phase_entered_at: now,
            members:          spec.members,
            marker:           None,
            flags:            InteractionFlags { can_interact: phase.accepts_interaction(), ..Default::default() },
            ride_vehicle:     None,
            destination:      None,
            faults:           0,
            rng,
            pending:          None,
            scratch:          PhaseScratch::default(),
        }
    }

    // ── Members ───────────────────────────────────────────────────────────

    /// First member playing `role`.
    pub fn member(&self, role: Role) -> Option<EntityHandle> {
        self.members.iter().find(|m| m.role == role).map(|m| m.handle)
    }

    /// Every member playing `role`, in enlistment order.
    pub fn members_with(&self, role: Role) -> impl Iterator<Item = EntityHandle> + '_ {
        self.members.iter().filter(move |m| m.role == role).map(|m| m.handle)
    }

    pub fn role_of(&self, handle: EntityHandle) -> Option<Role> {
        self.members.iter().find(|m| m.handle == handle).map(|m| m.role)
    }

    pub fn involves(&self, handle: EntityHandle) -> bool {
        self.members.iter().any(|m| m.handle == handle)
    }

    /// Participating agents.
    pub fn participants(&self) -> Vec<EntityHandle> {
        self.of_kind(EntityKind::Agent)
    }

    /// Participating vehicles.
    pub fn vehicles(&self) -> Vec<EntityHandle> {
        self.of_kind(EntityKind::Vehicle)
    }

    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.members.iter().map(|m| m.handle)
    }

    fn of_kind(&self, kind: EntityKind) -> Vec<EntityHandle> {
        self.members.iter().filter(|m| m.kind == kind).map(|m| m.handle).collect()
    }

    pub(crate) fn enlist(&mut self, role: Role, handle: EntityHandle, kind: EntityKind) {
        if !self.involves(handle) {
            self.members.push(Member { role, handle, kind });
        }
    }

    // ── Time ──────────────────────────────────────────────────────────────

    pub fn age_secs(&self, clock: &SimClock) -> f32 {
        clock.secs_since(self.created_at)
    }

    pub fn phase_secs(&self, clock: &SimClock) -> f32 {
        clock.secs_since(self.phase_entered_at)
    }

    // ── Phase bookkeeping ─────────────────────────────────────────────────

    pub(crate) fn enter_phase(&mut self, next: Phase, now: Tick) {
        self.phase = next;
        self.phase_entered_at = now;
        self.scratch = PhaseScratch::default();
        self.flags.can_interact = next.accepts_interaction();
        if !self.flags.can_interact {
            self.pending = None;
        }
    }

    pub(crate) fn take_interaction(&mut self) -> Option<Interaction> {
        self.pending.take()
    }

    /// Whether one-shot step `bit` has already run in this phase.
    pub(crate) fn done(&self, bit: u32) -> bool {
        self.scratch.done & (1 << bit) != 0
    }

    pub(crate) fn mark(&mut self, bit: u32) {
        self.scratch.done |= 1 << bit;
    }

    /// This phase's dwell, sampled once from `[lo, hi]`.
    pub(crate) fn dwell(&mut self, range: [f32; 2]) -> f32 {
        if let Some(d) = self.scratch.dwell {
            return d;
        }
        let d = self.rng.between(range[0], range[1]);
        self.scratch.dwell = Some(d);
        d
    }

    /// Start the sub-step timer if it is not running yet.
    pub(crate) fn start_anchor(&mut self, now: Tick) {
        self.scratch.anchor.get_or_insert(now);
    }

    /// Seconds since the sub-step timer started (`None` if it has not).
    pub(crate) fn anchor_secs(&self, clock: &SimClock) -> Option<f32> {
        self.scratch.anchor.map(|t| clock.secs_since(t))
    }

    /// `true` if an order for `handle` has not been (re)issued within the
    /// last `every_secs`; records `now` as the issue time when it returns
    /// `true`.
    pub(crate) fn retry_due(&mut self, handle: EntityHandle, clock: &SimClock, every_secs: f32) -> bool {
        let now = clock.now();
        match self.scratch.last_retry.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, t)) if clock.secs_between(*t, now) < every_secs => false,
            Some((_, t)) => {
                *t = now;
                true
            }
            None => {
                self.scratch.last_retry.push((handle, now));
                true
            }
        }
    }
}

// ── IncidentSpec ──────────────────────────────────────────────────────────────

/// A request to start an incident over entities the caller already owns.
#[derive(Clone, Debug)]
pub struct IncidentSpec {
    pub kind:     IncidentKind,
    pub position: Vec3,
    pub owner:    OwnerId,
    pub priority: i32,
    pub members:  Vec<Member>,
}

impl IncidentSpec {
    pub fn new(kind: IncidentKind, position: Vec3, owner: OwnerId, priority: i32) -> Self {
        Self { kind, position, owner, priority, members: Vec::new() }
    }

    pub fn agent(mut self, role: Role, handle: EntityHandle) -> Self {
        self.members.push(Member { role, handle, kind: EntityKind::Agent });
        self
    }

    pub fn vehicle(mut self, role: Role, handle: EntityHandle) -> Self {
        self.members.push(Member { role, handle, kind: EntityKind::Vehicle });
        self
    }
}
