//! Named phases per incident kind and their transition tables.
//!
//! Each kind has its own enum so a handler can only name phases of its own
//! kind.  [`PhaseSet::successors`] is the explicit transition table; the
//! engine refuses any step a table does not list.  `Terminal` is reachable
//! from every phase (timeouts and cancellations force it).

use std::fmt;

use crate::{IncidentConfig, IncidentKind, Role};

/// Behavior shared by every per-kind phase enum.
pub trait PhaseSet: Copy + Eq + fmt::Debug + 'static {
    const INITIAL: Self;
    const TERMINAL: Self;

    /// Phases reachable in one step, besides `TERMINAL`.
    fn successors(self) -> &'static [Self];

    /// Longest time an incident may sit in this phase before it is forced
    /// to `TERMINAL`.
    fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32;

    fn name(self) -> &'static str;

    /// Whether the player may interact while in this phase.
    fn accepts_interaction(self) -> bool {
        false
    }

    /// Member whose position the incident follows while in this phase.
    fn tracked_role(self) -> Option<Role> {
        None
    }

    fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    fn can_transition_to(self, next: Self) -> bool {
        next == Self::TERMINAL || self.successors().contains(&next)
    }
}

fn slack(secs: f32) -> f32 {
    secs + 1.0
}

// ── Breakdown ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakdownPhase {
    Inspecting,
    Diagnosing,
    Repairing,
    Departing,
    TowCalled,
    TowEnRoute,
    TowArrived,
    Loading,
    TowDeparting,
    RideOffered,
    FollowingOnFoot,
    BoardingVehicle,
    TransportingToDestination,
    Dropoff,
    Terminal,
}

impl PhaseSet for BreakdownPhase {
    const INITIAL: Self = BreakdownPhase::Inspecting;
    const TERMINAL: Self = BreakdownPhase::Terminal;

    fn successors(self) -> &'static [Self] {
        use BreakdownPhase::*;
        match self {
            Inspecting                => &[Diagnosing],
            Diagnosing                => &[Repairing, TowCalled, RideOffered],
            Repairing                 => &[Departing],
            Departing                 => &[],
            TowCalled                 => &[TowEnRoute],
            TowEnRoute                => &[TowArrived],
            TowArrived                => &[Loading],
            Loading                   => &[TowDeparting],
            TowDeparting              => &[],
            RideOffered               => &[FollowingOnFoot],
            FollowingOnFoot           => &[BoardingVehicle],
            BoardingVehicle           => &[TransportingToDestination],
            TransportingToDestination => &[Dropoff],
            Dropoff                   => &[],
            Terminal                  => &[],
        }
    }

    fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32 {
        use BreakdownPhase::*;
        match self {
            Inspecting                => slack(cfg.inspect_secs[1]),
            Diagnosing                => cfg.interaction_window_secs,
            Repairing                 => slack(cfg.repair_secs),
            Departing                 => cfg.boarding_timeout_secs + cfg.departure_secs,
            TowCalled                 => cfg.spawn_timeout_secs,
            TowEnRoute                => cfg.service_timeout_secs,
            TowArrived                => cfg.approach_timeout_secs,
            Loading                   => cfg.scene_secs[1] + cfg.boarding_timeout_secs,
            TowDeparting              => slack(cfg.departure_secs),
            RideOffered               => slack(cfg.beat_secs[1]),
            FollowingOnFoot           => cfg.follow_timeout_secs,
            BoardingVehicle           => cfg.boarding_timeout_secs,
            TransportingToDestination => cfg.transport_timeout_secs,
            Dropoff                   => cfg.boarding_timeout_secs + cfg.beat_secs[1],
            Terminal                  => f32::INFINITY,
        }
    }

    fn name(self) -> &'static str {
        use BreakdownPhase::*;
        match self {
            Inspecting                => "inspecting",
            Diagnosing                => "diagnosing",
            Repairing                 => "repairing",
            Departing                 => "departing",
            TowCalled                 => "tow_called",
            TowEnRoute                => "tow_en_route",
            TowArrived                => "tow_arrived",
            Loading                   => "loading",
            TowDeparting              => "tow_departing",
            RideOffered               => "ride_offered",
            FollowingOnFoot           => "following_on_foot",
            BoardingVehicle           => "boarding_vehicle",
            TransportingToDestination => "transporting",
            Dropoff                   => "dropoff",
            Terminal                  => "terminal",
        }
    }

    fn accepts_interaction(self) -> bool {
        self == BreakdownPhase::Diagnosing
    }
}

// ── Police stop ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoliceStopPhase {
    Stopping,
    OfficerApproaching,
    Questioning,
    Citing,
    Arresting,
    Escorting,
    SuspectFleeing,
    Pursuit,
    Dispersing,
    Terminal,
}

impl PhaseSet for PoliceStopPhase {
    const INITIAL: Self = PoliceStopPhase::Stopping;
    const TERMINAL: Self = PoliceStopPhase::Terminal;

    fn successors(self) -> &'static [Self] {
        use PoliceStopPhase::*;
        match self {
            Stopping           => &[OfficerApproaching],
            OfficerApproaching => &[Questioning],
            Questioning        => &[Citing, Arresting, SuspectFleeing],
            Citing             => &[Dispersing],
            Arresting          => &[Escorting],
            Escorting          => &[Dispersing],
            SuspectFleeing     => &[Pursuit],
            Pursuit            => &[Dispersing],
            Dispersing         => &[],
            Terminal           => &[],
        }
    }

    fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32 {
        use PoliceStopPhase::*;
        match self {
            Stopping           => cfg.service_timeout_secs,
            OfficerApproaching => cfg.boarding_timeout_secs + cfg.approach_timeout_secs,
            Questioning        => slack(cfg.scene_secs[1]),
            Citing             => slack(cfg.scene_secs[1]),
            Arresting          => cfg.boarding_timeout_secs + cfg.scene_secs[1],
            Escorting          => cfg.boarding_timeout_secs,
            SuspectFleeing     => cfg.boarding_timeout_secs,
            Pursuit            => cfg.chase_timeout_secs,
            Dispersing         => cfg.boarding_timeout_secs + cfg.departure_secs,
            Terminal           => f32::INFINITY,
        }
    }

    fn name(self) -> &'static str {
        use PoliceStopPhase::*;
        match self {
            Stopping           => "stopping",
            OfficerApproaching => "officer_approaching",
            Questioning        => "questioning",
            Citing             => "citing",
            Arresting          => "arresting",
            Escorting          => "escorting",
            SuspectFleeing     => "suspect_fleeing",
            Pursuit            => "pursuit",
            Dispersing         => "dispersing",
            Terminal           => "terminal",
        }
    }

    fn tracked_role(self) -> Option<Role> {
        match self {
            PoliceStopPhase::SuspectFleeing | PoliceStopPhase::Pursuit => Some(Role::SuspectVehicle),
            _ => None,
        }
    }
}

// ── Accident ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccidentPhase {
    Aftermath,
    Arguing,
    ExchangingDetails,
    Fighting,
    Dispersing,
    Terminal,
}

impl PhaseSet for AccidentPhase {
    const INITIAL: Self = AccidentPhase::Aftermath;
    const TERMINAL: Self = AccidentPhase::Terminal;

    fn successors(self) -> &'static [Self] {
        use AccidentPhase::*;
        match self {
            Aftermath         => &[Arguing],
            Arguing           => &[ExchangingDetails, Fighting],
            ExchangingDetails => &[Dispersing],
            Fighting          => &[Dispersing],
            Dispersing        => &[],
            Terminal          => &[],
        }
    }

    fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32 {
        use AccidentPhase::*;
        match self {
            Aftermath         => cfg.boarding_timeout_secs + cfg.scene_secs[1],
            Arguing           => cfg.approach_timeout_secs + cfg.scene_secs[1],
            ExchangingDetails => slack(cfg.scene_secs[1]),
            Fighting          => slack(cfg.scene_secs[1]),
            Dispersing        => cfg.boarding_timeout_secs + cfg.departure_secs,
            Terminal          => f32::INFINITY,
        }
    }

    fn name(self) -> &'static str {
        use AccidentPhase::*;
        match self {
            Aftermath         => "aftermath",
            Arguing           => "arguing",
            ExchangingDetails => "exchanging_details",
            Fighting          => "fighting",
            Dispersing        => "dispersing",
            Terminal          => "terminal",
        }
    }

    fn accepts_interaction(self) -> bool {
        !matches!(self, AccidentPhase::Dispersing | AccidentPhase::Terminal)
    }
}

// ── Paramedics ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamedicsPhase {
    Collapsed,
    AwaitingHelp,
    AmbulanceEnRoute,
    Treating,
    LoadingPatient,
    AmbulanceDeparting,
    Recovering,
    Terminal,
}

impl PhaseSet for ParamedicsPhase {
    const INITIAL: Self = ParamedicsPhase::Collapsed;
    const TERMINAL: Self = ParamedicsPhase::Terminal;

    fn successors(self) -> &'static [Self] {
        use ParamedicsPhase::*;
        match self {
            Collapsed          => &[AwaitingHelp],
            AwaitingHelp       => &[AmbulanceEnRoute, Recovering],
            AmbulanceEnRoute   => &[Treating],
            Treating           => &[LoadingPatient],
            LoadingPatient     => &[AmbulanceDeparting],
            AmbulanceDeparting => &[],
            Recovering         => &[],
            Terminal           => &[],
        }
    }

    fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32 {
        use ParamedicsPhase::*;
        match self {
            Collapsed          => slack(cfg.beat_secs[1]),
            AwaitingHelp       => slack(cfg.unattended_recovery_secs),
            AmbulanceEnRoute   => cfg.spawn_timeout_secs + cfg.service_timeout_secs,
            Treating           => cfg.boarding_timeout_secs + cfg.approach_timeout_secs + cfg.scene_secs[1],
            LoadingPatient     => cfg.boarding_timeout_secs,
            AmbulanceDeparting => slack(cfg.departure_secs),
            Recovering         => slack(cfg.scene_secs[1]),
            Terminal           => f32::INFINITY,
        }
    }

    fn name(self) -> &'static str {
        use ParamedicsPhase::*;
        match self {
            Collapsed          => "collapsed",
            AwaitingHelp       => "awaiting_help",
            AmbulanceEnRoute   => "ambulance_en_route",
            Treating           => "treating",
            LoadingPatient     => "loading_patient",
            AmbulanceDeparting => "ambulance_departing",
            Recovering         => "recovering",
            Terminal           => "terminal",
        }
    }

    fn accepts_interaction(self) -> bool {
        self == ParamedicsPhase::AwaitingHelp
    }
}

// ── Altercation ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AltercationPhase {
    Confrontation,
    Chasing,
    Brawling,
    Escaped,
    Terminal,
}

impl PhaseSet for AltercationPhase {
    const INITIAL: Self = AltercationPhase::Confrontation;
    const TERMINAL: Self = AltercationPhase::Terminal;

    fn successors(self) -> &'static [Self] {
        use AltercationPhase::*;
        match self {
            Confrontation => &[Chasing],
            Chasing       => &[Brawling, Escaped],
            Brawling      => &[],
            Escaped       => &[],
            Terminal      => &[],
        }
    }

    fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32 {
        use AltercationPhase::*;
        match self {
            Confrontation => cfg.approach_timeout_secs + cfg.scene_secs[1],
            Chasing       => cfg.chase_timeout_secs,
            Brawling      => slack(cfg.scene_secs[1]),
            Escaped       => slack(cfg.beat_secs[1]),
            Terminal      => f32::INFINITY,
        }
    }

    fn name(self) -> &'static str {
        use AltercationPhase::*;
        match self {
            Confrontation => "confrontation",
            Chasing       => "chasing",
            Brawling      => "brawling",
            Escaped       => "escaped",
            Terminal      => "terminal",
        }
    }

    fn tracked_role(self) -> Option<Role> {
        Some(Role::Aggressor)
    }
}

// ── Phase ─────────────────────────────────────────────────────────────────────

/// The current phase of an incident of any kind.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Breakdown(BreakdownPhase),
    PoliceStop(PoliceStopPhase),
    Accident(AccidentPhase),
    Paramedics(ParamedicsPhase),
    Altercation(AltercationPhase),
}

/// Forward a `PhaseSet` method to whichever per-kind enum is inside.
macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            Phase::Breakdown($p)   => $body,
            Phase::PoliceStop($p)  => $body,
            Phase::Accident($p)    => $body,
            Phase::Paramedics($p)  => $body,
            Phase::Altercation($p) => $body,
        }
    };
}

impl Phase {
    pub fn initial(kind: IncidentKind) -> Phase {
        match kind {
            IncidentKind::Breakdown   => Phase::Breakdown(BreakdownPhase::INITIAL),
            IncidentKind::PoliceStop  => Phase::PoliceStop(PoliceStopPhase::INITIAL),
            IncidentKind::Accident    => Phase::Accident(AccidentPhase::INITIAL),
            IncidentKind::Paramedics  => Phase::Paramedics(ParamedicsPhase::INITIAL),
            IncidentKind::Altercation => Phase::Altercation(AltercationPhase::INITIAL),
        }
    }

    pub fn terminal(kind: IncidentKind) -> Phase {
        match kind {
            IncidentKind::Breakdown   => Phase::Breakdown(BreakdownPhase::TERMINAL),
            IncidentKind::PoliceStop  => Phase::PoliceStop(PoliceStopPhase::TERMINAL),
            IncidentKind::Accident    => Phase::Accident(AccidentPhase::TERMINAL),
            IncidentKind::Paramedics  => Phase::Paramedics(ParamedicsPhase::TERMINAL),
            IncidentKind::Altercation => Phase::Altercation(AltercationPhase::TERMINAL),
        }
    }

    pub fn kind(self) -> IncidentKind {
        match self {
            Phase::Breakdown(_)   => IncidentKind::Breakdown,
            Phase::PoliceStop(_)  => IncidentKind::PoliceStop,
            Phase::Accident(_)    => IncidentKind::Accident,
            Phase::Paramedics(_)  => IncidentKind::Paramedics,
            Phase::Altercation(_) => IncidentKind::Altercation,
        }
    }

    pub fn name(self) -> &'static str {
        dispatch!(self, p => p.name())
    }

    pub fn is_terminal(self) -> bool {
        dispatch!(self, p => p.is_terminal())
    }

    pub fn max_dwell_secs(self, cfg: &IncidentConfig) -> f32 {
        dispatch!(self, p => p.max_dwell_secs(cfg))
    }

    pub fn accepts_interaction(self) -> bool {
        dispatch!(self, p => p.accepts_interaction())
    }

    pub fn tracked_role(self) -> Option<Role> {
        dispatch!(self, p => p.tracked_role())
    }

    /// Whether `next` is a legal single step from `self`.  Always false
    /// across kinds.
    pub fn can_transition_to(self, next: Phase) -> bool {
        match (self, next) {
            (Phase::Breakdown(a), Phase::Breakdown(b))     => a.can_transition_to(b),
            (Phase::PoliceStop(a), Phase::PoliceStop(b))   => a.can_transition_to(b),
            (Phase::Accident(a), Phase::Accident(b))       => a.can_transition_to(b),
            (Phase::Paramedics(a), Phase::Paramedics(b))   => a.can_transition_to(b),
            (Phase::Altercation(a), Phase::Altercation(b)) => a.can_transition_to(b),
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

impl From<BreakdownPhase> for Phase {
    fn from(p: BreakdownPhase) -> Self {
        Phase::Breakdown(p)
    }
}

impl From<PoliceStopPhase> for Phase {
    fn from(p: PoliceStopPhase) -> Self {
        Phase::PoliceStop(p)
    }
}

impl From<AccidentPhase> for Phase {
    fn from(p: AccidentPhase) -> Self {
        Phase::Accident(p)
    }
}

impl From<ParamedicsPhase> for Phase {
    fn from(p: ParamedicsPhase) -> Self {
        Phase::Paramedics(p)
    }
}

impl From<AltercationPhase> for Phase {
    fn from(p: AltercationPhase) -> Self {
        Phase::Altercation(p)
    }
}
