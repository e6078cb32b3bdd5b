//! Fire-and-forget behavior requests sent to world entities.
//!
//! A directive only asks the host to start doing something.  Acceptance
//! says nothing about completion; phase handlers observe the world on later
//! ticks to see whether an agent actually reached its seat or target.

use amb_core::{EntityHandle, Vec3};

use crate::DirectiveResult;

/// Seat to take when entering a vehicle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Seat {
    Driver,
    Passenger,
    RearLeft,
    RearRight,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveSpeed {
    Walk,
    Run,
}

/// Scripted interaction animations.  Which clip plays is up to the host.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractionKind {
    InspectEngine,
    Repair,
    PhoneCall,
    Wave,
    Thank,
    Argue,
    Cower,
    Collapse,
    Treat,
    WriteTicket,
    Cuff,
    Talk,
    HookUp,
}

/// Host protection flags.
///
/// `essential` keeps the host from recycling the entity while an incident
/// still needs it; clearing it hands the entity back to normal population
/// management.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Protection {
    pub essential:          bool,
    pub ignore_world_events: bool,
}

impl Protection {
    /// Released to the world: no protection at all.
    pub const NONE: Protection = Protection { essential: false, ignore_world_events: false };

    /// Held by a scripted scene.
    pub const SCRIPTED: Protection = Protection { essential: true, ignore_world_events: true };
}

/// One behavior request for one entity.
#[derive(Clone, PartialEq, Debug)]
pub enum Directive {
    /// Walk or run to a point.
    MoveTo { target: Vec3, speed: MoveSpeed },
    /// Drive the vehicle the agent is in to a point.
    DriveTo { target: Vec3, speed_mps: f32 },
    /// Resume ambient wandering / cruising.
    Wander,
    /// Keep within `distance` metres of `target`.
    Follow { target: EntityHandle, distance: f32 },
    EnterVehicle { vehicle: EntityHandle, seat: Seat },
    LeaveVehicle,
    PlayInteraction(InteractionKind),
    FleeFrom { threat: EntityHandle },
    Engage { target: EntityHandle },
    /// Attach `vehicle` to the tow truck this directive is issued to.
    Tow { vehicle: EntityHandle },
    SetProtection(Protection),
    /// Drop whatever the entity is doing.
    ClearTasks,
}

impl Directive {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Directive::MoveTo { .. }       => "move_to",
            Directive::DriveTo { .. }      => "drive_to",
            Directive::Wander              => "wander",
            Directive::Follow { .. }       => "follow",
            Directive::EnterVehicle { .. } => "enter_vehicle",
            Directive::LeaveVehicle        => "leave_vehicle",
            Directive::PlayInteraction(_)  => "play_interaction",
            Directive::FleeFrom { .. }     => "flee_from",
            Directive::Engage { .. }       => "engage",
            Directive::Tow { .. }          => "tow",
            Directive::SetProtection(_)    => "set_protection",
            Directive::ClearTasks          => "clear_tasks",
        }
    }
}

/// Receives directives.  Implemented by the host adapter.
pub trait DirectiveSink {
    /// Ask the host to start `directive` on `entity`.
    ///
    /// Must not block.  An `Ok` means the request was accepted, not that it
    /// finished.
    fn issue(&mut self, entity: EntityHandle, directive: Directive) -> DirectiveResult;
}

/// Named helpers over [`DirectiveSink::issue`], available on every sink.
pub trait Directives: DirectiveSink {
    fn move_to(&mut self, entity: EntityHandle, target: Vec3) -> DirectiveResult {
        self.issue(entity, Directive::MoveTo { target, speed: MoveSpeed::Walk })
    }

    fn run_to(&mut self, entity: EntityHandle, target: Vec3) -> DirectiveResult {
        self.issue(entity, Directive::MoveTo { target, speed: MoveSpeed::Run })
    }

    fn drive_to(&mut self, driver: EntityHandle, target: Vec3, speed_mps: f32) -> DirectiveResult {
        self.issue(driver, Directive::DriveTo { target, speed_mps })
    }

    fn enter_vehicle(&mut self, entity: EntityHandle, vehicle: EntityHandle, seat: Seat) -> DirectiveResult {
        self.issue(entity, Directive::EnterVehicle { vehicle, seat })
    }

    fn leave_vehicle(&mut self, entity: EntityHandle) -> DirectiveResult {
        self.issue(entity, Directive::LeaveVehicle)
    }

    fn play_interaction(&mut self, entity: EntityHandle, kind: InteractionKind) -> DirectiveResult {
        self.issue(entity, Directive::PlayInteraction(kind))
    }

    fn flee_from(&mut self, entity: EntityHandle, threat: EntityHandle) -> DirectiveResult {
        self.issue(entity, Directive::FleeFrom { threat })
    }

    fn engage(&mut self, entity: EntityHandle, target: EntityHandle) -> DirectiveResult {
        self.issue(entity, Directive::Engage { target })
    }

    fn set_protection_flags(&mut self, entity: EntityHandle, flags: Protection) -> DirectiveResult {
        self.issue(entity, Directive::SetProtection(flags))
    }

    fn wander(&mut self, entity: EntityHandle) -> DirectiveResult {
        self.issue(entity, Directive::Wander)
    }
}

impl<T: DirectiveSink + ?Sized> Directives for T {}
