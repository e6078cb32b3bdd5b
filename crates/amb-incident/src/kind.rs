//! Incident kinds, member roles, and player interactions.

use std::fmt;

/// The scripted scenario an incident plays out.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncidentKind {
    /// A stalled car and its stranded driver.
    Breakdown,
    /// A patrol car pulling over a motorist.
    PoliceStop,
    /// Two vehicles after a collision.
    Accident,
    /// A pedestrian in medical distress.
    Paramedics,
    /// One pedestrian going after another on foot.
    Altercation,
}

impl IncidentKind {
    pub const ALL: [IncidentKind; 5] = [
        IncidentKind::Breakdown,
        IncidentKind::PoliceStop,
        IncidentKind::Accident,
        IncidentKind::Paramedics,
        IncidentKind::Altercation,
    ];

    /// Roles that must be filled when the incident is created.
    pub fn required_roles(self) -> &'static [Role] {
        match self {
            IncidentKind::Breakdown   => &[Role::Driver, Role::Car],
            IncidentKind::PoliceStop  => &[Role::Officer, Role::Cruiser, Role::Suspect, Role::SuspectVehicle],
            IncidentKind::Accident    => &[Role::Driver, Role::Car, Role::OtherDriver, Role::OtherVehicle],
            IncidentKind::Paramedics  => &[Role::Victim],
            IncidentKind::Altercation => &[Role::Aggressor, Role::Victim],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentKind::Breakdown   => "breakdown",
            IncidentKind::PoliceStop  => "police_stop",
            IncidentKind::Accident    => "accident",
            IncidentKind::Paramedics  => "paramedics",
            IncidentKind::Altercation => "altercation",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part a member entity plays in its incident.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Driver,
    Car,
    OtherDriver,
    OtherVehicle,
    TowTruck,
    TowDriver,
    Officer,
    Cruiser,
    Suspect,
    SuspectVehicle,
    Victim,
    Aggressor,
    Ambulance,
    Medic,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the player can do for an incident that allows interaction.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interaction {
    /// Fix the car on the spot.
    Repair,
    /// Phone for a tow truck, an ambulance or the police.
    CallServices,
    /// Offer the stranded party a lift in the player's vehicle.
    OfferRide,
}
