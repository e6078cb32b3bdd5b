//! `amb-incident` — the incident lifecycle engine.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`kind`]       | `IncidentKind`, `Role`, `Interaction`                      |
//! | [`phase`]      | Named phase enums per kind, `Phase`, transition tables     |
//! | [`incident`]   | `Incident`, `Member`, `InteractionFlags`, `IncidentSpec`   |
//! | [`script`]     | `PhaseCtx`, `Step`, shared choreography helpers            |
//! | `handlers`     | One phase handler per incident kind                        |
//! | [`engine`]     | `IncidentEngine`, `TeardownReason`, `TickReport`           |
//! | [`observer`]   | `IncidentObserver` (presentation hooks), recording observer |
//! | [`config`]     | `IncidentConfig`                                           |
//! | [`error`]      | `IncidentError`, `IncidentResult<T>`                       |
//!
//! # Tick shape
//!
//! ```text
//! tick(now):
//!   ① validity  — every incident: members exist, alive, still owned;
//!                 age under the cap.  Failures are torn down here, before
//!                 any handler runs.
//!   ② phases    — every surviving incident, in creation order: refresh
//!                 position for moving kinds, run the handler for its
//!                 current phase, apply the returned step, enforce the
//!                 phase's maximum dwell.  Terminal incidents are torn down.
//! ```
//!
//! A handler error is contained to its own incident: it is logged and
//! retried on the next tick until the phase's maximum dwell runs out, at
//! which point the incident is forced to `Terminal`.

pub mod config;
pub mod engine;
pub mod error;
mod handlers;
pub mod incident;
pub mod kind;
pub mod observer;
pub mod phase;
pub mod script;

#[cfg(test)]
mod tests;

pub use config::IncidentConfig;
pub use engine::{IncidentEngine, TeardownReason, TickReport};
pub use error::{IncidentError, IncidentResult};
pub use incident::{Incident, IncidentSpec, InteractionFlags, Member};
pub use kind::{IncidentKind, Interaction, Role};
pub use observer::{IncidentEvent, IncidentObserver, NoopIncidentObserver, RecordingObserver};
pub use phase::{
    AccidentPhase, AltercationPhase, BreakdownPhase, ParamedicsPhase, Phase, PhaseSet,
    PoliceStopPhase,
};
pub use script::{PhaseCtx, Step};
