//! `amb-world` — the engine's view of the host simulation.
//!
//! The engine never reimplements pathing, collision or animation; it asks
//! the host through three narrow traits and drives entities with
//! fire-and-forget directives.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`query`]     | `WorldQuery` — read-only spatial and entity queries       |
//! | [`directive`] | `Directive`, `DirectiveSink`, `Directives` helpers        |
//! | [`spawn`]     | `EntitySpawner`, `VehicleModel`, `AgentRole`              |
//! | [`sandbox`]   | `SandboxWorld` — in-memory host used by tests and demos   |
//! | [`error`]     | `WorldError`, `DirectiveError`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod directive;
pub mod error;
pub mod query;
pub mod sandbox;
pub mod spawn;

#[cfg(test)]
mod tests;

pub use directive::{Directive, DirectiveSink, Directives, InteractionKind, MoveSpeed, Protection, Seat};
pub use error::{DirectiveError, DirectiveResult, WorldError, WorldResult};
pub use query::WorldQuery;
pub use sandbox::SandboxWorld;
pub use spawn::{AgentRole, EntitySpawner, VehicleModel};

/// Everything the incident engine needs from its host in one bound.
pub trait World: WorldQuery + DirectiveSink + EntitySpawner {}

impl<T: WorldQuery + DirectiveSink + EntitySpawner> World for T {}
