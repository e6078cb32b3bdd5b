//! `amb-core` — foundational types for the ambient incident engine.
//!
//! This crate is a dependency of every other `amb-*` crate.  It has no
//! `amb-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `EntityHandle`, `IncidentId`, `MarkerRef`, `OwnerId`  |
//! | [`geo`]         | `Vec3`, planar distance and heading helpers           |
//! | [`time`]        | `Tick`, `SimClock`                                    |
//! | [`rng`]         | `IncidentRng` (per-incident), `SimRng` (global)       |
//! | [`kind`]        | `EntityKind` enum                                     |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod kind;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::Vec3;
pub use ids::{EntityHandle, IncidentId, MarkerRef, OwnerId};
pub use kind::EntityKind;
pub use rng::{IncidentRng, SimRng};
pub use time::{SimClock, Tick};
