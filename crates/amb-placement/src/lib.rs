//! `amb-placement` — where may a new incident go?
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`validator`] | `PlacementValidator`, `Rejection`                        |
//! | [`exclusion`] | `ExclusionSet`, `ExclusionZone`                          |
//! | [`config`]    | `PlacementConfig`                                        |
//! | [`error`]     | `PlacementError`, `PlacementResult<T>`                   |
//!
//! # Search order
//!
//! Candidates are generated ring by ring from `min_distance` outwards.  The
//! first pass only looks inside a fan ahead of the reference heading; the
//! second pass walks the full circle.  Each candidate runs the same ordered
//! checks (bounds, water, ground snap, route, exclusion) and the first one
//! that survives is returned.  A single road probe is never trusted alone:
//! it must be backed by a nearby road-graph node or live traffic.

pub mod config;
pub mod error;
pub mod exclusion;
pub mod validator;


pub use config::PlacementConfig;
pub use error::{PlacementError, PlacementResult};
pub use exclusion::{ExclusionSet, ExclusionZone};
pub use validator::{PlacementValidator, Rejection};
