//! `amb-adapters` — the subsystems that feed the incident engine.
//!
//! Adapters are peers of the core, not children: each runs on its own
//! interval, finds candidates through the world query, claims them through
//! the arbiter and, on success, hands them to a new incident.  On failure it
//! simply skips that tick.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`subsystem`]  | `Subsystem` trait, `AdapterCtx`                          |
//! | [`scheduler`]  | `SubsystemScheduler` with staggered offsets              |
//! | [`blockage`]   | `TrafficBlockageHandler`: moves stalled vehicles along   |
//! | [`collision`]  | `CollisionHandler`: crashes become accidents             |
//! | [`encounter`]  | `EncounterGenerator`: random street scenes near the player |
//! | [`config`]     | Per-adapter configs and `AdapterConfig`                  |
//! | [`error`]      | `AdapterError`, `AdapterResult<T>`                       |
//!
//! # Priorities
//!
//! ```text
//! collisions (20)  >  encounters (5)  >  traffic blockage (1)
//! ```
//!
//! A higher-priority adapter may take an entity away from a lower one.  The
//! loser finds out on its next ownership check; nobody is told.

pub mod blockage;
pub mod collision;
pub mod config;
pub mod encounter;
pub mod error;
pub mod scheduler;
pub mod subsystem;


pub use blockage::{Nudge, TrafficBlockageHandler};
pub use collision::{CollisionHandler, PendingCrash};
pub use config::{AdapterConfig, BlockageConfig, CollisionConfig, EncounterConfig, EncounterWeights};
pub use encounter::EncounterGenerator;
pub use error::{AdapterError, AdapterResult};
pub use scheduler::{SlotStats, SubsystemScheduler};
pub use subsystem::{AdapterCtx, Subsystem};
