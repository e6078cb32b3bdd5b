//! `amb-director` — the tick loop tying adapters, arbiter and incidents together.
//!
//! # Tick loop
//!
//! ```text
//! every tick:
//!   ① Adapters  — each subsystem due this tick (staggered by offset) finds
//!                 candidates, claims them through the arbiter and may
//!                 start incidents.
//!   ② Incidents — validity pass over every incident, then phase pass.
//!   ③ Sweep     — every `arbiter.sweep_interval_ticks`: one bounded batch
//!                 of stale ownership records is evicted.
//!   ④ Host      — the world advances by one tick's worth of seconds.
//! ```
//!
//! Everything runs on one thread and to completion within the tick; the
//! only cross-subsystem ordering guarantee is the arbiter's.
//!
//! # Crate layout
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`director`]  | `Director`, `Steppable`, `TickSummary`, `DirectorStats` |
//! | [`builder`]   | `DirectorBuilder`                                     |
//! | [`observer`]  | `DirectorObserver`, `NoopObserver`                    |
//! | [`config`]    | `AmbientConfig`, `ClockConfig`                        |
//! | [`error`]     | `DirectorError`, `DirectorResult<T>`                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | `AmbientConfig` (and every nested config) is (de)serializable. |

pub mod builder;
pub mod config;
pub mod director;
pub mod error;
pub mod observer;

#[cfg(test)]
mod tests;

pub use builder::DirectorBuilder;
pub use config::{AmbientConfig, ClockConfig};
pub use director::{Director, DirectorStats, Steppable, TickSummary};
pub use error::{DirectorError, DirectorResult};
pub use observer::{DirectorObserver, NoopObserver};
