//! `amb-arbiter` — the single synchronization point for shared entities.
//!
//! Every subsystem that wants to mutate an agent or vehicle must first win
//! an ownership record for it here.  Contention is normal and is reported
//! as a plain `false`; nothing in this crate touches the world entity
//! itself.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`arbiter`]  | `OwnershipArbiter`, `OwnershipRecord`, `ArbiterStats`     |
//! | [`config`]   | `ArbiterConfig`                                           |
//! | [`error`]    | `ArbiterError`, `ArbiterResult<T>`                        |
//!
//! # Semantics
//!
//! - At most one record per handle.
//! - A strictly higher priority preempts the holder silently; the loser
//!   finds out on its own next validity check.
//! - Equal or lower priority requests from other owners fail.
//! - No fairness or back-off: a persistent high-priority caller can starve
//!   lower ones.

pub mod arbiter;
pub mod config;
pub mod error;


pub use arbiter::{ArbiterStats, OwnershipArbiter, OwnershipRecord};
pub use config::ArbiterConfig;
pub use error::{ArbiterError, ArbiterResult};
