//! `rt-core` — foundational types for the route-time workspace.
//!
//! This crate is a dependency of every other `rt-*` crate.  It has no
//! `rt-*` dependencies and only small external ones (`rand`, `thiserror`,
//! `serde`, `chrono`).
//!
//! # What lives here
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`ids`]        | `NodeId`, `EdgeId`, `NodeKey`                          |
//! | [`geo`]        | `GeoPoint`, haversine distance, `LocalProjection`      |
//! | [`calendar`]   | `DayKind`, `DisruptionCalendar`                        |
//! | [`rng`]        | `SimRng` (seeded, injectable randomness)               |
//! | [`error`]      | `CoreError`, `CoreResult`                              |

pub mod calendar;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use calendar::{DayKind, DisruptionCalendar};
pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, LocalProjection};
pub use ids::{EdgeId, NodeId, NodeKey};
pub use rng::SimRng;
