//! `rt-tour` — multi-stop tour over a road network.
//!
//! Given a depot and delivery waypoints, snaps each coordinate to its
//! nearest road node, orders the stops with a nearest-neighbor heuristic
//! and stitches the per-leg shortest paths into one closed route.
//!
//! The heuristic is O(n²) over the waypoint count and is not optimal; it
//! targets delivery runs of a handful of stops.

pub mod error;
pub mod matrix;
pub mod route;
pub mod solver;


pub use error::{TourError, TourResult};
pub use matrix::DistanceMatrix;
pub use route::Route;
pub use solver::{find_route, nearest_neighbor_tour, resolve_waypoints};
