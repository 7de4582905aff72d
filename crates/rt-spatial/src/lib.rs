//! `rt-spatial` — road network, edge-time normalization, shortest paths,
//! and restriction overlays.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`network`]     | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`       |
//! | [`edge`]        | `EdgeData`, `MaxSpeed`, travel-time derivation           |
//! | [`speeds`]      | `ensure_speeds` normalizer                               |
//! | [`router`]      | `Router` trait, `DijkstraRouter`, `shortest_path_stats`  |
//! | [`components`]  | weakly connected components, `largest_component`         |
//! | [`restrict`]    | `DisruptionZone`, `apply_restrictions`                   |
//! | [`persist`]     | versioned JSON `save_network` / `load_network`           |
//! | [`import`]      | `OsmWay`, tag helpers, `build_from_ways`                 |
//! | [`source`]      | `MapSource` trait                                        |
//! | [`store`]       | `GraphStore` lazy loader                                 |
//! | [`osm`]         | `PbfSource` (feature = `"osm"` only)                     |
//! | [`overpass`]    | `OverpassSource` (feature = `"overpass"` only)           |
//! | [`error`]       | `SpatialError`, `SpatialResult<T>`                       |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `osm`      | Enables OSM PBF loading via the `osmpbf` crate.           |
//! | `overpass` | Enables downloading from the Overpass API via `reqwest`.  |

pub mod components;
pub mod edge;
pub mod error;
pub mod import;
pub mod network;
pub mod persist;
pub mod restrict;
pub mod router;
pub mod source;
pub mod speeds;
pub mod store;

#[cfg(feature = "osm")]
pub mod osm;

#[cfg(feature = "overpass")]
pub mod overpass;

#[cfg(test)]
mod tests;

pub use components::{component_count, is_connected, largest_component};
pub use edge::{EdgeData, MaxSpeed, MIN_SPEED_MPS};
pub use error::{SpatialError, SpatialResult};
pub use import::{build_from_ways, BoundingBox, Oneway, OsmWay};
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use persist::{load_network, save_network};
pub use restrict::{apply_restrictions, restrict_zones, DisruptionZone};
pub use router::{path_stats, shortest_path_stats, DijkstraRouter, PathStats, Route, Router, Weight};
pub use source::MapSource;
pub use speeds::{ensure_speeds, NormalizeReport};
pub use store::GraphStore;
