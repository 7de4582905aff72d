//! Edge-time normalization.
//!
//! After [`ensure_speeds`] every edge carries a positive length, a positive
//! speed and the travel time derived from both.  Edges that were already
//! complete are left untouched, so the pass is idempotent.

use tracing::debug;

use rt_core::EdgeId;

use crate::network::RoadNetwork;

/// Length assigned to an edge that has neither a length nor a geometry.
pub const DEFAULT_EDGE_LENGTH_M: f64 = 20.0;

/// Counts of the repairs performed by one [`ensure_speeds`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Lengths taken from the edge's polyline.
    pub length_from_geometry: usize,
    /// Lengths set to [`DEFAULT_EDGE_LENGTH_M`].
    pub length_defaulted: usize,
    /// Speeds parsed from a declared `maxspeed`.
    pub speed_from_maxspeed: usize,
    /// Speeds set to the fallback.
    pub speed_defaulted: usize,
}

impl NormalizeReport {
    /// `true` if the pass changed nothing.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Fill in missing lengths and speeds, then recompute every travel time.
///
/// * missing (or non-positive) length: polyline length, else 20 m;
/// * missing (or non-positive) speed: parsed `maxspeed`, else `fallback_kph`.
pub fn ensure_speeds(network: &mut RoadNetwork, fallback_kph: f64) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for i in 0..network.edge_count() {
        let edge = EdgeId(i as u32);
        let data = network.edge_mut(edge);

        if !data.length_m().is_some_and(|l| l.is_finite() && l > 0.0) {
            match data.geometry_length_m().filter(|l| *l > 0.0) {
                Some(len) => {
                    data.set_length_m(len);
                    report.length_from_geometry += 1;
                }
                None => {
                    data.set_length_m(DEFAULT_EDGE_LENGTH_M);
                    report.length_defaulted += 1;
                }
            }
        }

        if !data.speed_kph().is_some_and(|s| s.is_finite() && s > 0.0) {
            match data.maxspeed().and_then(|m| m.parse_kph()) {
                Some(kph) => {
                    data.set_speed_kph(kph);
                    report.speed_from_maxspeed += 1;
                }
                None => {
                    data.set_speed_kph(fallback_kph);
                    report.speed_defaulted += 1;
                }
            }
        }
    }

    debug!(?report, edges = network.edge_count(), "normalized edge speeds");
    report
}
