//! Per-edge attributes.
//!
//! An edge carries a length (metres), a speed (km/h) and a travel time
//! (seconds).  Raw imports may be missing the first two; the travel time is
//! never stored independently: it is recomputed by every setter, so it is
//! either absent or equal to `length / speed`.

use serde::{Deserialize, Serialize};

use rt_core::GeoPoint;

use crate::router::Weight;

/// Lower bound on speed (m/s) used when deriving travel time.
pub const MIN_SPEED_MPS: f64 = 1e-3;

/// Travel time in seconds for `length_m` at `speed_kph`.
#[inline]
pub fn travel_time_s(length_m: f64, speed_kph: f64) -> f64 {
    let speed_mps = speed_kph * 1000.0 / 3600.0;
    length_m / speed_mps.max(MIN_SPEED_MPS)
}

// ── MaxSpeed ──────────────────────────────────────────────────────────────────

/// A declared speed limit as found in the map source.
///
/// OSM `maxspeed` values come in several shapes: a bare number, several
/// alternatives (`"50;30"`), or free text (`"40 mph"`, `"RU:urban"`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxSpeed {
    Value(f64),
    Candidates(Vec<String>),
    Text(String),
}

impl MaxSpeed {
    /// Best-effort conversion to km/h.  `None` if nothing usable is found.
    pub fn parse_kph(&self) -> Option<f64> {
        match self {
            MaxSpeed::Value(v) => positive(*v),
            MaxSpeed::Candidates(list) => list.iter().find_map(|s| parse_speed_text(s)),
            MaxSpeed::Text(s) => parse_speed_text(s),
        }
    }
}

/// First number embedded in `text`, converted from mph when the text says so.
pub fn parse_speed_text(text: &str) -> Option<f64> {
    let value = first_number(text)?;
    let kph = if text.to_ascii_lowercase().contains("mph") {
        value * 1.609_344
    } else {
        value
    };
    positive(kph)
}

/// Extract the first `\d+(\.\d*)?` run from `text`.
fn first_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    text[start..end].trim_end_matches('.').parse().ok()
}

#[inline]
fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

// ── EdgeData ──────────────────────────────────────────────────────────────────

/// Attributes of one directed edge.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EdgeData {
    length_m:      Option<f64>,
    speed_kph:     Option<f64>,
    maxspeed:      Option<MaxSpeed>,
    geometry:      Vec<GeoPoint>,
    travel_time_s: Option<f64>,
}

impl EdgeData {
    /// A fully specified edge.
    pub fn new(length_m: f64, speed_kph: f64) -> Self {
        let mut data = Self {
            length_m: Some(length_m),
            speed_kph: Some(speed_kph),
            ..Self::default()
        };
        data.refresh();
        data
    }

    /// An edge with no attributes yet; see [`ensure_speeds`](crate::ensure_speeds).
    pub fn raw() -> Self {
        Self::default()
    }

    pub fn with_length_m(mut self, length_m: f64) -> Self {
        self.set_length_m(length_m);
        self
    }

    pub fn with_speed_kph(mut self, speed_kph: f64) -> Self {
        self.set_speed_kph(speed_kph);
        self
    }

    pub fn with_maxspeed(mut self, maxspeed: MaxSpeed) -> Self {
        self.maxspeed = Some(maxspeed);
        self
    }

    /// Attach an explicit polyline (first point = edge source).
    pub fn with_geometry(mut self, geometry: Vec<GeoPoint>) -> Self {
        self.geometry = geometry;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn length_m(&self) -> Option<f64> {
        self.length_m
    }

    #[inline]
    pub fn speed_kph(&self) -> Option<f64> {
        self.speed_kph
    }

    #[inline]
    pub fn travel_time_s(&self) -> Option<f64> {
        self.travel_time_s
    }

    #[inline]
    pub fn maxspeed(&self) -> Option<&MaxSpeed> {
        self.maxspeed.as_ref()
    }

    #[inline]
    pub fn geometry(&self) -> &[GeoPoint] {
        &self.geometry
    }

    /// Value of `weight` on this edge, if the attribute is present.
    #[inline]
    pub fn weight(&self, weight: Weight) -> Option<f64> {
        match weight {
            Weight::Length => self.length_m,
            Weight::TravelTime => self.travel_time_s,
        }
    }

    /// Polyline length in metres (haversine), `None` without a geometry.
    pub fn geometry_length_m(&self) -> Option<f64> {
        if self.geometry.len() < 2 {
            return None;
        }
        Some(
            self.geometry
                .windows(2)
                .map(|w| w[0].distance_m(w[1]))
                .sum(),
        )
    }

    // ── Mutation (keeps travel time consistent) ───────────────────────────

    pub fn set_length_m(&mut self, length_m: f64) {
        self.length_m = Some(length_m);
        self.refresh();
    }

    pub fn set_speed_kph(&mut self, speed_kph: f64) {
        self.speed_kph = Some(speed_kph);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.travel_time_s = match (self.length_m, self.speed_kph) {
            (Some(len), Some(kph)) => Some(travel_time_s(len, kph)),
            _ => None,
        };
    }
}
