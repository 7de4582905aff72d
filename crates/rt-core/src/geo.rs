//! Geographic coordinate type and planar projection.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Zone-membership tests compare
//! distances of a few metres against buffers of a few hundred metres.

use serde::{Deserialize, Serialize};

/// Mean Earth radius, metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a `[lat, lon]` pair as used in request payloads.
    #[inline]
    pub fn from_pair(pair: [f64; 2]) -> Self {
        Self { lat: pair[0], lon: pair[1] }
    }

    #[inline]
    pub fn to_pair(self) -> [f64; 2] {
        [self.lat, self.lon]
    }

    /// `true` if both coordinates are finite and inside the WGS-84 range.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Arithmetic midpoint in lat/lon space.  Fine for street segments.
    #[inline]
    pub fn midpoint(self, other: GeoPoint) -> GeoPoint {
        GeoPoint::new((self.lat + other.lat) * 0.5, (self.lon + other.lon) * 0.5)
    }

    /// `true` if both coordinates are within `half_deg` of `center`.
    #[inline]
    pub fn within_bbox(self, center: GeoPoint, half_deg: f64) -> bool {
        (self.lat - center.lat).abs() <= half_deg
            && (self.lon - center.lon).abs() <= half_deg
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── LocalProjection ───────────────────────────────────────────────────────────

/// Equirectangular projection around a fixed origin.
///
/// Maps a `GeoPoint` to metres east (`x`) and north (`y`) of the origin.
/// Over a city-sized extent (tens of kilometres) distances in the projected
/// plane agree with haversine to well under one percent, which is what the
/// buffer and sampling radii need.
#[derive(Copy, Clone, Debug)]
pub struct LocalProjection {
    origin:  GeoPoint,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn new(origin: GeoPoint) -> Self {
        Self { origin, cos_lat: origin.lat.to_radians().cos() }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Project to planar `[x_east_m, y_north_m]`.
    #[inline]
    pub fn project(&self, p: GeoPoint) -> [f64; 2] {
        let x = (p.lon - self.origin.lon).to_radians() * EARTH_RADIUS_M * self.cos_lat;
        let y = (p.lat - self.origin.lat).to_radians() * EARTH_RADIUS_M;
        [x, y]
    }

    /// Inverse of [`project`](Self::project).
    #[inline]
    pub fn unproject(&self, xy: [f64; 2]) -> GeoPoint {
        let lat = self.origin.lat + (xy[1] / EARTH_RADIUS_M).to_degrees();
        let lon = self.origin.lon + (xy[0] / (EARTH_RADIUS_M * self.cos_lat)).to_degrees();
        GeoPoint::new(lat, lon)
    }

    /// Euclidean distance between two points in the projected plane.
    #[inline]
    pub fn planar_distance_m(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let [ax, ay] = self.project(a);
        let [bx, by] = self.project(b);
        (ax - bx).hypot(ay - by)
    }
}
