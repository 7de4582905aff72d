//! External map sources.

use crate::network::RoadNetwork;
use crate::SpatialResult;

/// Something that can produce a raw road network for the service area.
///
/// The result does not need to be normalized or connected;
/// [`GraphStore`](crate::GraphStore) takes care of both.
pub trait MapSource: Send + Sync {
    fn fetch(&self) -> SpatialResult<RoadNetwork>;

    /// Human-readable name for log messages.
    fn describe(&self) -> String {
        "custom map source".to_string()
    }
}

impl<F> MapSource for F
where
    F: Fn() -> SpatialResult<RoadNetwork> + Send + Sync,
{
    fn fetch(&self) -> SpatialResult<RoadNetwork> {
        self()
    }
}
