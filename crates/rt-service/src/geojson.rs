//! GeoJSON export of the disruption zones.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tracing::info;

use rt_core::GeoPoint;

use crate::ServiceResult;

/// FeatureCollection with one Point per zone center.  Ids are 1-based,
/// coordinates are `[lon, lat]`.
pub fn zones_feature_collection(points: &[GeoPoint]) -> Value {
    let features: Vec<Value> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "type": "Feature",
                "properties": { "id": i + 1 },
                "geometry": { "type": "Point", "coordinates": [p.lon, p.lat] },
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

pub fn write_zones_geojson(path: &Path, points: &[GeoPoint]) -> ServiceResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let text = serde_json::to_string_pretty(&zones_feature_collection(points))?;
    fs::write(path, text)?;
    info!(path = %path.display(), zones = points.len(), "exported zones");
    Ok(())
}
