//! Versioned JSON persistence for [`RoadNetwork`].
//!
//! The file holds node keys and positions plus every directed edge with its
//! parallel key and raw attributes.  Travel time is not stored; it is
//! re-derived on load.  A file written by a different format version is
//! rejected rather than migrated.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use rt_core::{GeoPoint, NodeKey};

use crate::edge::{EdgeData, MaxSpeed};
use crate::network::{RoadNetwork, RoadNetworkBuilder};
use crate::{SpatialError, SpatialResult};

/// Bump when the layout below changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoredNetwork {
    version: u32,
    nodes:   Vec<StoredNode>,
    edges:   Vec<StoredEdge>,
}

#[derive(Serialize, Deserialize)]
struct StoredNode {
    key: NodeKey,
    lat: f64,
    lon: f64,
}

#[derive(Serialize, Deserialize)]
struct StoredEdge {
    from: NodeKey,
    to:   NodeKey,
    key:  u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed_kph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    maxspeed: Option<MaxSpeed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    geometry: Vec<[f64; 2]>,
}

/// Serialize `network` to JSON at `path`.
///
/// The data is written to a sibling temporary file first and renamed into
/// place, so a crash never leaves a truncated file behind.
pub fn save_network(network: &RoadNetwork, path: &Path) -> SpatialResult<()> {
    let stored = to_stored(network);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, &stored)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), nodes = stored.nodes.len(), edges = stored.edges.len(), "saved network");
    Ok(())
}

/// Read a network written by [`save_network`].
///
/// # Errors
///
/// [`SpatialError::Io`] if the file cannot be opened, [`SpatialError::Json`]
/// if it does not parse, [`SpatialError::Format`] on a version mismatch and
/// [`SpatialError::NodeNotFound`] for an edge referencing an unknown node.
pub fn load_network(path: &Path) -> SpatialResult<RoadNetwork> {
    let reader = BufReader::new(File::open(path)?);
    let stored: StoredNetwork = serde_json::from_reader(reader)?;
    from_stored(stored)
}

fn to_stored(network: &RoadNetwork) -> StoredNetwork {
    let nodes = network
        .nodes()
        .map(|n| {
            let pos = network.position(n);
            StoredNode { key: network.node_key(n), lat: pos.lat, lon: pos.lon }
        })
        .collect();

    let edges = (0..network.edge_count())
        .map(|i| {
            let data = &network.edge_data[i];
            StoredEdge {
                from: network.node_key(network.edge_from[i]),
                to: network.node_key(network.edge_to[i]),
                key: network.edge_key[i],
                length_m: data.length_m(),
                speed_kph: data.speed_kph(),
                maxspeed: data.maxspeed().cloned(),
                geometry: data.geometry().iter().map(|p| p.to_pair()).collect(),
            }
        })
        .collect();

    StoredNetwork { version: FORMAT_VERSION, nodes, edges }
}

fn from_stored(stored: StoredNetwork) -> SpatialResult<RoadNetwork> {
    if stored.version != FORMAT_VERSION {
        return Err(SpatialError::Format(format!(
            "version {} (expected {FORMAT_VERSION})",
            stored.version
        )));
    }

    let mut b = RoadNetworkBuilder::with_capacity(stored.nodes.len(), stored.edges.len());
    for node in &stored.nodes {
        b.add_node(node.key, GeoPoint::new(node.lat, node.lon));
    }

    for edge in stored.edges {
        let from = b.node_id(edge.from).ok_or(SpatialError::NodeNotFound(edge.from))?;
        let to = b.node_id(edge.to).ok_or(SpatialError::NodeNotFound(edge.to))?;

        let mut data = EdgeData::raw()
            .with_geometry(edge.geometry.into_iter().map(GeoPoint::from_pair).collect());
        if let Some(len) = edge.length_m {
            data.set_length_m(len);
        }
        if let Some(kph) = edge.speed_kph {
            data.set_speed_kph(kph);
        }
        if let Some(max) = edge.maxspeed {
            data = data.with_maxspeed(max);
        }
        b.add_keyed_edge(from, to, edge.key, data);
    }

    Ok(b.build())
}
