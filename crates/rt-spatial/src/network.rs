//! The road graph: a directed multigraph over map nodes.
//!
//! # Data layout
//!
//! Outgoing edges are stored row-compressed.  The out-edges of node `n` are
//! the `EdgeId` range
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by `(source, target, parallel key)` and indexed
//! by `EdgeId`.  Parallel edges between the same ordered node pair therefore
//! sit next to each other, and each keeps its own `edge_key`.
//!
//! # Identifiers
//!
//! `NodeId`/`EdgeId` are dense indices local to this network.  `NodeKey` is
//! the stable identifier from the map source; `node_id(key)` maps back.
//!
//! # Spatial index
//!
//! Waypoints are snapped to road nodes through an `rstar` R-tree keyed on
//! `[lat, lon · cos(lat₀)]`, with `lat₀` the mean node latitude, so that a
//! degree of either axis spans roughly the same ground distance.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use rt_core::{EdgeId, GeoPoint, LocalProjection, NodeId, NodeKey};

use crate::edge::EdgeData;

// ── Snapping index ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon * lon_scale]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared equirectangular distance in degrees of latitude.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

fn mean_lon_scale(nodes: &[GeoPoint]) -> f64 {
    if nodes.is_empty() {
        return 1.0;
    }
    let mean_lat = nodes.iter().map(|p| p.lat).sum::<f64>() / nodes.len() as f64;
    mean_lat.to_radians().cos()
}

#[inline]
fn index_point(pos: GeoPoint, lon_scale: f64) -> [f64; 2] {
    [pos.lat, pos.lon * lon_scale]
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed multigraph in CSR format plus a spatial index for node snapping.
///
/// Do not construct directly; use [`RoadNetworkBuilder`].
#[derive(Clone)]
pub struct RoadNetwork {
    /// Position of each node, indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Stable source identifier of each node.  Indexed by `NodeId`.
    pub node_key: Vec<NodeKey>,

    /// Row offsets, `node_count + 1` long.
    pub node_out_start: Vec<u32>,

    // Per-edge columns, indexed by `EdgeId`.
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,

    /// Parallel index of each edge among edges with the same `(from, to)`.
    pub edge_key: Vec<u32>,

    /// Length, speed and travel time of each edge.
    pub edge_data: Vec<EdgeData>,

    key_index:   FxHashMap<NodeKey, NodeId>,
    spatial_idx: RTree<NodeEntry>,
    /// `cos` of the mean node latitude; shrinks longitude in the index.
    lon_scale:   f64,
}

impl RoadNetwork {
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Node lookup ───────────────────────────────────────────────────────

    /// Dense id of the node with source identifier `key`.
    #[inline]
    pub fn node_id(&self, key: NodeKey) -> Option<NodeId> {
        self.key_index.get(&key).copied()
    }

    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.key_index.contains_key(&key)
    }

    #[inline]
    pub fn node_key(&self, node: NodeId) -> NodeKey {
        self.node_key[node.index()]
    }

    #[inline]
    pub fn position(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    /// Position of the node with source identifier `key`.
    pub fn position_of(&self, key: NodeKey) -> Option<GeoPoint> {
        self.node_id(key).map(|id| self.position(id))
    }

    /// Iterator over all node ids.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count()).map(|i| NodeId(i as u32))
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// All parallel edges from `from` to `to`, in ascending key order.
    pub fn edges_between(&self, from: NodeId, to: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_edges(from)
            .filter(move |e| self.edge_to[e.index()] == to)
    }

    /// The edge `(from, to, key)`, if present.
    pub fn find_edge(&self, from: NodeKey, to: NodeKey, key: u32) -> Option<EdgeId> {
        let (from, to) = (self.node_id(from)?, self.node_id(to)?);
        self.edges_between(from, to)
            .find(|e| self.edge_key[e.index()] == key)
    }

    #[inline]
    pub fn edge(&self, edge: EdgeId) -> &EdgeData {
        &self.edge_data[edge.index()]
    }

    /// Mutable access for in-place normalization.  Topology stays fixed.
    #[inline]
    pub fn edge_mut(&mut self, edge: EdgeId) -> &mut EdgeData {
        &mut self.edge_data[edge.index()]
    }

    /// Source and target positions plus any interior geometry, as one polyline.
    pub fn edge_polyline(&self, edge: EdgeId) -> Vec<GeoPoint> {
        let data = &self.edge_data[edge.index()];
        if data.geometry().len() >= 2 {
            return data.geometry().to_vec();
        }
        vec![
            self.position(self.edge_from[edge.index()]),
            self.position(self.edge_to[edge.index()]),
        ]
    }

    // ── Snapping ──────────────────────────────────────────────────────────

    /// Nearest node to `pos`; `None` for an empty network.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&index_point(pos, self.lon_scale))
            .map(|e| e.id)
    }

    /// At most `k` nodes, closest first.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&index_point(pos, self.lon_scale))
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// Nodes whose planar distance to `center` is at most `radius_m`,
    /// in ascending `NodeId` order.
    pub fn nodes_within(&self, center: GeoPoint, radius_m: f64) -> Vec<NodeId> {
        let proj = LocalProjection::new(center);
        self.nodes()
            .filter(|&n| proj.planar_distance_m(center, self.position(n)) <= radius_m)
            .collect()
    }

    /// Mean position of all nodes.  `None` for an empty network.
    pub fn centroid(&self) -> Option<GeoPoint> {
        if self.is_empty() {
            return None;
        }
        let n = self.node_count() as f64;
        let (lat, lon) = self
            .node_pos
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
        Some(GeoPoint::new(lat / n, lon / n))
    }

    // ── Derived networks ──────────────────────────────────────────────────

    /// Copy the nodes and edges selected by the two predicates into a new
    /// network.  Edges touching a dropped node are dropped too; retained
    /// edges keep their parallel key and attributes.
    pub fn retain<N, E>(&self, keep_node: N, keep_edge: E) -> RoadNetwork
    where
        N: Fn(NodeId) -> bool,
        E: Fn(EdgeId) -> bool,
    {
        let mut b = RoadNetworkBuilder::with_capacity(self.node_count(), self.edge_count());
        let mut remap = vec![NodeId::INVALID; self.node_count()];
        for n in self.nodes().filter(|&n| keep_node(n)) {
            remap[n.index()] = b.add_node(self.node_key(n), self.position(n));
        }
        for i in 0..self.edge_count() {
            let e = EdgeId(i as u32);
            let from = remap[self.edge_from[i].index()];
            let to = remap[self.edge_to[i].index()];
            if from == NodeId::INVALID || to == NodeId::INVALID || !keep_edge(e) {
                continue;
            }
            b.add_keyed_edge(from, to, self.edge_key[i], self.edge_data[i].clone());
        }
        b.build()
    }
}

impl std::fmt::Debug for RoadNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadNetwork")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Collects nodes and directed edges in any order; [`build`](Self::build)
/// sorts the edges by `(source, target, key)` and lays out the network.
///
/// # Example
///
/// ```
/// use rt_core::{GeoPoint, NodeKey};
/// use rt_spatial::{EdgeData, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(NodeKey(1), GeoPoint::new(-16.50, -68.16));
/// let c = b.add_node(NodeKey(2), GeoPoint::new(-16.51, -68.16));
/// b.add_road(a, c, EdgeData::new(1_100.0, 30.0));
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2);
/// ```
pub struct RoadNetworkBuilder {
    nodes:       Vec<GeoPoint>,
    keys:        Vec<NodeKey>,
    key_index:   FxHashMap<NodeKey, NodeId>,
    raw_edges:   Vec<RawEdge>,
    next_key:    FxHashMap<(NodeId, NodeId), u32>,
}

struct RawEdge {
    from: NodeId,
    to:   NodeId,
    key:  u32,
    data: EdgeData,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            keys:      Vec::with_capacity(nodes),
            key_index: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            raw_edges: Vec::with_capacity(edges),
            next_key:  FxHashMap::default(),
        }
    }

    /// Ids are handed out sequentially.  A key seen before returns its
    /// existing id and the first position wins.
    pub fn add_node(&mut self, key: NodeKey, pos: GeoPoint) -> NodeId {
        if let Some(&id) = self.key_index.get(&key) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.keys.push(key);
        self.key_index.insert(key, id);
        id
    }

    /// Add a **directed** edge and return its parallel key (0 for the first
    /// edge between this ordered pair, then 1, 2, …).
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, data: EdgeData) -> u32 {
        let key = self.next_key.get(&(from, to)).copied().unwrap_or(0);
        self.add_keyed_edge(from, to, key, data);
        key
    }

    /// Add a directed edge with an explicit parallel key (used when copying
    /// or reloading a network so keys survive unchanged).
    pub fn add_keyed_edge(&mut self, from: NodeId, to: NodeId, key: u32, data: EdgeData) {
        let next = self.next_key.entry((from, to)).or_insert(0);
        *next = (*next).max(key + 1);
        self.raw_edges.push(RawEdge { from, to, key, data });
    }

    /// Two-way road: one edge each way, the reverse one with reversed
    /// geometry.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, data: EdgeData) {
        let mut reverse = data.clone();
        if !data.geometry().is_empty() {
            let mut geom = data.geometry().to_vec();
            geom.reverse();
            reverse = reverse.with_geometry(geom);
        }
        self.add_edge(a, b, data);
        self.add_edge(b, a, reverse);
    }

    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_id(&self, key: NodeKey) -> Option<NodeId> {
        self.key_index.get(&key).copied()
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Sort edges for CSR construction; parallel edges end up adjacent.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| (e.from.0, e.to.0, e.key));

        // Prefix sums of out-degrees.
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let mut edge_from = Vec::with_capacity(edge_count);
        let mut edge_to   = Vec::with_capacity(edge_count);
        let mut edge_key  = Vec::with_capacity(edge_count);
        let mut edge_data = Vec::with_capacity(edge_count);
        for e in raw {
            edge_from.push(e.from);
            edge_to.push(e.to);
            edge_key.push(e.key);
            edge_data.push(e.data);
        }

        let lon_scale = mean_lon_scale(&self.nodes);
        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: index_point(pos, lon_scale),
                id: NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            node_pos: self.nodes,
            node_key: self.keys,
            node_out_start,
            edge_from,
            edge_to,
            edge_key,
            edge_data,
            key_index: self.key_index,
            spatial_idx,
            lon_scale,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
