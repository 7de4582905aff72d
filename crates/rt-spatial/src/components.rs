//! Weakly connected components.
//!
//! Edge direction is ignored: two nodes are in the same component if they
//! are linked by a chain of edges in either direction.  This matches the
//! "drop unreachable fragments" step applied after every graph load and
//! after every restriction overlay.

use tracing::{debug, warn};

use rt_core::NodeId;

use crate::network::RoadNetwork;

/// Union–find over dense node indices with path halving and union by size.
struct DisjointSet {
    parent: Vec<u32>,
    size:   Vec<u32>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n as u32).collect(), size: vec![1; n] }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra as usize] < self.size[rb as usize] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb as usize] = ra;
        self.size[ra as usize] += self.size[rb as usize];
    }
}

/// Component label of every node, numbered 0.. in order of the lowest
/// `NodeId` in each component.
pub fn component_labels(network: &RoadNetwork) -> Vec<u32> {
    let n = network.node_count();
    let mut dsu = DisjointSet::new(n);
    for (from, to) in network.edge_from.iter().zip(&network.edge_to) {
        dsu.union(from.0, to.0);
    }

    let mut label_of_root = vec![u32::MAX; n];
    let mut next = 0u32;
    let mut labels = Vec::with_capacity(n);
    for i in 0..n as u32 {
        let root = dsu.find(i) as usize;
        if label_of_root[root] == u32::MAX {
            label_of_root[root] = next;
            next += 1;
        }
        labels.push(label_of_root[root]);
    }
    labels
}

/// Number of weakly connected components (0 for an empty network).
pub fn component_count(network: &RoadNetwork) -> usize {
    component_labels(network)
        .iter()
        .max()
        .map_or(0, |&m| m as usize + 1)
}

/// `true` if the network has exactly one weakly connected component.
pub fn is_connected(network: &RoadNetwork) -> bool {
    component_count(network) == 1
}

/// Copy of `network` restricted to its largest weakly connected component.
///
/// On a size tie the component containing the lowest `NodeId` wins.  An
/// empty network is returned unchanged.
pub fn largest_component(network: &RoadNetwork) -> RoadNetwork {
    let labels = component_labels(network);
    let count = labels.iter().max().map_or(0, |&m| m as usize + 1);
    if count <= 1 {
        return network.clone();
    }

    let mut sizes = vec![0usize; count];
    for &l in &labels {
        sizes[l as usize] += 1;
    }
    let mut best = 0usize;
    for (label, &size) in sizes.iter().enumerate() {
        if size > sizes[best] {
            best = label;
        }
    }

    let dropped = network.node_count() - sizes[best];
    if dropped * 10 > network.node_count() {
        warn!(components = count, dropped, "large share of nodes outside main component");
    } else {
        debug!(components = count, dropped, "dropping disconnected fragments");
    }

    let keep = best as u32;
    network.retain(|n: NodeId| labels[n.index()] == keep, |_| true)
}
