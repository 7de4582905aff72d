//! Unit tests for rt-spatial.
//!
//! All tests use a hand-crafted network so they run without any OSM file.

#[cfg(test)]
mod helpers {
    use rt_core::{GeoPoint, NodeKey};
    use crate::{EdgeData, RoadNetwork, RoadNetworkBuilder};

    pub fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    /// Five-node network with two competing routes from key 1 to key 5.
    ///
    /// ```text
    ///   1 ── 2 ── 3        all edges 100 m
    ///   │         │        1-2, 2-3, 3-5 at 30 km/h
    ///   4 ─────── 5        1-4, 4-5 at 5 km/h
    /// ```
    ///
    /// By length the short side 1→4→5 (200 m) wins; by travel time the
    /// fast side 1→2→3→5 (36 s) wins.
    pub fn two_route_network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let n1 = b.add_node(NodeKey(1), GeoPoint::new(-16.500, -68.200));
        let n2 = b.add_node(NodeKey(2), GeoPoint::new(-16.500, -68.199));
        let n3 = b.add_node(NodeKey(3), GeoPoint::new(-16.500, -68.198));
        let n4 = b.add_node(NodeKey(4), GeoPoint::new(-16.501, -68.200));
        let n5 = b.add_node(NodeKey(5), GeoPoint::new(-16.501, -68.198));

        b.add_road(n1, n2, EdgeData::new(100.0, 30.0));
        b.add_road(n2, n3, EdgeData::new(100.0, 30.0));
        b.add_road(n3, n5, EdgeData::new(100.0, 30.0));
        b.add_road(n1, n4, EdgeData::new(100.0, 5.0));
        b.add_road(n4, n5, EdgeData::new(100.0, 5.0));
        b.build()
    }

    /// Straight east-west street of `n` nodes spaced 0.001° of longitude
    /// apart, keys 1..=n.
    pub fn street(n: i64) -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let ids: Vec<_> = (1..=n)
            .map(|k| b.add_node(NodeKey(k), street_point(k)))
            .collect();
        for w in ids.windows(2) {
            let len = b.node_pos(w[0]).distance_m(b.node_pos(w[1]));
            b.add_road(w[0], w[1], EdgeData::new(len, 30.0));
        }
        b.build()
    }

    pub fn street_point(key: i64) -> GeoPoint {
        GeoPoint::new(-16.5, -68.2 + 0.001 * (key - 1) as f64)
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use rt_core::{GeoPoint, NodeKey};
    use crate::{EdgeData, RoadNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert!(net.is_empty());
        assert!(net.centroid().is_none());
    }

    #[test]
    fn add_node_is_idempotent_per_key() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(10), GeoPoint::new(-16.5, -68.2));
        let again = b.add_node(NodeKey(10), GeoPoint::new(0.0, 0.0));
        assert_eq!(a, again);
        assert_eq!(b.node_count(), 1);
        assert_eq!(b.node_pos(a), GeoPoint::new(-16.5, -68.2));
    }

    #[test]
    fn parallel_edges_get_sequential_keys() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        assert_eq!(b.add_edge(a, c, EdgeData::new(100.0, 30.0)), 0);
        assert_eq!(b.add_edge(a, c, EdgeData::new(150.0, 60.0)), 1);
        assert_eq!(b.add_edge(c, a, EdgeData::new(100.0, 30.0)), 0);
        let net = b.build();

        assert_eq!(net.edges_between(a, c).count(), 2);
        let second = net.find_edge(NodeKey(1), NodeKey(2), 1).unwrap();
        assert_eq!(net.edge(second).length_m(), Some(150.0));
        assert!(net.find_edge(NodeKey(2), NodeKey(1), 1).is_none());
    }

    #[test]
    fn csr_out_edges() {
        let net = super::helpers::two_route_network();
        let n1 = net.node_id(NodeKey(1)).unwrap();
        let n2 = net.node_id(NodeKey(2)).unwrap();

        assert_eq!(net.out_degree(n1), 2); // 1→2, 1→4
        assert_eq!(net.out_degree(n2), 2); // 2→1, 2→3
        for e in net.out_edges(n1) {
            assert_eq!(net.edge_from[e.index()], n1);
        }
        assert_eq!(net.edge_count(), 10);
    }

    #[test]
    fn retain_keeps_keys_and_attributes() {
        let net = super::helpers::two_route_network();
        let n4 = net.node_id(NodeKey(4)).unwrap();
        let sub = net.retain(|n| n != n4, |_| true);

        assert_eq!(sub.node_count(), 4);
        assert!(!sub.contains(NodeKey(4)));
        assert_eq!(sub.edge_count(), 6);
        let e = sub.find_edge(NodeKey(2), NodeKey(3), 0).unwrap();
        assert_eq!(sub.edge(e), &EdgeData::new(100.0, 30.0));
    }

    #[test]
    fn nodes_within_radius() {
        let net = super::helpers::street(5);
        // Spacing is ~106.6 m; 250 m from key 1 covers keys 1..=3.
        let near = net.nodes_within(super::helpers::street_point(1), 250.0);
        let keys: Vec<_> = near.iter().map(|&n| net.node_key(n)).collect();
        assert_eq!(keys, vec![NodeKey(1), NodeKey(2), NodeKey(3)]);
    }
}

// ── Spatial snap ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use rt_core::{GeoPoint, NodeKey};
    use crate::{RoadNetwork, RoadNetworkBuilder};

    #[test]
    fn snap_exact_position() {
        let net = super::helpers::street(3);
        let snapped = net.snap_to_node(super::helpers::street_point(2)).unwrap();
        assert_eq!(net.node_key(snapped), NodeKey(2));
    }

    #[test]
    fn snap_nearest() {
        let net = super::helpers::street(3);
        let near_1 = net.snap_to_node(GeoPoint::new(-16.5001, -68.1996)).unwrap();
        assert_eq!(net.node_key(near_1), NodeKey(1));
        let near_2 = net.snap_to_node(GeoPoint::new(-16.5001, -68.1994)).unwrap();
        assert_eq!(net.node_key(near_2), NodeKey(2));
    }

    #[test]
    fn snap_uses_ground_distance() {
        let query = GeoPoint::new(-16.5, -68.2);
        let east = GeoPoint::new(-16.5, -68.2 + 0.000_91);
        let north = GeoPoint::new(-16.5 + 0.000_90, -68.2);
        // East is ~97 m away, north ~100 m, although east is farther in degrees.
        assert!(query.distance_m(east) < query.distance_m(north));

        let mut b = RoadNetworkBuilder::new();
        b.add_node(NodeKey(1), east);
        b.add_node(NodeKey(2), north);
        let net = b.build();
        let snapped = net.snap_to_node(query).unwrap();
        assert_eq!(net.node_key(snapped), NodeKey(1));

        let order: Vec<_> = net.k_nearest_nodes(query, 2).iter().map(|&n| net.node_key(n)).collect();
        assert_eq!(order, vec![NodeKey(1), NodeKey(2)]);
    }

    #[test]
    fn empty_network_returns_none() {
        assert!(RoadNetwork::empty().snap_to_node(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn k_nearest_order() {
        let net = super::helpers::street(4);
        let nearest = net.k_nearest_nodes(super::helpers::street_point(4), 3);
        let keys: Vec<_> = nearest.iter().map(|&n| net.node_key(n)).collect();
        assert_eq!(keys, vec![NodeKey(4), NodeKey(3), NodeKey(2)]);
    }
}

// ── Edge attributes ───────────────────────────────────────────────────────────

#[cfg(test)]
mod edge {
    use rt_core::GeoPoint;
    use crate::edge::{parse_speed_text, travel_time_s};
    use crate::{EdgeData, MaxSpeed};
    use super::helpers::approx;

    #[test]
    fn travel_time_follows_length_and_speed() {
        let mut e = EdgeData::new(1_000.0, 36.0);
        assert!(approx(e.travel_time_s().unwrap(), 100.0));
        e.set_speed_kph(72.0);
        assert!(approx(e.travel_time_s().unwrap(), 50.0));
        e.set_length_m(500.0);
        assert!(approx(e.travel_time_s().unwrap(), 25.0));
    }

    #[test]
    fn zero_speed_is_clamped() {
        assert!(approx(travel_time_s(1.0, 0.0), 1_000.0));
    }

    #[test]
    fn raw_edge_has_no_travel_time() {
        let e = EdgeData::raw().with_length_m(10.0);
        assert_eq!(e.travel_time_s(), None);
    }

    #[test]
    fn maxspeed_shapes() {
        assert_eq!(MaxSpeed::Value(50.0).parse_kph(), Some(50.0));
        assert_eq!(MaxSpeed::Value(0.0).parse_kph(), None);
        let list = MaxSpeed::Candidates(vec!["signals".into(), "40".into(), "60".into()]);
        assert_eq!(list.parse_kph(), Some(40.0));
        // The first usable alternative wins, even when it is not listed first.
        let list = MaxSpeed::Candidates(vec!["none".into(), "40".into()]);
        assert_eq!(list.parse_kph(), Some(40.0));
        assert_eq!(MaxSpeed::Candidates(vec!["none".into(), "walk".into()]).parse_kph(), None);
        assert_eq!(MaxSpeed::Text("BO:urban 40".into()).parse_kph(), Some(40.0));
        assert_eq!(MaxSpeed::Text("none".into()).parse_kph(), None);
    }

    #[test]
    fn mph_is_converted() {
        assert!(approx(parse_speed_text("30 mph").unwrap(), 48.28032));
        assert!(approx(parse_speed_text("12.5").unwrap(), 12.5));
    }

    #[test]
    fn geometry_length() {
        let a = GeoPoint::new(-16.5, -68.2);
        let b = GeoPoint::new(-16.5, -68.199);
        let e = EdgeData::raw().with_geometry(vec![a, b]);
        assert!(approx(e.geometry_length_m().unwrap(), a.distance_m(b)));
        assert_eq!(EdgeData::raw().geometry_length_m(), None);
    }
}

// ── Normalizer ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod speeds {
    use rt_core::{EdgeId, GeoPoint, NodeKey};
    use crate::speeds::DEFAULT_EDGE_LENGTH_M;
    use crate::{ensure_speeds, EdgeData, MaxSpeed, RoadNetwork, RoadNetworkBuilder};
    use super::helpers::approx;

    fn raw_network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        // 0: nothing at all
        b.add_edge(a, c, EdgeData::raw());
        // 1: geometry only, textual maxspeed
        b.add_edge(
            a,
            c,
            EdgeData::raw()
                .with_geometry(vec![GeoPoint::new(-16.5, -68.2), GeoPoint::new(-16.5, -68.199)])
                .with_maxspeed(MaxSpeed::Text("50".into())),
        );
        // 2: already complete
        b.add_edge(c, a, EdgeData::new(80.0, 40.0));
        b.build()
    }

    #[test]
    fn fills_missing_attributes() {
        let mut net = raw_network();
        let report = ensure_speeds(&mut net, 30.0);

        let e0 = net.edge(EdgeId(0));
        assert_eq!(e0.length_m(), Some(DEFAULT_EDGE_LENGTH_M));
        assert_eq!(e0.speed_kph(), Some(30.0));
        assert!(approx(e0.travel_time_s().unwrap(), 2.4));

        let e1 = net.edge(EdgeId(1));
        assert!(e1.length_m().unwrap() > 100.0);
        assert_eq!(e1.speed_kph(), Some(50.0));

        assert_eq!(net.edge(EdgeId(2)), &EdgeData::new(80.0, 40.0));

        assert_eq!(report.length_defaulted, 1);
        assert_eq!(report.length_from_geometry, 1);
        assert_eq!(report.speed_from_maxspeed, 1);
        assert_eq!(report.speed_defaulted, 1);
    }

    #[test]
    fn idempotent() {
        let mut net = raw_network();
        ensure_speeds(&mut net, 30.0);
        let first = net.edge_data.clone();
        let report = ensure_speeds(&mut net, 30.0);
        assert!(report.is_clean());
        assert_eq!(net.edge_data, first);
    }

    #[test]
    fn travel_time_consistency() {
        let mut net = raw_network();
        ensure_speeds(&mut net, 30.0);
        for e in &net.edge_data {
            let expected = e.length_m().unwrap() / (e.speed_kph().unwrap() * 1000.0 / 3600.0);
            let got = e.travel_time_s().unwrap();
            assert!(got >= 0.0);
            assert!(approx(got, expected));
        }
    }
}

// ── Dijkstra routing & path stats ─────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use rt_core::{GeoPoint, NodeKey};
    use crate::router::cheapest_parallel_edge;
    use crate::{
        path_stats, shortest_path_stats, DijkstraRouter, EdgeData, RoadNetworkBuilder, Router,
        SpatialError, Weight,
    };
    use super::helpers::{approx, two_route_network};

    fn keys(v: &[i64]) -> Vec<NodeKey> {
        v.iter().copied().map(NodeKey).collect()
    }

    #[test]
    fn trivial_same_node() {
        let net = two_route_network();
        let n1 = net.node_id(NodeKey(1)).unwrap();
        let r = DijkstraRouter.route(&net, n1, n1, Weight::Length).unwrap();
        assert!(r.is_trivial());
        assert_eq!(r.cost, 0.0);

        let stats = shortest_path_stats(&net, NodeKey(1), NodeKey(1), Weight::Length);
        assert_eq!(stats.path, Some(keys(&[1])));
        assert_eq!((stats.distance_m, stats.time_s), (0.0, 0.0));
    }

    #[test]
    fn routes_by_length() {
        let net = two_route_network();
        let stats = shortest_path_stats(&net, NodeKey(1), NodeKey(5), Weight::Length);
        assert_eq!(stats.path, Some(keys(&[1, 4, 5])));
        assert!(approx(stats.distance_m, 200.0));
        assert!(approx(stats.time_s, 144.0));
    }

    #[test]
    fn routes_by_travel_time() {
        let net = two_route_network();
        let stats = shortest_path_stats(&net, NodeKey(1), NodeKey(5), Weight::TravelTime);
        assert_eq!(stats.path, Some(keys(&[1, 2, 3, 5])));
        assert!(approx(stats.distance_m, 300.0));
        assert!(approx(stats.time_s, 36.0));
    }

    #[test]
    fn no_path_between_components() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        let d = b.add_node(NodeKey(3), GeoPoint::new(-16.6, -68.2));
        let e = b.add_node(NodeKey(4), GeoPoint::new(-16.6, -68.199));
        b.add_road(a, c, EdgeData::new(100.0, 30.0));
        b.add_road(d, e, EdgeData::new(100.0, 30.0));
        let net = b.build();

        let stats = shortest_path_stats(&net, NodeKey(1), NodeKey(4), Weight::Length);
        assert!(!stats.is_found());
        assert!(stats.path.is_none());
        assert!(stats.distance_m.is_nan() && stats.time_s.is_nan());

        let err = DijkstraRouter.route(&net, a, e, Weight::Length);
        assert!(matches!(err, Err(SpatialError::NoRoute { .. })));
    }

    #[test]
    fn unknown_node_is_no_path() {
        let net = two_route_network();
        let stats = shortest_path_stats(&net, NodeKey(1), NodeKey(99), Weight::Length);
        assert_eq!(stats.path, None);
        assert!(stats.nodes().is_empty());
    }

    #[test]
    fn one_way_blocks_return() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        b.add_edge(a, c, EdgeData::new(100.0, 30.0));
        let net = b.build();

        assert!(shortest_path_stats(&net, NodeKey(1), NodeKey(2), Weight::Length).is_found());
        assert!(!shortest_path_stats(&net, NodeKey(2), NodeKey(1), Weight::Length).is_found());
    }

    #[test]
    fn parallel_edge_selection_follows_weight() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        b.add_edge(a, c, EdgeData::new(100.0, 10.0)); // short, 36 s
        b.add_edge(a, c, EdgeData::new(150.0, 100.0)); // long, 5.4 s
        let net = b.build();

        let by_len = shortest_path_stats(&net, NodeKey(1), NodeKey(2), Weight::Length);
        assert!(approx(by_len.distance_m, 100.0));
        assert!(approx(by_len.time_s, 36.0));

        let by_time = shortest_path_stats(&net, NodeKey(1), NodeKey(2), Weight::TravelTime);
        assert!(approx(by_time.distance_m, 150.0));
        assert!(approx(by_time.time_s, 5.4));

        let e = cheapest_parallel_edge(&net, a, c, Weight::Length).unwrap();
        assert_eq!(net.edge_key[e.index()], 0);
    }

    #[test]
    fn stats_reproducible_from_path() {
        let net = two_route_network();
        for weight in [Weight::Length, Weight::TravelTime] {
            let stats = shortest_path_stats(&net, NodeKey(2), NodeKey(4), weight);
            let (d, t) = path_stats(&net, stats.nodes(), weight).unwrap();
            assert_eq!(d, stats.distance_m);
            assert_eq!(t, stats.time_s);
        }
    }

    #[test]
    fn path_stats_rejects_broken_path() {
        let net = two_route_network();
        assert!(path_stats(&net, &keys(&[1, 3]), Weight::Length).is_none());
        assert!(path_stats(&net, &keys(&[42]), Weight::Length).is_none());
    }
}

// ── Components ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod components {
    use rt_core::{GeoPoint, NodeKey};
    use crate::{component_count, is_connected, largest_component, EdgeData, RoadNetworkBuilder};

    #[test]
    fn keeps_largest_fragment() {
        let mut b = RoadNetworkBuilder::new();
        let ids: Vec<_> = (1..=5)
            .map(|k| b.add_node(NodeKey(k), GeoPoint::new(-16.5, -68.2 + 0.001 * k as f64)))
            .collect();
        b.add_road(ids[0], ids[1], EdgeData::new(100.0, 30.0));
        // 3 → 4 → 5 one-way chain: weakly connected.
        b.add_edge(ids[2], ids[3], EdgeData::new(100.0, 30.0));
        b.add_edge(ids[3], ids[4], EdgeData::new(100.0, 30.0));
        let net = b.build();

        assert_eq!(component_count(&net), 2);
        assert!(!is_connected(&net));

        let main = largest_component(&net);
        assert!(is_connected(&main));
        assert_eq!(main.node_count(), 3);
        assert!(main.contains(NodeKey(3)) && main.contains(NodeKey(5)));
        assert!(!main.contains(NodeKey(1)));
        assert_eq!(main.edge_count(), 2);
    }

    #[test]
    fn tie_goes_to_lowest_node() {
        let mut b = RoadNetworkBuilder::new();
        let ids: Vec<_> = (1..=4)
            .map(|k| b.add_node(NodeKey(k), GeoPoint::new(-16.5, -68.2 + 0.001 * k as f64)))
            .collect();
        b.add_road(ids[2], ids[3], EdgeData::new(100.0, 30.0));
        b.add_road(ids[0], ids[1], EdgeData::new(100.0, 30.0));
        let main = largest_component(&b.build());
        assert!(main.contains(NodeKey(1)) && main.contains(NodeKey(2)));
        assert_eq!(main.node_count(), 2);
    }

    #[test]
    fn isolated_nodes_are_dropped() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        b.add_node(NodeKey(3), GeoPoint::new(-16.5, -68.198));
        b.add_road(a, c, EdgeData::new(100.0, 30.0));
        let main = largest_component(&b.build());
        assert_eq!(main.node_count(), 2);
    }
}

// ── Restriction overlay ───────────────────────────────────────────────────────

#[cfg(test)]
mod restrict {
    use rt_core::NodeKey;
    use crate::restrict::edge_midpoint;
    use crate::{apply_restrictions, ensure_speeds, restrict_zones, DisruptionZone};
    use super::helpers::{street, street_point};

    #[test]
    fn edge_at_zone_center_is_removed() {
        let net = street(12);
        let center = street_point(1).midpoint(street_point(2));
        let restricted = apply_restrictions(&net, &[center], 50.0);

        assert!(restricted.find_edge(NodeKey(1), NodeKey(2), 0).is_none());
        assert!(restricted.find_edge(NodeKey(2), NodeKey(1), 0).is_none());
        // Key 1 lost its only road and falls out of the main component.
        assert!(!restricted.contains(NodeKey(1)));
        assert_eq!(restricted.node_count(), 11);
    }

    #[test]
    fn distant_edge_is_retained_unchanged() {
        let net = street(12);
        let center = street_point(1).midpoint(street_point(2));
        let restricted = apply_restrictions(&net, &[center], 50.0);

        // Midpoint of 7–8 is ~640 m from the zone, more than 10× the radius.
        let before = net.find_edge(NodeKey(7), NodeKey(8), 0).unwrap();
        let after = restricted.find_edge(NodeKey(7), NodeKey(8), 0).unwrap();
        assert_eq!(net.edge(before), restricted.edge(after));
    }

    #[test]
    fn input_is_not_mutated() {
        let net = street(6);
        let (nodes, edges) = (net.node_count(), net.edge_count());
        let _ = apply_restrictions(&net, &[street_point(3)], 200.0);
        assert_eq!((net.node_count(), net.edge_count()), (nodes, edges));
    }

    #[test]
    fn pure_for_same_inputs() {
        let net = street(8);
        let zones = [DisruptionZone::new(street_point(4), 120.0)];
        let a = restrict_zones(&net, &zones);
        let b = restrict_zones(&net, &zones);
        assert_eq!(a.node_key, b.node_key);
        assert_eq!(a.edge_from, b.edge_from);
        assert_eq!(a.edge_to, b.edge_to);
        assert_eq!(a.edge_data, b.edge_data);
    }

    #[test]
    fn midpoint_is_halfway() {
        let net = street(2);
        let e = net.find_edge(NodeKey(1), NodeKey(2), 0).unwrap();
        let mid = edge_midpoint(&net, e);
        let expected = street_point(1).midpoint(street_point(2));
        assert!(mid.distance_m(expected) < 0.01);
    }

    #[test]
    fn restriction_keeps_speeds_normalized() {
        let mut net = street(10);
        assert!(ensure_speeds(&mut net, 30.0).is_clean());
        let mut restricted = apply_restrictions(&net, &[street_point(5)], 60.0);
        assert!(restricted.edge_count() < net.edge_count());
        assert!(ensure_speeds(&mut restricted, 30.0).is_clean());
    }

    #[test]
    fn no_zones_keeps_everything() {
        let net = street(5);
        let restricted = apply_restrictions(&net, &[], 500.0);
        assert_eq!(restricted.edge_count(), net.edge_count());
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod persist {
    use std::fs;

    use rt_core::{GeoPoint, NodeKey};
    use crate::{load_network, save_network, EdgeData, MaxSpeed, RoadNetworkBuilder, SpatialError};

    #[test]
    fn save_and_reload_preserves_graph() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(100), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(200), GeoPoint::new(-16.5, -68.199));
        b.add_edge(a, c, EdgeData::new(100.0, 30.0));
        b.add_edge(
            a,
            c,
            EdgeData::raw()
                .with_length_m(120.0)
                .with_maxspeed(MaxSpeed::Candidates(vec!["40".into(), "60".into()]))
                .with_geometry(vec![GeoPoint::new(-16.5, -68.2), GeoPoint::new(-16.5, -68.199)]),
        );
        let net = b.build();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        save_network(&net, &path).unwrap();
        let back = load_network(&path).unwrap();

        assert_eq!(back.node_key, net.node_key);
        assert_eq!(back.node_pos, net.node_pos);
        assert_eq!(back.edge_key, net.edge_key);
        assert_eq!(back.edge_data, net.edge_data);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, r#"{"version":999,"nodes":[],"edges":[]}"#).unwrap();
        assert!(matches!(load_network(&path), Err(SpatialError::Format(_))));
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_network(&path), Err(SpatialError::Json(_))));
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(
            &path,
            r#"{"version":1,"nodes":[{"key":1,"lat":-16.5,"lon":-68.2}],"edges":[{"from":1,"to":2,"key":0}]}"#,
        )
        .unwrap();
        assert!(matches!(load_network(&path), Err(SpatialError::NodeNotFound(NodeKey(2)))));
    }
}

// ── OSM import ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod import {
    use rustc_hash::FxHashMap;

    use rt_core::{GeoPoint, NodeKey};
    use crate::import::{is_drivable, maxspeed_from_tag, oneway_from_tags};
    use crate::{apply_restrictions, build_from_ways, BoundingBox, MaxSpeed, Oneway, OsmWay};
    use super::helpers::approx;

    /// Keys `1..=n` on an east-west line, 0.001° apart.
    fn line(n: i64) -> FxHashMap<i64, GeoPoint> {
        (1..=n)
            .map(|k| (k, GeoPoint::new(-16.5, -68.2 + 0.001 * k as f64)))
            .collect()
    }

    fn positions() -> FxHashMap<i64, GeoPoint> {
        line(4)
    }

    #[test]
    fn tag_helpers() {
        assert!(is_drivable("residential"));
        assert!(!is_drivable("footway"));
        assert_eq!(oneway_from_tags("primary", Some("yes")), Oneway::Forward);
        assert_eq!(oneway_from_tags("primary", Some("-1")), Oneway::Reverse);
        assert_eq!(oneway_from_tags("motorway", None), Oneway::Forward);
        assert_eq!(oneway_from_tags("motorway", Some("no")), Oneway::No);
        assert_eq!(oneway_from_tags("residential", None), Oneway::No);

        assert_eq!(maxspeed_from_tag("50"), Some(MaxSpeed::Value(50.0)));
        assert_eq!(
            maxspeed_from_tag("50; 30"),
            Some(MaxSpeed::Candidates(vec!["50".into(), "30".into()]))
        );
        assert_eq!(maxspeed_from_tag("20 mph"), Some(MaxSpeed::Text("20 mph".into())));
        assert_eq!(maxspeed_from_tag("  "), None);
    }

    #[test]
    fn ways_become_directed_edges() {
        let ways = vec![
            OsmWay { refs: vec![1, 2], maxspeed: None, oneway: Oneway::No },
            OsmWay { refs: vec![2, 3], maxspeed: Some(MaxSpeed::Value(40.0)), oneway: Oneway::Forward },
            OsmWay { refs: vec![3, 4], maxspeed: None, oneway: Oneway::Reverse },
        ];
        let net = build_from_ways(&positions(), &ways);

        assert_eq!(net.node_count(), 4);
        assert_eq!(net.edge_count(), 4);
        assert!(net.find_edge(NodeKey(1), NodeKey(2), 0).is_some());
        assert!(net.find_edge(NodeKey(2), NodeKey(1), 0).is_some());
        assert!(net.find_edge(NodeKey(3), NodeKey(2), 0).is_none());
        assert!(net.find_edge(NodeKey(4), NodeKey(3), 0).is_some());
        assert!(net.find_edge(NodeKey(3), NodeKey(4), 0).is_none());

        let e = net.find_edge(NodeKey(2), NodeKey(3), 0).unwrap();
        assert_eq!(net.edge(e).maxspeed(), Some(&MaxSpeed::Value(40.0)));
        assert_eq!(net.edge(e).speed_kph(), None);
        assert!(net.edge(e).length_m().unwrap() > 100.0);
    }

    #[test]
    fn overlapping_ways_produce_parallel_edges() {
        let ways = vec![
            OsmWay { refs: vec![1, 2], maxspeed: None, oneway: Oneway::Forward },
            OsmWay { refs: vec![1, 2], maxspeed: None, oneway: Oneway::Forward },
        ];
        let net = build_from_ways(&positions(), &ways);
        assert!(net.find_edge(NodeKey(1), NodeKey(2), 1).is_some());
    }

    #[test]
    fn unknown_refs_split_the_way() {
        let pos = line(4);
        let ways = vec![OsmWay { refs: vec![1, 2, 99, 3, 4], maxspeed: None, oneway: Oneway::No }];
        let net = build_from_ways(&pos, &ways);
        assert_eq!(net.node_count(), 4);
        assert_eq!(net.edge_count(), 4);
        assert!(net.find_edge(NodeKey(1), NodeKey(2), 0).is_some());
        assert!(net.find_edge(NodeKey(3), NodeKey(4), 0).is_some());
        assert!(net.find_edge(NodeKey(2), NodeKey(3), 0).is_none());
    }

    #[test]
    fn isolated_refs_add_nothing() {
        let ways = vec![OsmWay { refs: vec![1, 99, 2], maxspeed: None, oneway: Oneway::No }];
        let net = build_from_ways(&positions(), &ways);
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
    }

    #[test]
    fn interior_vertices_fold_into_geometry() {
        let pos = line(5);
        let ways = vec![OsmWay { refs: vec![1, 2, 3, 4, 5], maxspeed: None, oneway: Oneway::No }];
        let net = build_from_ways(&pos, &ways);

        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 2);
        let e = net.find_edge(NodeKey(1), NodeKey(5), 0).unwrap();
        let expected: f64 = (1..5).map(|k| pos[&k].distance_m(pos[&(k + 1)])).sum();
        assert!(approx(net.edge(e).length_m().unwrap(), expected));
        assert_eq!(net.edge(e).geometry().len(), 5);
        assert_eq!(net.edge(e).geometry()[1], pos[&2]);

        let back = net.find_edge(NodeKey(5), NodeKey(1), 0).unwrap();
        assert_eq!(net.edge(back).geometry()[0], pos[&5]);
    }

    #[test]
    fn shared_vertex_stays_a_node() {
        let mut pos = line(3);
        pos.insert(4, GeoPoint::new(-16.501, -68.198));
        let ways = vec![
            OsmWay { refs: vec![1, 2, 3], maxspeed: None, oneway: Oneway::No },
            OsmWay { refs: vec![2, 4], maxspeed: None, oneway: Oneway::No },
        ];
        let net = build_from_ways(&pos, &ways);
        assert_eq!(net.node_count(), 4);
        assert_eq!(net.edge_count(), 6);
        assert!(net.find_edge(NodeKey(1), NodeKey(2), 0).is_some());
        assert!(net.find_edge(NodeKey(2), NodeKey(3), 0).is_some());
        assert!(net.find_edge(NodeKey(4), NodeKey(2), 0).is_some());
    }

    #[test]
    fn reverse_way_keeps_travel_order_geometry() {
        let pos = line(3);
        let ways = vec![OsmWay { refs: vec![1, 2, 3], maxspeed: None, oneway: Oneway::Reverse }];
        let net = build_from_ways(&pos, &ways);
        assert_eq!(net.edge_count(), 1);
        let e = net.find_edge(NodeKey(3), NodeKey(1), 0).unwrap();
        assert_eq!(net.edge(e).geometry(), &[pos[&3], pos[&2], pos[&1]][..]);
    }

    #[test]
    fn zone_clipping_one_end_keeps_the_street() {
        let pos = line(5);
        let ways = vec![OsmWay { refs: vec![1, 2, 3, 4, 5], maxspeed: None, oneway: Oneway::No }];
        let net = build_from_ways(&pos, &ways);

        // The street midpoint is vertex 3, about 160 m from the zone.
        let restricted = apply_restrictions(&net, &[pos[&1].midpoint(pos[&2])], 80.0);
        assert_eq!(restricted.node_count(), 2);
        assert!(restricted.find_edge(NodeKey(1), NodeKey(5), 0).is_some());
        assert!(restricted.find_edge(NodeKey(5), NodeKey(1), 0).is_some());
    }

    #[test]
    fn bbox_around_points() {
        let pts = [GeoPoint::new(-16.5, -68.2), GeoPoint::new(-16.6, -68.1)];
        let b = BoundingBox::around(&pts, 0.01).unwrap();
        assert!(b.contains(GeoPoint::new(-16.605, -68.095)));
        assert!(!b.contains(GeoPoint::new(-16.7, -68.1)));
        assert!(BoundingBox::around(&[], 0.01).is_none());
    }
}

// ── Graph store ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rt_core::{GeoPoint, NodeKey};
    use crate::{
        is_connected, EdgeData, GraphStore, MapSource, RoadNetwork, RoadNetworkBuilder,
        SpatialError, SpatialResult,
    };

    /// Two connected raw edges plus an isolated fragment.
    fn raw_map() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(NodeKey(1), GeoPoint::new(-16.5, -68.2));
        let c = b.add_node(NodeKey(2), GeoPoint::new(-16.5, -68.199));
        let d = b.add_node(NodeKey(3), GeoPoint::new(-16.5, -68.198));
        let x = b.add_node(NodeKey(8), GeoPoint::new(-16.6, -68.2));
        let y = b.add_node(NodeKey(9), GeoPoint::new(-16.6, -68.199));
        b.add_road(a, c, EdgeData::raw().with_length_m(100.0));
        b.add_road(c, d, EdgeData::raw());
        b.add_road(x, y, EdgeData::raw());
        b.build()
    }

    fn counting_source(calls: Arc<AtomicUsize>) -> impl MapSource {
        move || -> SpatialResult<RoadNetwork> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(raw_map())
        }
    }

    #[test]
    fn loads_once_and_prepares() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = GraphStore::new(counting_source(calls.clone()), 30.0);
        assert!(!store.is_loaded());

        let g1 = store.load().unwrap();
        let g2 = store.load().unwrap();
        assert!(Arc::ptr_eq(&g1, &g2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.is_loaded());

        assert!(is_connected(&g1));
        assert_eq!(g1.node_count(), 3);
        assert!(g1.edge_data.iter().all(|e| e.travel_time_s().is_some()));
    }

    #[test]
    fn concurrent_first_access_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = GraphStore::new(counting_source(calls.clone()), 30.0);
        let graphs: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| store.load().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(graphs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn cache_file_is_written_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");

        let calls = Arc::new(AtomicUsize::new(0));
        let first = GraphStore::new(counting_source(calls.clone()), 30.0).with_cache_path(&path);
        let g = first.load().unwrap();
        assert!(path.exists());

        let offline = || -> SpatialResult<RoadNetwork> { Err(SpatialError::Source("offline".into())) };
        let second = GraphStore::new(offline, 30.0).with_cache_path(&path);
        let again = second.load().unwrap();
        assert_eq!(again.node_key, g.node_key);
        assert_eq!(again.edge_data, g.edge_data);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn corrupt_cache_falls_back_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        fs::write(&path, "garbage").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let store = GraphStore::new(counting_source(calls.clone()), 30.0).with_cache_path(&path);
        assert_eq!(store.load().unwrap().node_count(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The rebuilt network replaced the corrupt file.
        assert!(crate::load_network(&path).is_ok());
    }

    #[test]
    fn source_failure_is_reported_and_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let flaky = move || -> SpatialResult<RoadNetwork> {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SpatialError::Source("timeout".into()))
            } else {
                Ok(raw_map())
            }
        };
        let store = GraphStore::new(flaky, 30.0);
        assert!(matches!(store.load(), Err(SpatialError::Source(_))));
        assert!(!store.is_loaded());
        assert!(store.load().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unwritable_cache_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let path = blocker.join("net.json");

        let calls = Arc::new(AtomicUsize::new(0));
        let store = GraphStore::new(counting_source(calls), 30.0).with_cache_path(&path);
        assert!(store.load().is_ok());
    }
}
