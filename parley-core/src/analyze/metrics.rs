// Whole-graph metrics: density, diameter, reciprocity, degree tallies,
// average degree and clustering. Recomputed from scratch on every graph.
#![allow(clippy::cast_precision_loss)]

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::{DegreeMaps, Link, NetworkGraph, NetworkStatistics, Node};

/// Undirected, unweighted, simple view of a graph: self-loops and links to
/// unknown nodes are dropped, parallel and reverse links collapse.
/// `link_count` still counts every link whose endpoints both exist.
#[derive(Debug)]
struct SimpleAdjacency {
    neighbors: Vec<HashSet<usize>>,
    pair_count: usize,
    link_count: usize,
}

impl SimpleAdjacency {
    fn build(nodes: &[Node], links: &[Link]) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut neighbors = vec![HashSet::new(); nodes.len()];
        let mut pair_count = 0;
        let mut link_count = 0;
        let mut dangling = 0usize;

        for link in links {
            let (Some(&u), Some(&v)) = (
                index.get(link.source.as_str()),
                index.get(link.target.as_str()),
            ) else {
                dangling += 1;
                continue;
            };
            link_count += 1;
            if u == v {
                continue;
            }
            if neighbors[u].insert(v) {
                neighbors[v].insert(u);
                pair_count += 1;
            }
        }

        if dangling > 0 {
            debug!(dangling, "Ignoring links with unknown endpoints");
        }

        Self {
            neighbors,
            pair_count,
            link_count,
        }
    }

    fn node_count(&self) -> usize {
        self.neighbors.len()
    }
}

/// `2m / (n(n-1))` with `m` the number of links between known nodes, 0 when
/// `n < 2`. Links are taken as received, so reverse or parallel links each
/// count and the value exceeds 1 on graphs that are not simple.
pub fn density(graph: &NetworkGraph) -> f64 {
    let adj = SimpleAdjacency::build(&graph.nodes, &graph.links);
    density_of(&adj)
}

fn density_of(adj: &SimpleAdjacency) -> f64 {
    let n = adj.node_count();
    if n < 2 {
        return 0.0;
    }
    (2 * adj.link_count) as f64 / (n * (n - 1)) as f64
}

/// Longest finite shortest-path distance, with every link costing 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diameter {
    pub value: u32,
    /// False when at least one pair of nodes is unreachable. The value then
    /// only covers pairs inside the same component.
    pub connected: bool,
}

/// Diameter via Floyd–Warshall on the undirected graph. Unreachable pairs
/// are left out of the maximum.
pub fn diameter(graph: &NetworkGraph) -> Diameter {
    let adj = SimpleAdjacency::build(&graph.nodes, &graph.links);
    diameter_of(&adj)
}

const UNREACHABLE: u32 = u32::MAX;

fn diameter_of(adj: &SimpleAdjacency) -> Diameter {
    let n = adj.node_count();
    if n < 2 {
        return Diameter {
            value: 0,
            connected: true,
        };
    }

    let mut dist = vec![UNREACHABLE; n * n];
    for i in 0..n {
        dist[i * n + i] = 0;
        for &j in &adj.neighbors[i] {
            dist[i * n + j] = 1;
        }
    }

    for k in 0..n {
        for i in 0..n {
            let dik = dist[i * n + k];
            if dik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let dkj = dist[k * n + j];
                if dkj == UNREACHABLE {
                    continue;
                }
                let through = dik + dkj;
                if through < dist[i * n + j] {
                    dist[i * n + j] = through;
                }
            }
        }
    }

    let mut value = 0;
    let mut connected = true;
    for &d in &dist {
        if d == UNREACHABLE {
            connected = false;
        } else {
            value = value.max(d);
        }
    }

    Diameter { value, connected }
}

/// Fraction of distinct directed links whose reverse link also exists.
///
/// Self-loops, duplicates and links to unknown nodes are ignored, so the
/// result is always within `[0, 1]`; 0 for a graph without links.
pub fn reciprocity(graph: &NetworkGraph) -> f64 {
    let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let edges: HashSet<(&str, &str)> = graph
        .links
        .iter()
        .filter(|l| l.source != l.target)
        .filter(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
        .map(|l| (l.source.as_str(), l.target.as_str()))
        .collect();

    if edges.is_empty() {
        return 0.0;
    }

    let mutual = edges
        .iter()
        .filter(|(s, t)| edges.contains(&(*t, *s)))
        .count();
    mutual as f64 / edges.len() as f64
}

/// Tally of link endpoints: every link adds one to its target's in-degree
/// and one to its source's out-degree.
pub fn degree_maps(graph: &NetworkGraph) -> DegreeMaps {
    let mut maps = DegreeMaps::default();
    for link in &graph.links {
        *maps.in_degree.entry(link.target.clone()).or_insert(0) += 1;
        *maps.out_degree.entry(link.source.clone()).or_insert(0) += 1;
    }
    maps
}

/// Mean number of neighbours per node in the undirected simple graph.
pub fn average_degree(graph: &NetworkGraph) -> f64 {
    let adj = SimpleAdjacency::build(&graph.nodes, &graph.links);
    average_degree_of(&adj)
}

fn average_degree_of(adj: &SimpleAdjacency) -> f64 {
    let n = adj.node_count();
    if n == 0 {
        return 0.0;
    }
    (2 * adj.pair_count) as f64 / n as f64
}

/// Average local clustering coefficient. Nodes with fewer than two
/// neighbours count as 0.
pub fn clustering_coefficient(graph: &NetworkGraph) -> f64 {
    let adj = SimpleAdjacency::build(&graph.nodes, &graph.links);
    clustering_of(&adj)
}

fn clustering_of(adj: &SimpleAdjacency) -> f64 {
    let n = adj.node_count();
    if n == 0 {
        return 0.0;
    }

    let total: f64 = adj
        .neighbors
        .iter()
        .map(|nbrs| {
            let k = nbrs.len();
            if k < 2 {
                return 0.0;
            }
            let members: Vec<usize> = nbrs.iter().copied().collect();
            let mut triangles = 0usize;
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    if adj.neighbors[a].contains(&b) {
                        triangles += 1;
                    }
                }
            }
            (2 * triangles) as f64 / (k * (k - 1)) as f64
        })
        .sum();

    total / n as f64
}

/// All whole-graph numbers in one pass over a shared adjacency.
pub fn statistics(graph: &NetworkGraph) -> NetworkStatistics {
    let adj = SimpleAdjacency::build(&graph.nodes, &graph.links);
    let diameter = diameter_of(&adj);

    NetworkStatistics {
        node_count: adj.node_count(),
        edge_count: adj.link_count,
        density: density_of(&adj),
        diameter: diameter.value,
        reciprocity: reciprocity(graph),
        average_degree: average_degree_of(&adj),
        clustering_coefficient: clustering_of(&adj),
        connected: diameter.connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> NetworkGraph {
        NetworkGraph::new(
            ids.iter().map(|id| Node::new(*id, 1)).collect(),
            links.iter().map(|(s, t)| Link::new(*s, *t, 1)).collect(),
        )
    }

    fn complete(n: usize) -> NetworkGraph {
        let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let mut links = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                links.push(Link::new(ids[i].clone(), ids[j].clone(), 1));
            }
        }
        NetworkGraph::new(ids.iter().map(|id| Node::new(id.clone(), 1)).collect(), links)
    }

    #[test]
    fn density_small_graphs_are_zero() {
        assert!(density(&graph(&[], &[])).abs() < f64::EPSILON);
        assert!(density(&graph(&["a"], &[])).abs() < f64::EPSILON);
    }

    #[test]
    fn density_complete_graph_is_one() {
        for n in 2..8 {
            assert!((density(&complete(n)) - 1.0).abs() < 1e-12, "K{n}");
        }
    }

    #[test]
    fn density_counts_reverse_links() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert!((density(&g) - 2.0).abs() < 1e-12);

        let stats = statistics(&g);
        assert_eq!(stats.edge_count, 2);
        let total_in: u64 = degree_maps(&g).in_degree.values().sum();
        assert_eq!(total_in, stats.edge_count as u64);
        // Neighbour counts still collapse the pair.
        assert!((stats.average_degree - 1.0).abs() < 1e-12);
    }

    #[test]
    fn diameter_single_edge() {
        let d = diameter(&graph(&["a", "b"], &[("a", "b")]));
        assert_eq!(d, Diameter { value: 1, connected: true });
    }

    #[test]
    fn diameter_path_graph() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")],
        );
        assert_eq!(diameter(&g).value, 4);
    }

    #[test]
    fn diameter_ignores_unreachable_pairs() {
        // Two components: a-b-c path and a lone d-e edge.
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("d", "e")],
        );
        let d = diameter(&g);
        assert_eq!(d.value, 2);
        assert!(!d.connected);
    }

    #[test]
    fn diameter_treats_links_as_undirected() {
        let g = graph(&["a", "b", "c"], &[("b", "a"), ("b", "c")]);
        assert_eq!(diameter(&g).value, 2);
    }

    #[test]
    fn reciprocity_all_mutual_is_one() {
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")],
        );
        assert!((reciprocity(&g) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reciprocity_partial() {
        // a<->b mutual, b->c one-way: 2 of 3 distinct edges reciprocated.
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c")]);
        assert!((reciprocity(&g) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn reciprocity_duplicates_do_not_inflate() {
        let g = graph(&["a", "b"], &[("a", "b"), ("a", "b"), ("b", "a"), ("a", "a")]);
        assert!((reciprocity(&g) - 1.0).abs() < 1e-12);
        assert!(reciprocity(&graph(&["a"], &[])).abs() < f64::EPSILON);
    }

    #[test]
    fn degree_maps_tally_every_link() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("c", "a")]);
        let maps = degree_maps(&g);
        assert_eq!(maps.out_degree["a"], 2);
        assert_eq!(maps.in_degree["a"], 1);
        assert_eq!(maps.in_degree["b"], 1);
        assert!(!maps.out_degree.contains_key("b"));
    }

    #[test]
    fn clustering_triangle_and_star() {
        let triangle = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert!((clustering_coefficient(&triangle) - 1.0).abs() < 1e-12);

        let star = graph(&["hub", "x", "y", "z"], &[("hub", "x"), ("hub", "y"), ("hub", "z")]);
        assert!(clustering_coefficient(&star).abs() < f64::EPSILON);
    }

    #[test]
    fn statistics_bundle() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let stats = statistics(&g);
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(stats.diameter, 3);
        assert!(stats.connected);
        assert!((stats.density - 0.5).abs() < 1e-12);
        assert!((stats.average_degree - 1.5).abs() < 1e-12);
    }

    #[test]
    fn statistics_skip_dangling_links() {
        let g = graph(&["a", "b"], &[("a", "b"), ("a", "ghost")]);
        let stats = statistics(&g);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.diameter, 1);
    }

    fn arb_graph() -> impl Strategy<Value = NetworkGraph> {
        (1usize..12).prop_flat_map(|n| {
            prop::collection::vec((0..n, 0..n), 0..40).prop_map(move |pairs| {
                let ids: Vec<String> = (0..n).map(|i| format!("u{i}")).collect();
                let links = pairs
                    .into_iter()
                    .map(|(s, t)| Link::new(ids[s].clone(), ids[t].clone(), 1))
                    .collect();
                NetworkGraph::new(ids.iter().map(|id| Node::new(id.clone(), 1)).collect(), links)
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn density_tracks_link_count(g in arb_graph()) {
            let n = g.nodes.len();
            let d = density(&g);
            if n < 2 {
                prop_assert!(d.abs() < f64::EPSILON);
            } else {
                let expected = (2 * g.links.len()) as f64 / (n * (n - 1)) as f64;
                prop_assert!((d - expected).abs() < 1e-12);
            }
            prop_assert_eq!(statistics(&g).edge_count, g.links.len());
        }

        #[test]
        fn density_within_unit_interval_when_simple(n in 2usize..10, mask in any::<u64>()) {
            // Each unordered pair at most once, no loops.
            let ids: Vec<String> = (0..n).map(|i| format!("u{i}")).collect();
            let mut links = Vec::new();
            let mut bit = 0;
            for i in 0..n {
                for j in (i + 1)..n {
                    if (mask >> bit) & 1 == 1 {
                        links.push(Link::new(ids[i].clone(), ids[j].clone(), 1));
                    }
                    bit += 1;
                }
            }
            let g = NetworkGraph::new(ids.iter().map(|id| Node::new(id.clone(), 1)).collect(), links);
            let d = density(&g);
            prop_assert!((0.0..=1.0).contains(&d));
        }

        #[test]
        fn reciprocity_within_unit_interval(g in arb_graph()) {
            let r = reciprocity(&g);
            prop_assert!((0.0..=1.0).contains(&r));
        }

        #[test]
        fn degree_tallies_match_link_count(g in arb_graph()) {
            let maps = degree_maps(&g);
            let total_in: u64 = maps.in_degree.values().sum();
            let total_out: u64 = maps.out_degree.values().sum();
            prop_assert_eq!(total_in, g.links.len() as u64);
            prop_assert_eq!(total_out, g.links.len() as u64);
        }

        #[test]
        fn diameter_below_node_count(g in arb_graph()) {
            let d = diameter(&g);
            prop_assert!((d.value as usize) < g.nodes.len().max(1));
        }
    }
}
