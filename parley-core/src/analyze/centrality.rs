// Node centrality on the undirected interaction graph: degree, betweenness,
// closeness, eigenvector and PageRank.
//
// Graph algorithms intentionally cast int↔float (precision loss acceptable for metrics).
#![allow(clippy::cast_precision_loss)]

use std::collections::{HashMap, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Bfs, EdgeRef};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::AnalysisSection;
use crate::types::{Link, NetworkGraph};

// ── Configuration ──────────────────────────────────────────────────

/// Configuration for centrality algorithms.
#[derive(Debug, Clone)]
pub struct CentralityConfig {
    /// `PageRank` damping factor.
    pub damping: f64,
    /// Max iterations for `PageRank`.
    pub pagerank_max_iterations: u32,
    /// Max iterations for eigenvector power iteration.
    pub eigenvector_max_iterations: u32,
    /// Per-node convergence tolerance for the iterative algorithms.
    pub tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            pagerank_max_iterations: 100,
            eigenvector_max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

impl From<&AnalysisSection> for CentralityConfig {
    fn from(section: &AnalysisSection) -> Self {
        Self {
            damping: section.damping,
            pagerank_max_iterations: section.pagerank_max_iterations,
            eigenvector_max_iterations: section.eigenvector_max_iterations,
            tolerance: section.tolerance,
        }
    }
}

// ── Interaction graph ──────────────────────────────────────────────

/// A petgraph `UnGraph` of participants, with edge weights counting the
/// exchanges between each pair and an id ↔ `NodeIndex` mapping.
#[derive(Debug, Default, Clone)]
pub struct InteractionGraph {
    pub graph: UnGraph<String, u64>,
    pub node_to_index: HashMap<String, NodeIndex>,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant if not present yet.
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_to_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.node_to_index.insert(id.to_string(), idx);
        idx
    }

    /// Record `weight` exchanges between two participants. Repeated calls
    /// for the same pair, in either order, accumulate on one edge.
    pub fn add_interaction(&mut self, a: &str, b: &str, weight: u64) {
        if a == b {
            return;
        }
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        match self.graph.find_edge(ia, ib) {
            Some(edge) => self.graph[edge] += weight,
            None => {
                self.graph.add_edge(ia, ib, weight);
            }
        }
    }

    /// Rebuild from a fetched graph. Links to unknown nodes are skipped.
    pub fn from_network(network: &NetworkGraph) -> Self {
        let mut g = Self::new();
        for node in &network.nodes {
            g.add_node(&node.id);
        }
        for Link {
            source,
            target,
            weight,
        } in &network.links
        {
            if g.node_to_index.contains_key(source) && g.node_to_index.contains_key(target) {
                g.add_interaction(source, target, *weight);
            }
        }
        g
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Connected components, each listed in ascending index order, ordered
    /// by their smallest member.
    pub fn components(&self) -> Vec<Vec<NodeIndex>> {
        let mut seen = vec![false; self.node_count()];
        let mut components = Vec::new();

        for start in self.graph.node_indices() {
            if seen[start.index()] {
                continue;
            }
            let mut members = Vec::new();
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(nx) = bfs.next(&self.graph) {
                seen[nx.index()] = true;
                members.push(nx);
            }
            members.sort_unstable();
            components.push(members);
        }

        components
    }

    /// The subgraph induced by `members`; weights are kept.
    fn induced(&self, members: &[NodeIndex]) -> Self {
        let mut keep = vec![false; self.node_count()];
        for m in members {
            keep[m.index()] = true;
        }
        let graph = self.graph.filter_map(
            |idx, id| keep[idx.index()].then(|| id.clone()),
            |_, w| Some(*w),
        );
        let node_to_index = graph
            .node_indices()
            .map(|idx| (graph[idx].clone(), idx))
            .collect();
        Self {
            graph,
            node_to_index,
        }
    }
}

// ── Centrality bundle ──────────────────────────────────────────────

/// Scores indexed by `NodeIndex::index()` of the graph they were computed on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentralityScores {
    pub degree: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub closeness: Vec<f64>,
    pub eigenvector: Vec<f64>,
    pub pagerank: Vec<f64>,
}

/// Compute every centrality measure.
///
/// Degree and betweenness cover the whole graph. Closeness, eigenvector and
/// `PageRank` are computed on the largest connected component only when the
/// graph is disconnected; all other nodes get 0 for those three.
pub fn compute_centrality(graph: &InteractionGraph, config: &CentralityConfig) -> CentralityScores {
    let n = graph.node_count();
    if n == 0 {
        return CentralityScores::default();
    }

    let degree = degree_centrality(graph);
    let betweenness = brandes_betweenness(graph);

    let components = graph.components();
    let (closeness, eigenvector, pagerank) = if components.len() <= 1 {
        (
            closeness_centrality(graph),
            eigenvector_centrality(graph, config),
            weighted_pagerank(graph, config),
        )
    } else {
        let largest = components
            .iter()
            .fold(&components[0], |best, c| if c.len() > best.len() { c } else { best });
        info!(
            components = components.len(),
            largest = largest.len(),
            "Graph is disconnected, scoring largest component"
        );

        let sub = graph.induced(largest);
        let sub_closeness = closeness_centrality(&sub);
        let sub_eigen = eigenvector_centrality(&sub, config);
        let sub_pr = weighted_pagerank(&sub, config);

        let mut closeness = vec![0.0; n];
        let mut eigenvector = vec![0.0; n];
        let mut pagerank = vec![0.0; n];
        for sub_idx in sub.graph.node_indices() {
            let full_idx = graph.node_to_index[&sub.graph[sub_idx]].index();
            let i = sub_idx.index();
            closeness[full_idx] = sub_closeness[i];
            eigenvector[full_idx] = sub_eigen[i];
            pagerank[full_idx] = sub_pr[i];
        }
        (closeness, eigenvector, pagerank)
    };

    CentralityScores {
        degree,
        betweenness,
        closeness,
        eigenvector,
        pagerank,
    }
}

// ── Degree ─────────────────────────────────────────────────────────

/// Fraction of the other nodes each node is connected to.
pub fn degree_centrality(graph: &InteractionGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    graph
        .graph
        .node_indices()
        .map(|idx| graph.graph.neighbors(idx).count() as f64 * scale)
        .collect()
}

// ── Betweenness Centrality (Brandes algorithm) ─────────────────────

/// Brandes' algorithm on the unweighted undirected graph, normalized by
/// `(n-1)(n-2)` so a star's centre scores 1. Graphs with fewer than three
/// nodes score 0 everywhere.
pub fn brandes_betweenness(graph: &InteractionGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let g = &graph.graph;
    let sources: Vec<NodeIndex> = g.node_indices().collect();

    // Per-source dependencies, collected in source order so the sum is
    // deterministic.
    let partials: Vec<Vec<f64>> = sources
        .par_iter()
        .map(|&s| {
            let s_idx = s.index();
            let mut stack: Vec<NodeIndex> = Vec::new();
            let mut predecessors: Vec<Vec<NodeIndex>> = vec![vec![]; n];
            let mut sigma = vec![0.0_f64; n]; // number of shortest paths
            sigma[s_idx] = 1.0;
            let mut dist: Vec<i64> = vec![-1; n];
            dist[s_idx] = 0;

            let mut queue = VecDeque::new();
            queue.push_back(s);

            while let Some(v) = queue.pop_front() {
                stack.push(v);
                let v_idx = v.index();

                for neighbor in g.neighbors(v) {
                    let w_idx = neighbor.index();

                    if dist[w_idx] < 0 {
                        dist[w_idx] = dist[v_idx] + 1;
                        queue.push_back(neighbor);
                    }

                    if dist[w_idx] == dist[v_idx] + 1 {
                        sigma[w_idx] += sigma[v_idx];
                        predecessors[w_idx].push(v);
                    }
                }
            }

            let mut delta = vec![0.0_f64; n];
            let mut contribution = vec![0.0_f64; n];
            while let Some(w) = stack.pop() {
                let w_idx = w.index();
                for &v in &predecessors[w_idx] {
                    let v_idx = v.index();
                    delta[v_idx] += sigma[v_idx] / sigma[w_idx] * (1.0 + delta[w_idx]);
                }
                if w != s {
                    contribution[w_idx] = delta[w_idx];
                }
            }
            contribution
        })
        .collect();

    let mut cb = vec![0.0_f64; n];
    for partial in &partials {
        for (total, value) in cb.iter_mut().zip(partial) {
            *total += value;
        }
    }

    if n <= 2 {
        return vec![0.0; n];
    }
    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    cb.iter().map(|v| v * scale).collect()
}

// ── Closeness ──────────────────────────────────────────────────────

/// Closeness with the Wasserman–Faust correction for disconnected graphs:
/// `(r-1)/Σd · (r-1)/(n-1)` where `r` counts the nodes reachable from `u`.
pub fn closeness_centrality(graph: &InteractionGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![0.0; n];
    }

    let g = &graph.graph;
    let sources: Vec<NodeIndex> = g.node_indices().collect();

    sources
        .par_iter()
        .map(|&s| {
            let mut dist = vec![usize::MAX; n];
            dist[s.index()] = 0;
            let mut queue = VecDeque::from([s]);
            let mut total = 0usize;
            let mut reachable = 1usize;

            while let Some(v) = queue.pop_front() {
                let d = dist[v.index()];
                for w in g.neighbors(v) {
                    if dist[w.index()] == usize::MAX {
                        dist[w.index()] = d + 1;
                        total += d + 1;
                        reachable += 1;
                        queue.push_back(w);
                    }
                }
            }

            if total == 0 {
                return 0.0;
            }
            let r = (reachable - 1) as f64;
            (r / total as f64) * (r / (n - 1) as f64)
        })
        .collect()
}

// ── Eigenvector ────────────────────────────────────────────────────

/// Eigenvector centrality by power iteration on `A + I`, L2-normalized.
/// Falls back to all zeros when the iteration does not converge.
pub fn eigenvector_centrality(graph: &InteractionGraph, config: &CentralityConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let g = &graph.graph;
    let mut x = vec![1.0 / n as f64; n];

    for iteration in 0..config.eigenvector_max_iterations {
        let last = x.clone();
        for v in g.node_indices() {
            for w in g.neighbors(v) {
                x[w.index()] += last[v.index()];
            }
        }

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for v in &mut x {
            *v /= norm;
        }

        let diff: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if diff < n as f64 * config.tolerance {
            debug!(iteration, "Eigenvector centrality converged");
            return x;
        }
    }

    warn!(
        iterations = config.eigenvector_max_iterations,
        "Eigenvector centrality did not converge, using zeros"
    );
    vec![0.0; n]
}

// ── PageRank ───────────────────────────────────────────────────────

/// Weighted `PageRank`, each undirected edge acting as two arcs whose
/// transition probability is proportional to the exchange count. Isolated
/// nodes redistribute their rank uniformly. Falls back to all zeros when
/// the iteration does not converge.
pub fn weighted_pagerank(graph: &InteractionGraph, config: &CentralityConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let g = &graph.graph;
    let alpha = config.damping;
    let uniform = 1.0 / n as f64;

    // Out-weight per node (sum of incident edge weights).
    let out_weight: Vec<f64> = g
        .node_indices()
        .map(|v| g.edges(v).map(|e| *e.weight() as f64).sum())
        .collect();

    let mut x = vec![uniform; n];
    for iteration in 0..config.pagerank_max_iterations {
        let last = x.clone();
        let dangling: f64 = alpha
            * g.node_indices()
                .filter(|v| out_weight[v.index()] <= 0.0)
                .map(|v| last[v.index()])
                .sum::<f64>();

        x = vec![dangling * uniform + (1.0 - alpha) * uniform; n];
        for v in g.node_indices() {
            let ow = out_weight[v.index()];
            if ow <= 0.0 {
                continue;
            }
            for edge in g.edges(v) {
                let w = if edge.source() == v { edge.target() } else { edge.source() };
                x[w.index()] += alpha * last[v.index()] * (*edge.weight() as f64 / ow);
            }
        }

        let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < n as f64 * config.tolerance {
            debug!(iteration, "PageRank converged");
            return x;
        }
    }

    warn!(
        iterations = config.pagerank_max_iterations,
        "PageRank did not converge, using zeros"
    );
    vec![0.0; n]
}

// ── Tests ──────────────────────────────────────────────────────────
