use std::collections::HashMap;
use std::time::Instant;

use petgraph::visit::EdgeRef;
use tracing::info;

use crate::config::AnalysisSection;
use crate::types::{AnalysisParams, ChatMessage, Link, NetworkGraph, Node};

use super::centrality::{CentralityConfig, InteractionGraph, compute_centrality};
use super::filter::{Anonymizer, FilterProfile, MessageFilter, ParticipantFilter};
use super::metrics;

/// Build the scored interaction graph for a conversation.
///
/// Messages are filtered, optionally anonymized, and every pair of
/// consecutive messages from different senders adds one exchange between
/// them. Participants are then filtered on their message counts; links
/// survive only between surviving participants. Nodes appear in order of
/// first message; link endpoints are the lexicographically sorted pair.
pub fn build_network(
    messages: &[ChatMessage],
    params: &AnalysisParams,
    profile: FilterProfile,
    settings: &AnalysisSection,
) -> crate::error::Result<NetworkGraph> {
    let start = Instant::now();
    params.validate()?;

    let kept = MessageFilter::from_params(params, profile).apply(messages);

    let mut anonymizer = params.anonymize.then(Anonymizer::new);
    let mut original_of: HashMap<String, String> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut full = InteractionGraph::new();
    let mut previous: Option<String> = None;

    for message in &kept {
        if message.sender.is_empty() {
            continue;
        }
        let name = match anonymizer.as_mut() {
            Some(anon) => {
                let alias = anon.alias(&message.sender);
                original_of
                    .entry(alias.clone())
                    .or_insert_with(|| message.sender.clone());
                alias
            }
            None => message.sender.clone(),
        };

        match position.get(&name) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(name.clone(), counts.len());
                counts.push((name.clone(), 1));
            }
        }

        full.add_node(&name);
        if let Some(prev) = previous.as_deref().filter(|p| *p != name) {
            full.add_interaction(prev, &name, 1);
        }
        previous = Some(name);
    }

    let survivors = ParticipantFilter::from_params(params).retain(&counts, &original_of);

    // Rebuild with survivors only, keeping first-appearance order.
    let mut graph = InteractionGraph::new();
    for (name, _) in &counts {
        if survivors.contains(name.as_str()) {
            graph.add_node(name);
        }
    }
    let mut links = Vec::new();
    for edge in full.graph.edge_references() {
        let a = &full.graph[edge.source()];
        let b = &full.graph[edge.target()];
        if survivors.contains(a.as_str()) && survivors.contains(b.as_str()) {
            let (source, target) = if a <= b { (a, b) } else { (b, a) };
            graph.add_interaction(source, target, *edge.weight());
            links.push(Link::new(source.as_str(), target.as_str(), *edge.weight()));
        }
    }

    let scores = compute_centrality(&graph, &CentralityConfig::from(settings));
    let precision = settings.score_precision;
    let nodes: Vec<Node> = graph
        .graph
        .node_indices()
        .map(|idx| {
            let id = &graph.graph[idx];
            let i = idx.index();
            Node {
                id: id.clone(),
                messages: position.get(id).map_or(0, |&p| counts[p].1),
                degree: round_to(scores.degree[i], precision),
                betweenness: round_to(scores.betweenness[i], precision),
                closeness: round_to(scores.closeness[i], precision),
                eigenvector: round_to(scores.eigenvector[i], precision),
                pagerank: round_to(scores.pagerank[i], precision),
            }
        })
        .collect();

    let mut network = NetworkGraph::new(nodes, links);
    network.statistics = Some(metrics::statistics(&network));

    info!(
        messages = kept.len(),
        nodes = network.nodes.len(),
        links = network.links.len(),
        duration = ?start.elapsed(),
        "Built interaction network"
    );
    Ok(network)
}

/// Round to `places` decimals.
#[allow(clippy::cast_possible_wrap)]
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
