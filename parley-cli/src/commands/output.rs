use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use parley_core::state::{Action, AppState};
use parley_core::types::{Metric, NetworkGraph, NetworkStatistics, Node};

/// How an analysed network is shown.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format: text, json, dot, mermaid
    #[arg(long, default_value = "text", value_parser = ["text", "json", "dot", "mermaid"])]
    pub format: String,

    /// Metric to rank by: degree, betweenness, closeness, eigenvector, pagerank
    #[arg(long, default_value = "pagerank")]
    pub metric: String,

    /// Show top N participants
    #[arg(long, default_value = "20")]
    pub top: usize,

    /// Only show participants whose betweenness meets the configured threshold
    #[arg(long)]
    pub strong: bool,

    /// Only show participants whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Also write the network as JSON to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

impl Default for OutputArgs {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            metric: "pagerank".to_string(),
            top: 20,
            strong: false,
            filter: None,
            save: None,
        }
    }
}

/// Apply the view options to `state` and print its network.
pub fn present(state: &mut AppState, out: &OutputArgs) -> anyhow::Result<()> {
    let metric: Metric = out.metric.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    state.apply(Action::SelectMetric(Some(metric)));
    if out.strong {
        state.apply(Action::ToggleStrongConnections);
    }
    if let Some(filter) = &out.filter {
        state.apply(Action::SetNodeFilter(filter.clone()));
    }

    let mut graph = state
        .network
        .visible()
        .context("No network to display")?;
    graph.statistics = Some(parley_core::analyze::metrics::statistics(&graph));

    if let Some(path) = &out.save {
        let json = serde_json::to_string_pretty(&graph)?;
        std::fs::write(path, json)
            .with_context(|| format!("Cannot write network to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Saved network");
    }

    let rendered = match out.format.as_str() {
        "json" => serde_json::to_string_pretty(&graph)? + "\n",
        "dot" => render_dot(&graph, metric),
        "mermaid" => render_mermaid(&graph, metric),
        _ => render_text(&graph, &state.network.ranking(metric), metric, out.top),
    };
    print!("{rendered}");
    Ok(())
}

// ── Text ─────────────────────────────────────────────────────────────

pub fn render_statistics(stats: &NetworkStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Network: {} participants, {} links",
        stats.node_count, stats.edge_count
    );
    let _ = writeln!(out, "  {:<14} {:.4}", "density", stats.density);
    let suffix = if stats.connected { "" } else { " (disconnected)" };
    let _ = writeln!(out, "  {:<14} {}{suffix}", "diameter", stats.diameter);
    let _ = writeln!(out, "  {:<14} {:.4}", "reciprocity", stats.reciprocity);
    let _ = writeln!(out, "  {:<14} {:.4}", "avg degree", stats.average_degree);
    let _ = writeln!(out, "  {:<14} {:.4}", "clustering", stats.clustering_coefficient);
    out
}

fn render_text(graph: &NetworkGraph, ranked: &[Node], metric: Metric, top: usize) -> String {
    let mut out = graph
        .statistics
        .as_ref()
        .map(render_statistics)
        .unwrap_or_default();

    if ranked.is_empty() {
        return out;
    }

    let shown = ranked.len().min(top);
    let _ = writeln!(out);
    let _ = writeln!(out, "Top {shown} participants by {metric}:");
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<4} {:<32} {:>8} {:>10}", "#", "Participant", "Messages", "Score");
    let _ = writeln!(out, "{:-<57}", "");
    for (i, node) in ranked.iter().take(top).enumerate() {
        let name = truncate(&node.id, 32);
        let score = metric.score(node).unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<4} {:<32} {:>8} {:>10.4}",
            i + 1,
            name,
            node.messages,
            score
        );
    }
    out
}

fn truncate(name: &str, width: usize) -> String {
    let count = name.chars().count();
    if count <= width {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (width - 2)).collect();
    format!("..{tail}")
}

// ── Graph formats ────────────────────────────────────────────────────

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn render_dot(graph: &NetworkGraph, metric: Metric) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "graph network {{");
    let _ = writeln!(out, "  node [shape=ellipse];");
    for node in &graph.nodes {
        let id = dot_escape(&node.id);
        match metric.score(node) {
            Some(score) => {
                let _ = writeln!(out, "  \"{id}\" [label=\"{id}\\n{score:.4}\"];");
            }
            None => {
                let _ = writeln!(out, "  \"{id}\";");
            }
        }
    }
    for link in &graph.links {
        let _ = writeln!(
            out,
            "  \"{}\" -- \"{}\" [weight={w}, label=\"{w}\"];",
            dot_escape(&link.source),
            dot_escape(&link.target),
            w = link.weight
        );
    }
    let _ = writeln!(out, "}}");
    out
}

pub fn render_mermaid(graph: &NetworkGraph, metric: Metric) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "graph LR");
    for (i, node) in graph.nodes.iter().enumerate() {
        let label = node.id.replace('"', "#quot;");
        match metric.score(node) {
            Some(score) => {
                let _ = writeln!(out, "  n{i}[\"{label}<br/>{score:.4}\"]");
            }
            None => {
                let _ = writeln!(out, "  n{i}[\"{label}\"]");
            }
        }
    }
    for link in &graph.links {
        let source = graph.nodes.iter().position(|n| n.id == link.source);
        let target = graph.nodes.iter().position(|n| n.id == link.target);
        if let (Some(s), Some(t)) = (source, target) {
            let _ = writeln!(out, "  n{s} ---|{}| n{t}", link.weight);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::Link;

    fn pair() -> NetworkGraph {
        NetworkGraph::new(
            vec![
                Node {
                    pagerank: 0.5,
                    ..Node::new("Ann \"A\"", 3)
                },
                Node {
                    pagerank: 0.5,
                    ..Node::new("Ben", 2)
                },
            ],
            vec![Link::new("Ann \"A\"", "Ben", 4)],
        )
    }

    #[test]
    fn dot_escapes_quotes() {
        let dot = render_dot(&pair(), Metric::PageRank);
        assert!(dot.starts_with("graph network {"));
        assert!(dot.contains(r#""Ann \"A\"" -- "Ben" [weight=4, label="4"];"#));
        assert!(dot.contains("0.5000"));
    }

    #[test]
    fn mermaid_uses_index_ids() {
        let mermaid = render_mermaid(&pair(), Metric::PageRank);
        assert!(mermaid.contains("n0[\"Ann #quot;A#quot;<br/>0.5000\"]"));
        assert!(mermaid.contains("n0 ---|4| n1"));
    }

    #[test]
    fn statistics_flag_disconnected() {
        let stats = NetworkStatistics {
            node_count: 4,
            edge_count: 2,
            connected: false,
            diameter: 1,
            ..NetworkStatistics::default()
        };
        let text = render_statistics(&stats);
        assert!(text.contains("4 participants, 2 links"));
        assert!(text.contains("1 (disconnected)"));
    }

    #[test]
    fn text_ranking_respects_top() {
        let graph = pair();
        let text = render_text(&graph, &graph.nodes, Metric::PageRank, 1);
        assert!(text.contains("Top 1 participants by pagerank"));
        assert!(!text.contains("Ben"));
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "x".repeat(40);
        let shown = truncate(&name, 32);
        assert_eq!(shown.chars().count(), 32);
        assert!(shown.starts_with(".."));
    }
}
