// Benchmark graph metrics, centrality and network building at varying sizes.
#![allow(clippy::cast_possible_truncation)]

use std::fmt::Write as _;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use parley_core::analyze::FilterProfile;
use parley_core::analyze::centrality::{CentralityConfig, InteractionGraph, compute_centrality};
use parley_core::analyze::{build_network, metrics};
use parley_core::config::AnalysisSection;
use parley_core::extract::ChatExport;
use parley_core::types::{AnalysisParams, Link, NetworkGraph, Node};

/// Sparse synthetic network: participant `i` talks to
/// `(i * prime + 1) % node_count` for the first `edge_factor` primes.
fn synthetic_network(node_count: usize, edge_factor: usize) -> NetworkGraph {
    let nodes = (0..node_count)
        .map(|i| Node::new(format!("user{i}"), 1))
        .collect();
    let primes = [7, 13, 31, 61, 127, 251];
    let mut links = Vec::new();
    for &prime in &primes[..edge_factor.min(primes.len())] {
        for i in 0..node_count {
            let target = (i.wrapping_mul(prime).wrapping_add(1)) % node_count;
            if target != i {
                links.push(Link::new(format!("user{i}"), format!("user{target}"), 1));
            }
        }
    }
    NetworkGraph::new(nodes, links)
}

/// A chat export with `participants` senders taking turns pseudo-randomly.
fn synthetic_chat(messages: usize, participants: usize) -> String {
    let mut out = String::new();
    for i in 0..messages {
        let sender = (i * 31 + i / 7) % participants;
        let minute = i % 60;
        let hour = (i / 60) % 24;
        let day = 1 + (i / 1440) % 28;
        let _ = writeln!(
            out,
            "[{day:02}.03.2024, {hour:02}:{minute:02}:00] user{sender}: message number {i}"
        );
    }
    out
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    // Floyd–Warshall is O(n³)
    group.sample_size(10);

    for node_count in [50, 100, 200] {
        let graph = synthetic_network(node_count, 3);
        group.bench_with_input(BenchmarkId::new("nodes", node_count), &graph, |b, g| {
            b.iter(|| metrics::statistics(g));
        });
    }

    group.finish();
}

fn bench_centrality(c: &mut Criterion) {
    let mut group = c.benchmark_group("centrality");
    group.sample_size(10);
    let config = CentralityConfig::default();

    for node_count in [100, 500, 1_000] {
        let graph = InteractionGraph::from_network(&synthetic_network(node_count, 3));
        group.bench_with_input(BenchmarkId::new("nodes", node_count), &graph, |b, g| {
            b.iter(|| compute_centrality(g, &config));
        });
    }

    group.finish();
}

fn bench_build_network(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_network");
    group.sample_size(10);
    let settings = AnalysisSection::default();
    let params = AnalysisParams::default();

    for messages in [1_000, 10_000] {
        let chat = ChatExport::parse(&synthetic_chat(messages, 40));
        group.bench_with_input(
            BenchmarkId::new("messages", messages),
            &chat.messages,
            |b, msgs| {
                b.iter(|| build_network(msgs, &params, FilterProfile::ChatExport, &settings));
            },
        );
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let content = synthetic_chat(10_000, 40);
    c.bench_function("parse_chat_10k", |b| b.iter(|| ChatExport::parse(&content)));
}

criterion_group!(
    benches,
    bench_statistics,
    bench_centrality,
    bench_build_network,
    bench_parse
);
criterion_main!(benches);
