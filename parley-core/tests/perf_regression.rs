use std::fmt::Write as _;
use std::time::{Duration, Instant};

use parley_core::analyze::{FilterProfile, build_network, metrics};
use parley_core::config::AnalysisSection;
use parley_core::extract::ChatExport;
use parley_core::types::AnalysisParams;

fn threshold_ms(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

fn synthetic_chat(messages: usize, participants: usize) -> String {
    let mut out = String::new();
    for i in 0..messages {
        let sender = (i * 7) % participants;
        let _ = writeln!(
            out,
            "[{:02}.04.2024, {:02}:{:02}:00] member{sender}: reply {i}",
            1 + (i / 1440) % 28,
            (i / 60) % 24,
            i % 60
        );
    }
    out
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_parse_and_build_under_threshold() {
    let content = synthetic_chat(50_000, 150);

    let t0 = Instant::now();
    let chat = ChatExport::parse(&content);
    let parse_elapsed = t0.elapsed();

    let t1 = Instant::now();
    let graph = build_network(
        &chat.messages,
        &AnalysisParams::default(),
        FilterProfile::ChatExport,
        &AnalysisSection::default(),
    )
    .unwrap();
    let build_elapsed = t1.elapsed();

    assert_eq!(graph.nodes.len(), 150);
    assert!(
        parse_elapsed <= threshold_ms("PARLEY_PERF_PARSE_MS", 5000),
        "chat parsing exceeded threshold: {parse_elapsed:?}"
    );
    assert!(
        build_elapsed <= threshold_ms("PARLEY_PERF_BUILD_MS", 10000),
        "network build exceeded threshold: {build_elapsed:?}"
    );
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_statistics_under_threshold() {
    let chat = ChatExport::parse(&synthetic_chat(20_000, 300));
    let graph = build_network(
        &chat.messages,
        &AnalysisParams::default(),
        FilterProfile::ChatExport,
        &AnalysisSection::default(),
    )
    .unwrap();

    let t0 = Instant::now();
    let stats = metrics::statistics(&graph);
    let elapsed = t0.elapsed();

    assert_eq!(stats.node_count, 300);
    assert!(
        elapsed <= threshold_ms("PARLEY_PERF_STATISTICS_MS", 10000),
        "graph statistics exceeded threshold: {elapsed:?}"
    );
}
