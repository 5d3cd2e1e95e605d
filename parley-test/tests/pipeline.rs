use parley_core::analyze::{AnalysisBackend, LocalBackend, SourceKind};
use parley_core::config::AnalysisSection;
use parley_core::state::AppState;
use parley_core::types::{AnalysisParams, LimitType, Metric, NetworkGraph};
use parley_test::{Fixture, analyze_file, synthetic_chat};

fn ids(graph: &NetworkGraph) -> Vec<&str> {
    graph.nodes.iter().map(|n| n.id.as_str()).collect()
}

fn weight(graph: &NetworkGraph, a: &str, b: &str) -> Option<u64> {
    graph
        .links
        .iter()
        .find(|l| (l.source == a && l.target == b) || (l.source == b && l.target == a))
        .map(|l| l.weight)
}

// ── Chat exports ─────────────────────────────────────────────────

#[tokio::test]
async fn sample_chat_full_network() {
    let fixture = Fixture::with_samples();
    let graph = analyze_file(
        &fixture.file("chat.txt"),
        SourceKind::Chat,
        &AnalysisParams::default(),
    )
    .await;

    assert_eq!(ids(&graph), vec!["Ann", "Ben", "+49 170 1234567", "Cat"]);
    let messages: Vec<u64> = graph.nodes.iter().map(|n| n.messages).collect();
    assert_eq!(messages, vec![3, 3, 1, 2]);

    assert_eq!(graph.links.len(), 5);
    assert_eq!(weight(&graph, "Ann", "Ben"), Some(2));
    assert_eq!(weight(&graph, "Ben", "Cat"), Some(2));
    assert_eq!(weight(&graph, "Ann", "Cat"), Some(2));
    assert_eq!(weight(&graph, "Cat", "+49 170 1234567"), None);
    for link in &graph.links {
        assert!(link.source <= link.target, "unsorted link {link:?}");
    }
    assert!(graph.validate().is_ok());

    let stats = graph.statistics.as_ref().expect("statistics attached");
    assert_eq!(stats.node_count, 4);
    assert_eq!(stats.edge_count, 5);
    assert_eq!(stats.diameter, 2);
    assert!(stats.connected);
    assert!((stats.density - 5.0 / 6.0).abs() < 1e-9);
}

#[tokio::test]
async fn sample_chat_centrality_is_consistent() {
    let fixture = Fixture::with_samples();
    let graph = analyze_file(
        &fixture.file("chat.txt"),
        SourceKind::Chat,
        &AnalysisParams::default(),
    )
    .await;

    let pagerank_sum: f64 = graph.nodes.iter().map(|n| n.pagerank).sum();
    assert!((pagerank_sum - 1.0).abs() < 1e-3, "pagerank sums to {pagerank_sum}");

    let phone = graph.node("+49 170 1234567").expect("phone participant");
    let ann = graph.node("Ann").expect("Ann");
    assert!(phone.degree < ann.degree);
    assert!(phone.pagerank < ann.pagerank);
    assert!(graph.nodes.iter().all(|n| (0.0..=1.0).contains(&n.betweenness)));
}

#[tokio::test]
async fn anonymized_chat_keeps_structure() {
    let fixture = Fixture::with_samples();
    let params = AnalysisParams {
        anonymize: true,
        ..AnalysisParams::default()
    };
    let graph = analyze_file(&fixture.file("chat.txt"), SourceKind::Chat, &params).await;

    assert_eq!(ids(&graph), vec!["User_1", "User_2", "Phone_3", "User_4"]);
    let messages: Vec<u64> = graph.nodes.iter().map(|n| n.messages).collect();
    assert_eq!(messages, vec![3, 3, 1, 2]);
    assert_eq!(graph.links.len(), 5);
    assert_eq!(weight(&graph, "User_1", "User_2"), Some(2));
}

#[tokio::test]
async fn most_active_participants_only() {
    let fixture = Fixture::with_samples();
    let params = AnalysisParams {
        active_users: Some(2),
        ..AnalysisParams::default()
    };
    let graph = analyze_file(&fixture.file("chat.txt"), SourceKind::Chat, &params).await;

    assert_eq!(ids(&graph), vec!["Ann", "Ben"]);
    assert_eq!(graph.links.len(), 1);
    assert_eq!(weight(&graph, "Ann", "Ben"), Some(2));
}

#[tokio::test]
async fn first_messages_limit_counts_system_lines() {
    let fixture = Fixture::with_samples();
    let params = AnalysisParams {
        limit: Some(5),
        limit_type: LimitType::First,
        ..AnalysisParams::default()
    };
    let graph = analyze_file(&fixture.file("chat.txt"), SourceKind::Chat, &params).await;

    assert_eq!(ids(&graph), vec!["Ann", "Ben", "+49 170 1234567"]);
    assert_eq!(weight(&graph, "Ann", "Ben"), Some(2));
    assert_eq!(weight(&graph, "Ann", "+49 170 1234567"), Some(1));
}

#[tokio::test]
async fn date_window_drops_earlier_days() {
    let fixture = Fixture::with_samples();
    let params = AnalysisParams {
        start_date: Some("2024-03-02".into()),
        ..AnalysisParams::default()
    };
    let graph = analyze_file(&fixture.file("chat.txt"), SourceKind::Chat, &params).await;

    assert_eq!(ids(&graph), vec!["Cat", "Ann", "Ben"]);
    assert_eq!(weight(&graph, "Ann", "Cat"), Some(2));
    assert_eq!(weight(&graph, "Ben", "Cat"), Some(1));
    assert_eq!(weight(&graph, "Ann", "Ben"), None);
}

#[tokio::test]
async fn empty_chat_is_an_error() {
    let fixture = Fixture::new();
    let path = fixture.write("empty.txt", "no dated lines here\n");
    let backend = LocalBackend::new(SourceKind::Chat, AnalysisSection::default());
    let err = backend
        .analyze(path.to_str().unwrap(), &AnalysisParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty.txt"), "{err}");
}

// ── Talk pages ───────────────────────────────────────────────────

#[tokio::test]
async fn sample_talk_network() {
    let fixture = Fixture::with_samples();
    let graph = analyze_file(
        &fixture.file("talk.txt"),
        SourceKind::Talk,
        &AnalysisParams::default(),
    )
    .await;

    assert_eq!(ids(&graph), vec!["Alice", "Bob", "Carol", "Dave"]);
    let messages: Vec<u64> = graph.nodes.iter().map(|n| n.messages).collect();
    assert_eq!(messages, vec![2, 2, 1, 1]);
    assert_eq!(weight(&graph, "Alice", "Bob"), Some(2));
    assert_eq!(weight(&graph, "Bob", "Dave"), Some(1));
    assert_eq!(weight(&graph, "Alice", "Dave"), None);
}

#[tokio::test]
async fn talk_username_filter_matches_substrings() {
    let fixture = Fixture::with_samples();
    let params = AnalysisParams {
        username: Some("o".into()),
        ..AnalysisParams::default()
    };
    let graph = analyze_file(&fixture.file("talk.txt"), SourceKind::Talk, &params).await;

    // Bob and Carol contain an "o"; Alice and Dave do not.
    assert_eq!(ids(&graph), vec!["Bob", "Carol"]);
    assert_eq!(weight(&graph, "Bob", "Carol"), Some(2));
}

// ── State round trip ─────────────────────────────────────────────

#[tokio::test]
async fn state_ranks_local_analysis() {
    let fixture = Fixture::with_samples();
    let backend = LocalBackend::new(SourceKind::Chat, AnalysisSection::default());
    let mut state = AppState::new(0.1);

    state
        .run_analysis(&backend, fixture.file("chat.txt").to_str().unwrap())
        .await
        .unwrap();
    assert!(!state.network.status.loading);
    assert!(state.network.status.error.is_none());

    let ranking = state.network.ranking(Metric::Degree);
    assert_eq!(ranking.len(), 4);
    let mut top: Vec<&str> = ranking[..2].iter().map(|n| n.id.as_str()).collect();
    top.sort_unstable();
    assert_eq!(top, vec!["Ann", "Ben"]);
    assert!(ranking[0].degree >= ranking[3].degree);
    assert!(state.network.ranking(Metric::Density).is_empty());
}

#[tokio::test]
async fn synthetic_chat_scales() {
    let fixture = Fixture::new();
    let path = fixture.write("big.txt", &synthetic_chat(40, 2_000));
    let graph = analyze_file(&path, SourceKind::Chat, &AnalysisParams::default()).await;

    assert_eq!(graph.nodes.len(), 40);
    let total: u64 = graph.nodes.iter().map(|n| n.messages).sum();
    assert_eq!(total, 2_000);
    assert!(graph.statistics.as_ref().is_some_and(|s| s.connected));
}
