use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AnalyzeError;

// ── Graph model ────────────────────────────────────────────────────

/// A participant in a conversation, with the centrality scores computed
/// for it by the analysis that produced the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub degree: f64,
    #[serde(default)]
    pub betweenness: f64,
    #[serde(default)]
    pub closeness: f64,
    #[serde(default)]
    pub eigenvector: f64,
    #[serde(default)]
    pub pagerank: f64,
}

impl Node {
    /// A node with a message count and all scores at zero.
    pub fn new(id: impl Into<String>, messages: u64) -> Self {
        Self {
            id: id.into(),
            messages,
            degree: 0.0,
            betweenness: 0.0,
            closeness: 0.0,
            eigenvector: 0.0,
            pagerank: 0.0,
        }
    }
}

/// A message-flow relationship between two participants.
///
/// Endpoints are accepted either as plain ids or as `{ "id": ... }` objects,
/// since graph documents saved from visualizers embed the node object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(deserialize_with = "endpoint_id")]
    pub source: String,
    #[serde(deserialize_with = "endpoint_id")]
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: u64,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: u64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

fn default_weight() -> u64 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Endpoint {
    Id(String),
    Object { id: String },
}

fn endpoint_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Endpoint::deserialize(deserializer)? {
        Endpoint::Id(id) | Endpoint::Object { id } => id,
    })
}

/// An interaction graph as returned by an analysis. Replaced wholesale on
/// every analysis; never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<NetworkStatistics>,
}

impl NetworkGraph {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self {
            nodes,
            links,
            statistics: None,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Links whose source or target is not in the node set.
    pub fn dangling_links(&self) -> Vec<&Link> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.links
            .iter()
            .filter(|l| !ids.contains(l.source.as_str()) || !ids.contains(l.target.as_str()))
            .collect()
    }

    /// Check that every link endpoint exists in the node set.
    pub fn validate(&self) -> Result<(), AnalyzeError> {
        match self.dangling_links().first() {
            Some(link) => Err(AnalyzeError::DanglingLink {
                from: link.source.clone(),
                to: link.target.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Keep only the nodes matching `keep`, and the links between them.
    #[must_use]
    pub fn retain_nodes<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Node) -> bool,
    {
        let nodes: Vec<Node> = self.nodes.iter().filter(|n| keep(n)).cloned().collect();
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let links = self
            .links
            .iter()
            .filter(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
            .cloned()
            .collect();
        Self::new(nodes, links)
    }
}

/// Whole-graph summary numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatistics {
    #[serde(alias = "nodeCount")]
    pub node_count: usize,
    #[serde(alias = "edgeCount")]
    pub edge_count: usize,
    pub density: f64,
    pub diameter: u32,
    pub reciprocity: f64,
    #[serde(alias = "averageDegree")]
    pub average_degree: f64,
    #[serde(alias = "clusteringCoefficient")]
    pub clustering_coefficient: f64,
    /// False when some node pairs are unreachable; `diameter` is then the
    /// largest distance within any component.
    #[serde(default = "default_connected")]
    pub connected: bool,
}

fn default_connected() -> bool {
    true
}

/// Per-node in/out link tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeMaps {
    pub in_degree: BTreeMap<String, u64>,
    pub out_degree: BTreeMap<String, u64>,
}

/// Node-level and graph-level metrics that can be selected for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Degree,
    Betweenness,
    Closeness,
    Eigenvector,
    PageRank,
    Density,
    Diameter,
}

impl Metric {
    pub const NODE_METRICS: [Self; 5] = [
        Self::Degree,
        Self::Betweenness,
        Self::Closeness,
        Self::Eigenvector,
        Self::PageRank,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
            Self::Eigenvector => "eigenvector",
            Self::PageRank => "pagerank",
            Self::Density => "density",
            Self::Diameter => "diameter",
        }
    }

    /// The node's score for this metric; `None` for graph-level metrics.
    pub fn score(self, node: &Node) -> Option<f64> {
        match self {
            Self::Degree => Some(node.degree),
            Self::Betweenness => Some(node.betweenness),
            Self::Closeness => Some(node.closeness),
            Self::Eigenvector => Some(node.eigenvector),
            Self::PageRank => Some(node.pagerank),
            Self::Density | Self::Diameter => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degree" => Ok(Self::Degree),
            "betweenness" => Ok(Self::Betweenness),
            "closeness" => Ok(Self::Closeness),
            "eigenvector" => Ok(Self::Eigenvector),
            "pagerank" => Ok(Self::PageRank),
            "density" => Ok(Self::Density),
            "diameter" => Ok(Self::Diameter),
            other => Err(format!(
                "Unknown metric: {other}. Use: degree, betweenness, closeness, eigenvector, pagerank, density, diameter"
            )),
        }
    }
}

// ── Messages ───────────────────────────────────────────────────────

/// One message of a conversation, from either a chat export or a talk page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub content: String,
}

// ── Analysis request ───────────────────────────────────────────────

/// Which end of the message list a `limit` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitType {
    #[default]
    First,
    Last,
    All,
}

impl LimitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::All => "all",
        }
    }
}

impl FromStr for LimitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "all" => Ok(Self::All),
            other => Err(format!("Unknown limit type: {other}. Use: first, last, all")),
        }
    }
}

/// Filters and options for a network analysis. Unset fields impose no
/// constraint. Dates are `YYYY-MM-DD`, times `HH:MM` or `HH:MM:SS`;
/// `keywords` and `selected_users` are comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub limit_type: LimitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_users: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_users: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub anonymize: bool,
}

impl AnalysisParams {
    /// Query-string pairs for the analysis endpoints. Unset and empty
    /// values are omitted; `HH:MM` times are sent as `HH:MM:00`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        fn push<T: ToString>(out: &mut Vec<(&'static str, String)>, key: &'static str, v: Option<&T>) {
            if let Some(v) = v {
                let s = v.to_string();
                if !s.is_empty() {
                    out.push((key, s));
                }
            }
        }

        let mut out = Vec::new();
        push(&mut out, "start_date", self.start_date.as_ref());
        push(&mut out, "start_time", self.start_time.as_deref().map(pad_time).as_ref());
        push(&mut out, "end_date", self.end_date.as_ref());
        push(&mut out, "end_time", self.end_time.as_deref().map(pad_time).as_ref());
        push(&mut out, "limit", self.limit.as_ref());
        out.push(("limit_type", self.limit_type.as_str().to_string()));
        push(&mut out, "min_length", self.min_length.as_ref());
        push(&mut out, "max_length", self.max_length.as_ref());
        push(&mut out, "keywords", self.keywords.as_ref());
        push(&mut out, "min_messages", self.min_messages.as_ref());
        push(&mut out, "max_messages", self.max_messages.as_ref());
        push(&mut out, "active_users", self.active_users.as_ref());
        push(&mut out, "selected_users", self.selected_users.as_ref());
        push(&mut out, "username", self.username.as_ref());
        out.push(("anonymize", self.anonymize.to_string()));
        out
    }

    /// Reject parameter combinations that can never match anything.
    pub fn validate(&self) -> Result<(), AnalyzeError> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if max > 0 && min > max {
                return Err(AnalyzeError::InvalidParams(format!(
                    "min_length ({min}) is greater than max_length ({max})"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_messages, self.max_messages) {
            if max > 0 && min > max {
                return Err(AnalyzeError::InvalidParams(format!(
                    "min_messages ({min}) is greater than max_messages ({max})"
                )));
            }
        }
        Ok(())
    }
}

/// `HH:MM` → `HH:MM:00`; anything else unchanged.
pub fn pad_time(time: &str) -> String {
    if time.len() == 5 {
        format!("{time}:00")
    } else {
        time.to_string()
    }
}

/// Split a comma-separated list, trimming and dropping empty entries.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ── API wire types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: UserResponse,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub filename: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// A saved research project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Research {
    pub id: String,
    pub name: String,
    pub description: String,
    pub user_id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub anonymized: bool,
}

/// Payload for creating a research project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchForm {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub anonymize: bool,
}

/// Partial update of a research project; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymize: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikipediaSearchResult {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wordcount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Wikitext of an article or talk page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikipediaPage {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadUpload {
    pub wikipedia_title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCreated {
    pub thread_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikipediaThreadMessage {
    pub message_id: i64,
    pub thread_id: String,
    pub timestamp: String,
    pub sender: String,
    pub content: String,
}

/// An imported talk-page thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikipediaThread {
    pub thread_id: String,
    pub user_id: String,
    pub wikipedia_title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<WikipediaThreadMessage>>,
}
