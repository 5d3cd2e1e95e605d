//! Application state and its reducer.
//!
//! Every change goes through [`AppState::apply`]. Requests are modelled as
//! a [`Phase`]: `Pending` marks the slice as loading, `Done` stores the
//! result, `Failed` stores the message for display. Nothing is retried.

use tracing::{debug, warn};

use crate::analyze::{AnalysisBackend, metrics};
use crate::types::{
    AnalysisParams, DegreeMaps, FileUploadResponse, Metric, NetworkGraph, NetworkStatistics, Node,
    Research, ResearchForm, ThreadCreated, TokenResponse, UserResponse, WikipediaPage,
    WikipediaSearchResult, WikipediaThread,
};

/// Message limit pre-filled in a new research form.
pub const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Progress of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Pending,
    Done(T),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // user
    Login(Phase<TokenResponse>),
    Logout,

    // files
    UploadFile(Phase<FileUploadResponse>),
    ListFiles(Phase<Vec<String>>),
    /// Carries the deleted filename.
    DeleteFile(Phase<String>),
    SelectFile(String),
    ClearFile,

    // network
    Analyze(Phase<NetworkGraph>),
    SelectMetric(Option<Metric>),
    /// Select `metric`, or clear the selection if it is already selected.
    ToggleMetric(Metric),
    ToggleStrongConnections,
    UpdateParams(AnalysisParams),
    SetNodeFilter(String),
    ResetNetwork,

    // research
    ListResearch(Phase<Vec<Research>>),
    /// Result of a create or update.
    SaveResearch(Phase<Research>),
    /// Carries the deleted id.
    DeleteResearch(Phase<String>),
    SetResearchForm(ResearchForm),
    ResetResearchForm,

    // wikipedia
    Search(Phase<Vec<WikipediaSearchResult>>),
    LoadPage(Phase<WikipediaPage>),
    LoadTalkPage(Phase<WikipediaPage>),
    ImportThread(Phase<ThreadCreated>),
    ListThreads(Phase<Vec<WikipediaThread>>),
    /// Carries the deleted thread id.
    DeleteThread(Phase<String>),
    ClearSearch,
}

/// Loading flag and last error of a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub loading: bool,
    pub error: Option<String>,
}

impl Status {
    /// Apply the bookkeeping part of a phase, returning its payload when done.
    fn track<T>(&mut self, phase: Phase<T>) -> Option<T> {
        match phase {
            Phase::Pending => {
                self.loading = true;
                self.error = None;
                None
            }
            Phase::Done(value) => {
                self.loading = false;
                Some(value)
            }
            Phase::Failed(message) => {
                warn!(error = %message, "Request failed");
                self.loading = false;
                self.error = Some(message);
                None
            }
        }
    }
}

// ── Slices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub user: Option<UserResponse>,
    pub token: Option<String>,
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileState {
    pub uploaded_file: Option<String>,
    pub files: Vec<String>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    /// The graph on display; a filtered view of `original` while strong
    /// connections are shown.
    pub graph: Option<NetworkGraph>,
    /// The graph as last received.
    pub original: Option<NetworkGraph>,
    pub statistics: Option<NetworkStatistics>,
    pub degrees: DegreeMaps,
    pub params: AnalysisParams,
    pub selected_metric: Option<Metric>,
    pub strong_connections: bool,
    /// Minimum betweenness of a strong connection.
    pub strong_threshold: f64,
    /// Case-insensitive substring narrowing the visible nodes.
    pub node_filter: String,
    pub status: Status,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            graph: None,
            original: None,
            statistics: None,
            degrees: DegreeMaps::default(),
            params: AnalysisParams::default(),
            selected_metric: None,
            strong_connections: false,
            strong_threshold: 0.1,
            node_filter: String::new(),
            status: Status::default(),
        }
    }
}

impl NetworkState {
    /// Replace the displayed graph and recompute its metrics.
    fn show(&mut self, graph: Option<NetworkGraph>) {
        match &graph {
            Some(g) => {
                self.statistics = Some(metrics::statistics(g));
                self.degrees = metrics::degree_maps(g);
            }
            None => {
                self.statistics = None;
                self.degrees = DegreeMaps::default();
            }
        }
        self.graph = graph;
    }

    fn toggle_strong_connections(&mut self) {
        let Some(original) = &self.original else {
            return;
        };
        if self.strong_connections {
            let restored = original.clone();
            self.strong_connections = false;
            self.show(Some(restored));
        } else {
            let threshold = self.strong_threshold;
            let strong = original.retain_nodes(|n| n.betweenness >= threshold);
            debug!(
                threshold,
                kept = strong.nodes.len(),
                total = original.nodes.len(),
                "Showing strong connections"
            );
            self.strong_connections = true;
            self.show(Some(strong));
        }
    }

    /// The displayed graph narrowed by `node_filter`.
    pub fn visible(&self) -> Option<NetworkGraph> {
        let graph = self.graph.as_ref()?;
        let needle = self.node_filter.trim().to_lowercase();
        if needle.is_empty() {
            return Some(graph.clone());
        }
        Some(graph.retain_nodes(|n| n.id.to_lowercase().contains(&needle)))
    }

    /// Visible nodes by descending score on `metric` (ties keep graph
    /// order). Empty for graph-level metrics.
    pub fn ranking(&self, metric: Metric) -> Vec<Node> {
        let Some(graph) = self.visible() else {
            return Vec::new();
        };
        if !Metric::NODE_METRICS.contains(&metric) {
            return Vec::new();
        }
        let mut nodes = graph.nodes;
        nodes.sort_by(|a, b| {
            let sa = metric.score(a).unwrap_or_default();
            let sb = metric.score(b).unwrap_or_default();
            sb.total_cmp(&sa)
        });
        nodes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchState {
    pub researches: Vec<Research>,
    pub form: ResearchForm,
    pub status: Status,
}

impl Default for ResearchState {
    fn default() -> Self {
        Self {
            researches: Vec::new(),
            form: blank_research_form(),
            status: Status::default(),
        }
    }
}

fn blank_research_form() -> ResearchForm {
    ResearchForm {
        message_limit: Some(DEFAULT_MESSAGE_LIMIT),
        ..ResearchForm::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WikipediaState {
    pub search_results: Vec<WikipediaSearchResult>,
    pub selected_page: Option<WikipediaPage>,
    pub selected_talk_page: Option<WikipediaPage>,
    pub threads: Vec<WikipediaThread>,
    pub last_import: Option<ThreadCreated>,
    pub status: Status,
}

// ── Store ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: UserState,
    pub file: FileState,
    pub network: NetworkState,
    pub research: ResearchState,
    pub wikipedia: WikipediaState,
}

impl AppState {
    pub fn new(strong_threshold: f64) -> Self {
        let mut state = Self::default();
        state.network.strong_threshold = strong_threshold;
        state
    }

    #[allow(clippy::too_many_lines)]
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Login(phase) => {
                if let Some(token) = self.user.status.track(phase) {
                    self.user.token = Some(token.access_token);
                    self.user.user = Some(token.user);
                }
            }
            Action::Logout => self.user = UserState::default(),

            Action::UploadFile(phase) => {
                if let Some(uploaded) = self.file.status.track(phase) {
                    if !self.file.files.contains(&uploaded.filename) {
                        self.file.files.push(uploaded.filename.clone());
                    }
                    self.file.uploaded_file = Some(uploaded.filename);
                }
            }
            Action::ListFiles(phase) => {
                if let Some(files) = self.file.status.track(phase) {
                    self.file.files = files;
                }
            }
            Action::DeleteFile(phase) => {
                if let Some(name) = self.file.status.track(phase) {
                    self.file.files.retain(|f| *f != name);
                    if self.file.uploaded_file.as_deref() == Some(name.as_str()) {
                        self.file.uploaded_file = None;
                    }
                }
            }
            Action::SelectFile(name) => self.file.uploaded_file = Some(name),
            Action::ClearFile => {
                self.file.uploaded_file = None;
                self.file.status.error = None;
            }

            Action::Analyze(phase) => {
                if let Some(graph) = self.network.status.track(phase) {
                    self.network.original = Some(graph.clone());
                    self.network.strong_connections = false;
                    self.network.show(Some(graph));
                }
            }
            Action::SelectMetric(metric) => self.network.selected_metric = metric,
            Action::ToggleMetric(metric) => {
                self.network.selected_metric =
                    (self.network.selected_metric != Some(metric)).then_some(metric);
            }
            Action::ToggleStrongConnections => self.network.toggle_strong_connections(),
            Action::UpdateParams(params) => self.network.params = params,
            Action::SetNodeFilter(filter) => self.network.node_filter = filter,
            Action::ResetNetwork => {
                self.network.original = None;
                self.network.selected_metric = None;
                self.network.strong_connections = false;
                self.network.show(None);
            }

            Action::ListResearch(phase) => {
                if let Some(list) = self.research.status.track(phase) {
                    self.research.researches = list;
                }
            }
            Action::SaveResearch(phase) => {
                if let Some(saved) = self.research.status.track(phase) {
                    match self.research.researches.iter_mut().find(|r| r.id == saved.id) {
                        Some(existing) => *existing = saved,
                        None => self.research.researches.push(saved),
                    }
                    self.research.form = blank_research_form();
                }
            }
            Action::DeleteResearch(phase) => {
                if let Some(id) = self.research.status.track(phase) {
                    self.research.researches.retain(|r| r.id != id);
                }
            }
            Action::SetResearchForm(form) => self.research.form = form,
            Action::ResetResearchForm => self.research.form = blank_research_form(),

            Action::Search(phase) => {
                if let Some(results) = self.wikipedia.status.track(phase) {
                    self.wikipedia.search_results = results;
                }
            }
            Action::LoadPage(phase) => {
                if let Some(page) = self.wikipedia.status.track(phase) {
                    self.wikipedia.selected_page = Some(page);
                }
            }
            Action::LoadTalkPage(phase) => {
                if let Some(page) = self.wikipedia.status.track(phase) {
                    self.wikipedia.selected_talk_page = Some(page);
                }
            }
            Action::ImportThread(phase) => {
                if let Some(created) = self.wikipedia.status.track(phase) {
                    self.wikipedia.last_import = Some(created);
                }
            }
            Action::ListThreads(phase) => {
                if let Some(threads) = self.wikipedia.status.track(phase) {
                    self.wikipedia.threads = threads;
                }
            }
            Action::DeleteThread(phase) => {
                if let Some(id) = self.wikipedia.status.track(phase) {
                    self.wikipedia.threads.retain(|t| t.thread_id != id);
                }
            }
            Action::ClearSearch => self.wikipedia.search_results.clear(),
        }
    }

    /// Run an analysis of `source` with the current parameters through
    /// `backend`, recording every phase. On failure the error's message is
    /// stored and the error itself returned.
    pub async fn run_analysis(
        &mut self,
        backend: &dyn AnalysisBackend,
        source: &str,
    ) -> crate::error::Result<()> {
        self.apply(Action::Analyze(Phase::Pending));
        let params = self.network.params.clone();
        match backend.analyze(source, &params).await {
            Ok(graph) => {
                self.apply(Action::Analyze(Phase::Done(graph)));
                Ok(())
            }
            Err(e) => {
                self.apply(Action::Analyze(Phase::Failed(e.to_string())));
                Err(e)
            }
        }
    }
}
