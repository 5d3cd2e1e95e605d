// HTTP client for the Parley analysis server.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url, multipart};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::analyze::AnalysisBackend;
use crate::config::ApiSection;
use crate::error::{ApiError, ConfigError, ParleyError};
use crate::types::{
    AnalysisParams, Credentials, FileOperationResponse, FileUploadResponse, NetworkGraph,
    Registration, Research, ResearchForm, ResearchUpdate, ThreadCreated, ThreadUpload,
    TokenResponse, UserResponse, WikipediaPage, WikipediaSearchResult, WikipediaThread,
};

/// Shortest query the search endpoint is asked for.
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;

// ── Client ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> crate::error::Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ParleyError::Config(ConfigError::Invalid(format!(
                "api.base_url '{base_url}' is not a valid URL: {e}"
            )))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ParleyError::Config(ConfigError::Invalid(format!(
                "api.base_url '{base_url}' cannot hold a path"
            ))));
        }

        // Another client may have installed it already.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn from_config(api: &ApiSection) -> crate::error::Result<Self> {
        let client = Self::new(&api.base_url, Duration::from_secs(api.timeout_secs))?;
        Ok(match &api.token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// A request carrying the bearer token when one is set.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// A request that must carry a bearer token; fails locally without one.
    fn authed(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        if self.token.is_none() {
            return Err(ApiError::Unauthenticated);
        }
        Ok(self.request(method, url))
    }

    async fn send(builder: RequestBuilder, fallback: &str) -> Result<Response, ApiError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let detail = error_detail(&body).unwrap_or_else(|| fallback.to_string());
            debug!(status, %detail, "API request failed");
            return Err(ApiError::Status { status, detail });
        }
        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(
        builder: RequestBuilder,
        fallback: &str,
    ) -> crate::error::Result<T> {
        let resp = Self::send(builder, fallback).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ParleyError::Api(ApiError::Decode(e.to_string())))
    }

    // ── Authentication ─────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> crate::error::Result<TokenResponse> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let req = self
            .client
            .post(self.endpoint(&["auth", "login"]))
            .json(&body);
        let token: TokenResponse = Self::fetch(req, "Login failed").await?;
        info!(user = %token.user.email, "Logged in");
        Ok(token)
    }

    pub async fn register(&self, registration: &Registration) -> crate::error::Result<UserResponse> {
        let req = self
            .client
            .post(self.endpoint(&["auth", "register"]))
            .json(registration);
        Self::fetch(req, "Registration failed").await
    }

    pub async fn current_user(&self) -> crate::error::Result<UserResponse> {
        let req = self.authed(Method::GET, self.endpoint(&["users", "me"]))?;
        Self::fetch(req, "Failed to fetch user").await
    }

    // ── Files ──────────────────────────────────────────────────────

    /// Upload a chat export as multipart field `file`.
    pub async fn upload_file(&self, path: &Path) -> crate::error::Result<FileUploadResponse> {
        let req = self.authed(Method::POST, self.endpoint(&["files", "upload"]))?;
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("chat.txt")
            .to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/plain")
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let uploaded: FileUploadResponse =
            Self::fetch(req.multipart(form), "File upload failed").await?;
        info!(filename = %uploaded.filename, "Uploaded file");
        Ok(uploaded)
    }

    pub async fn list_files(&self) -> crate::error::Result<Vec<String>> {
        let req = self.authed(Method::GET, self.endpoint(&["files"]))?;
        Self::fetch(req, "Failed to list files").await
    }

    pub async fn delete_file(&self, filename: &str) -> crate::error::Result<FileOperationResponse> {
        let req = self.authed(Method::DELETE, self.endpoint(&["files", filename]))?;
        Self::fetch(req, "Failed to delete file").await
    }

    // ── Network analysis ───────────────────────────────────────────

    pub async fn analyze_network(
        &self,
        filename: &str,
        params: &AnalysisParams,
    ) -> crate::error::Result<NetworkGraph> {
        params.validate()?;
        let req = self
            .authed(Method::GET, self.endpoint(&["analyze", "network", filename]))?
            .query(&params.query_pairs());
        let graph: NetworkGraph = Self::fetch(req, "Network analysis failed").await?;
        info!(
            filename,
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "Received network"
        );
        Ok(graph)
    }

    pub async fn analyze_thread(
        &self,
        thread_id: &str,
        params: &AnalysisParams,
    ) -> crate::error::Result<NetworkGraph> {
        params.validate()?;
        let req = self
            .authed(Method::GET, self.endpoint(&["wikipedia", "network", thread_id]))?
            .query(&params.query_pairs());
        let graph: NetworkGraph = Self::fetch(req, "Thread analysis failed").await?;
        info!(
            thread_id,
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "Received thread network"
        );
        Ok(graph)
    }

    // ── Research ───────────────────────────────────────────────────

    pub async fn create_research(&self, form: &ResearchForm) -> crate::error::Result<Research> {
        let req = self
            .authed(Method::POST, self.endpoint(&["research"]))?
            .json(form);
        Self::fetch(req, "Failed to create research").await
    }

    pub async fn list_research(&self) -> crate::error::Result<Vec<Research>> {
        let req = self.authed(Method::GET, self.endpoint(&["research"]))?;
        Self::fetch(req, "Failed to fetch research").await
    }

    pub async fn get_research(&self, id: &str) -> crate::error::Result<Research> {
        let req = self.authed(Method::GET, self.endpoint(&["research", id]))?;
        Self::fetch(req, "Failed to fetch research").await
    }

    pub async fn update_research(
        &self,
        id: &str,
        update: &ResearchUpdate,
    ) -> crate::error::Result<Research> {
        let req = self
            .authed(Method::PUT, self.endpoint(&["research", id]))?
            .json(update);
        Self::fetch(req, "Failed to update research").await
    }

    /// The server answers 204 with no body.
    pub async fn delete_research(&self, id: &str) -> crate::error::Result<()> {
        let req = self.authed(Method::DELETE, self.endpoint(&["research", id]))?;
        Self::send(req, "Failed to delete research").await?;
        Ok(())
    }

    // ── Wikipedia ──────────────────────────────────────────────────

    /// Search article titles. Queries shorter than two characters return
    /// nothing without contacting the server.
    pub async fn search_wikipedia(
        &self,
        query: &str,
        limit: u32,
    ) -> crate::error::Result<Vec<WikipediaSearchResult>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_CHARS {
            return Ok(Vec::new());
        }
        let req = self
            .request(Method::GET, self.endpoint(&["wikipedia", "search"]))
            .query(&[("query", query.to_string()), ("limit", limit.to_string())]);
        Self::fetch(req, "Wikipedia search failed").await
    }

    pub async fn wikipedia_page(&self, title: &str) -> crate::error::Result<WikipediaPage> {
        let req = self.request(Method::GET, self.endpoint(&["wikipedia", "page", title]));
        Self::fetch(req, "Failed to fetch Wikipedia page").await
    }

    pub async fn wikipedia_talk_page(&self, title: &str) -> crate::error::Result<WikipediaPage> {
        let req = self.request(Method::GET, self.endpoint(&["wikipedia", "talk", title]));
        Self::fetch(req, "Failed to fetch Wikipedia talk page").await
    }

    /// Have the server fetch, parse and store a talk page as a thread.
    pub async fn import_thread(&self, upload: &ThreadUpload) -> crate::error::Result<ThreadCreated> {
        let req = self
            .authed(Method::POST, self.endpoint(&["wikipedia", "upload-threaded"]))?
            .json(upload);
        let created: ThreadCreated =
            Self::fetch(req, "Failed to upload Wikipedia thread").await?;
        info!(thread_id = %created.thread_id, title = %upload.wikipedia_title, "Imported thread");
        Ok(created)
    }

    pub async fn list_threads(&self) -> crate::error::Result<Vec<WikipediaThread>> {
        let req = self.authed(Method::GET, self.endpoint(&["wikipedia", "threads"]))?;
        Self::fetch(req, "Failed to fetch threads").await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> crate::error::Result<()> {
        let req = self.authed(
            Method::DELETE,
            self.endpoint(&["wikipedia", "threads", thread_id]),
        )?;
        Self::send(req, "Failed to delete thread").await?;
        Ok(())
    }
}

/// The `detail` of an error body: a string, or the `msg` fields of a
/// validation error list joined with `; `.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

// ── Remote backends ────────────────────────────────────────────────

/// What a remote analysis `source` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteTarget {
    /// An uploaded chat export, by filename.
    File,
    /// An imported talk-page thread, by id.
    Thread,
}

/// Runs analyses on the server.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    pub client: ApiClient,
    pub target: RemoteTarget,
}

impl RemoteBackend {
    pub fn new(client: ApiClient, target: RemoteTarget) -> Self {
        Self { client, target }
    }
}

#[async_trait::async_trait]
impl AnalysisBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        match self.target {
            RemoteTarget::File => "remote-file",
            RemoteTarget::Thread => "remote-thread",
        }
    }

    async fn analyze(
        &self,
        source: &str,
        params: &AnalysisParams,
    ) -> crate::error::Result<NetworkGraph> {
        match self.target {
            RemoteTarget::File => self.client.analyze_network(source, params).await,
            RemoteTarget::Thread => self.client.analyze_thread(source, params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_are_percent_encoded() {
        let c = client("http://localhost:8000");
        assert_eq!(
            c.endpoint(&["wikipedia", "talk", "C++ / Rust"]).as_str(),
            "http://localhost:8000/wikipedia/talk/C++%20%2F%20Rust"
        );
        assert_eq!(
            c.endpoint(&["analyze", "network", "chat 1.txt"]).as_str(),
            "http://localhost:8000/analyze/network/chat%201.txt"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let c = client("https://example.org/api/");
        assert_eq!(
            c.endpoint(&["files"]).as_str(),
            "https://example.org/api/files"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = ApiClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }

    #[test]
    fn error_detail_shapes() {
        assert_eq!(
            error_detail(r#"{"detail": "Incorrect email or password"}"#).as_deref(),
            Some("Incorrect email or password")
        );
        assert_eq!(
            error_detail(r#"{"detail": [{"msg": "field required"}, {"msg": "bad value"}]}"#)
                .as_deref(),
            Some("field required; bad value")
        );
        assert_eq!(error_detail("<html>oops</html>"), None);
        assert_eq!(error_detail(r#"{"error": "x"}"#), None);
    }

    #[test]
    fn empty_token_is_no_token() {
        let c = client("http://localhost:8000").with_token("");
        assert!(c.token().is_none());
    }

    #[tokio::test]
    async fn authenticated_calls_fail_without_token() {
        let c = client("http://127.0.0.1:9");
        let err = c.list_files().await.unwrap_err();
        assert!(matches!(err, ParleyError::Api(ApiError::Unauthenticated)));
        assert_eq!(
            ApiError::Unauthenticated.to_string(),
            "Authentication required"
        );
    }

    #[tokio::test]
    async fn short_search_skips_request() {
        // Port 9 is discard; any request would fail.
        let c = client("http://127.0.0.1:9");
        assert!(c.search_wikipedia(" a ", 10).await.unwrap().is_empty());
    }
}
