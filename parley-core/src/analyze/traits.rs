use crate::types::{AnalysisParams, NetworkGraph};

/// Something that can turn a conversation source into a scored network.
///
/// `source` names the conversation in the backend's own terms: a file path
/// for local analysis, an uploaded filename or thread id for the API.
#[async_trait::async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Run one analysis with the given filters.
    async fn analyze(
        &self,
        source: &str,
        params: &AnalysisParams,
    ) -> crate::error::Result<NetworkGraph>;
}
