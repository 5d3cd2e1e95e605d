use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::AnalysisSection;
use crate::extract::{ChatExport, TalkPage};
use crate::types::{AnalysisParams, ChatMessage, NetworkGraph};

use super::filter::FilterProfile;
use super::network::build_network;
use super::traits::AnalysisBackend;

/// Kind of conversation file analysed on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// `[dd.mm.yyyy, HH:MM:SS] Sender: message` export.
    #[default]
    Chat,
    /// Saved talk-page wikitext.
    Talk,
}

impl SourceKind {
    pub fn profile(self) -> FilterProfile {
        match self {
            Self::Chat => FilterProfile::ChatExport,
            Self::Talk => FilterProfile::TalkThread,
        }
    }

    /// Read and parse `path`; a file without messages is a parse error.
    pub fn load(self, path: &Path) -> crate::error::Result<Vec<ChatMessage>> {
        match self {
            Self::Chat => ChatExport::from_path(path).map(|export| export.messages),
            Self::Talk => TalkPage::from_path(path).map(|page| page.messages()),
        }
    }
}

/// Analyses conversation files from disk without a server.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    pub kind: SourceKind,
    pub settings: AnalysisSection,
}

impl LocalBackend {
    pub fn new(kind: SourceKind, settings: AnalysisSection) -> Self {
        Self { kind, settings }
    }
}

#[async_trait::async_trait]
impl AnalysisBackend for LocalBackend {
    fn name(&self) -> &'static str {
        match self.kind {
            SourceKind::Chat => "local-chat",
            SourceKind::Talk => "local-talk",
        }
    }

    async fn analyze(
        &self,
        source: &str,
        params: &AnalysisParams,
    ) -> crate::error::Result<NetworkGraph> {
        info!(path = source, backend = self.name(), "Analyzing local file");
        let path = PathBuf::from(source);
        let kind = self.kind;
        let messages = tokio::task::spawn_blocking(move || kind.load(&path))
            .await
            .map_err(std::io::Error::other)??;
        build_network(&messages, params, kind.profile(), &self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParleyError, ParseError};

    #[tokio::test]
    async fn analyzes_chat_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(
            &path,
            "[01.03.2024, 09:00:00] Alice: hi\n[01.03.2024, 09:01:00] Bob: hey\n",
        )
        .unwrap();

        let backend = LocalBackend::default();
        let graph = backend
            .analyze(path.to_str().unwrap(), &AnalysisParams::default())
            .await
            .unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let backend = LocalBackend::default();
        let err = backend
            .analyze("/definitely/not/here.txt", &AnalysisParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Io(_)));
    }

    #[tokio::test]
    async fn talk_file_uses_substring_usernames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.txt");
        std::fs::write(
            &path,
            "== A ==\nFirst [[User:Alice Smith|A]] 10:00, 1 May 2024 (UTC)\n\
             Second [[User:Bob]] 10:05, 1 May 2024 (UTC)\n",
        )
        .unwrap();

        let backend = LocalBackend::new(SourceKind::Talk, AnalysisSection::default());
        let params = AnalysisParams {
            username: Some("smith".into()),
            ..Default::default()
        };
        let graph = backend
            .analyze(path.to_str().unwrap(), &params)
            .await
            .unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "Alice Smith");
    }

    #[tokio::test]
    async fn undated_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "nothing here").unwrap();

        let err = LocalBackend::default()
            .analyze(path.to_str().unwrap(), &AnalysisParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Parse(ParseError::Empty(_))));
    }
}
