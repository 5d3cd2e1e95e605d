use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Directory holding the per-project config file.
pub const CONFIG_DIR: &str = ".parley";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level Parley configuration, matching `.parley/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub damping: f64,
    pub pagerank_max_iterations: u32,
    pub eigenvector_max_iterations: u32,
    pub tolerance: f64,
    /// Minimum betweenness for a node to count as a strong connection.
    pub strong_connection_threshold: f64,
    /// Decimal places kept on centrality scores.
    pub score_precision: u32,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            damping: 0.85,
            pagerank_max_iterations: 100,
            eigenvector_max_iterations: 1000,
            tolerance: 1e-6,
            strong_connection_threshold: 0.1,
            score_precision: 4,
        }
    }
}

impl ParleyConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given (must exist), else `.parley/config.toml`
    /// under `root` if present, else defaults.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = Self::default_path(root);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the config as TOML, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Write(format!("{}: {e}", parent.display())))?;
        }
        std::fs::write(path, content)
            .map_err(|e| ConfigError::Write(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn default_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Command-line or environment values win over the file.
    pub fn apply_overrides(&mut self, base_url: Option<&str>, token: Option<&str>) {
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.api.base_url = url.to_string();
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.api.token = Some(token.to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
        }
        let a = &self.analysis;
        if !(a.damping > 0.0 && a.damping < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "analysis.damping must be in (0, 1), got {}",
                a.damping
            )));
        }
        if a.tolerance <= 0.0 {
            return Err(ConfigError::Invalid("analysis.tolerance must be positive".into()));
        }
        if !(0.0..=1.0).contains(&a.strong_connection_threshold) {
            return Err(ConfigError::Invalid(format!(
                "analysis.strong_connection_threshold must be in [0, 1], got {}",
                a.strong_connection_threshold
            )));
        }
        if a.score_precision > 12 {
            return Err(ConfigError::Invalid("analysis.score_precision must be at most 12".into()));
        }
        Ok(())
    }
}
