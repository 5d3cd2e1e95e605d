/// Top-level Parley error type.
///
/// All fallible operations in `parley-core` return [`Result<T, ParleyError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum ParleyError {
    /// Error while reading a chat export or talk page.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error while building or measuring an interaction graph.
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error talking to the remote analysis API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the input parsers.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// The input contained no recognizable messages.
    #[error("No messages found in {0}")]
    Empty(String),

    /// A graph document could not be decoded.
    #[error("Invalid graph document: {0}")]
    Graph(#[from] serde_json::Error),

    /// A date or time filter value could not be interpreted.
    #[error("Invalid date/time '{value}': {message}")]
    DateTime {
        /// The offending input.
        value: String,
        /// Description of the failure.
        message: String,
    },
}

/// Errors during graph construction and measurement.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    /// A link references a node that is not part of the graph.
    #[error("Link {from} -> {to} references an unknown node")]
    DanglingLink {
        /// Link source identifier.
        from: String,
        /// Link target identifier.
        to: String,
    },

    /// Analysis parameters are present but semantically invalid.
    #[error("Invalid analysis parameters: {0}")]
    InvalidParams(String),
}

/// Errors in Parley configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration file could not be written.
    #[error("Cannot write config file: {0}")]
    Write(String),
}

/// Errors from the remote API. Every variant renders as the message that is
/// surfaced to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The operation needs a bearer token and none is configured.
    #[error("Authentication required")]
    Unauthenticated,

    /// Network-level failure reaching the server.
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success HTTP status.
    #[error("{detail} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error body, or the operation's fallback message.
        detail: String,
    },

    /// Response body did not match the expected shape.
    #[error("Response decode error: {0}")]
    Decode(String),
}

/// Convenience alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;
