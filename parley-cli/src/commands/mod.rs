pub mod analyze;
pub mod auth;
pub mod files;
pub mod filters;
pub mod network;
pub mod output;
pub mod research;
pub mod stats;
pub mod wiki;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};

use parley_core::analyze::SourceKind;
use parley_core::client::{ApiClient, RemoteTarget};
use parley_core::config::ParleyConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the interaction network of a local chat export
    Analyze(analyze::AnalyzeArgs),
    /// Build the interaction network of a saved talk page
    Talk(analyze::AnalyzeArgs),
    /// Compute graph statistics for a saved network JSON file
    Stats(stats::StatsArgs),
    /// Log in and print (or save) an access token
    Login(auth::LoginArgs),
    /// Create an account on the analysis server
    Register(auth::RegisterArgs),
    /// Show the account the token belongs to
    Whoami,
    /// Manage uploaded chat exports
    Files(files::FilesArgs),
    /// Analyze an uploaded chat export on the server
    Network(network::NetworkArgs),
    /// Analyze an imported talk-page thread on the server
    ThreadNetwork(network::NetworkArgs),
    /// Manage research projects
    Research(research::ResearchArgs),
    /// Search Wikipedia and import talk pages
    Wiki(wiki::WikiArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: .parley/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Analysis server URL
    #[arg(long, global = true, env = "PARLEY_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the analysis server
    #[arg(long, global = true, env = "PARLEY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

pub async fn run(cmd: Command, global: GlobalArgs) -> anyhow::Result<()> {
    match cmd {
        Command::Analyze(args) => analyze::run(args, SourceKind::Chat, &global).await,
        Command::Talk(args) => analyze::run(args, SourceKind::Talk, &global).await,
        Command::Stats(args) => stats::run(args, &global),
        Command::Login(args) => auth::login(args, &global).await,
        Command::Register(args) => auth::register(args, &global).await,
        Command::Whoami => auth::whoami(&global).await,
        Command::Files(args) => files::run(args, &global).await,
        Command::Network(args) => network::run(args, RemoteTarget::File, &global).await,
        Command::ThreadNetwork(args) => network::run(args, RemoteTarget::Thread, &global).await,
        Command::Research(args) => research::run(args, &global).await,
        Command::Wiki(args) => wiki::run(args, &global).await,
    }
}

/// Load the config file and apply command-line overrides.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<ParleyConfig> {
    let cwd = std::env::current_dir().context("Cannot resolve current directory")?;
    let mut config = ParleyConfig::discover(global.config.as_deref(), &cwd)
        .context("Cannot load config")?;
    config.apply_overrides(global.api_url.as_deref(), global.token.as_deref());
    config.validate().context("Invalid config")?;
    Ok(config)
}

/// Fail with a `NotFound` I/O error unless `path` is a regular file.
pub fn require_input_file(path: &Path) -> anyhow::Result<()> {
    if path.is_file() {
        return Ok(());
    }
    Err(anyhow::Error::new(std::io::Error::from(std::io::ErrorKind::NotFound))
        .context(format!("Cannot read input file: {}", path.display())))
}

pub fn api_client(config: &ParleyConfig) -> anyhow::Result<ApiClient> {
    ApiClient::from_config(&config.api).context("Cannot create API client")
}
