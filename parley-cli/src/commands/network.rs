use anyhow::Context;
use clap::Args;

use parley_core::client::{RemoteBackend, RemoteTarget};
use parley_core::state::{Action, AppState};

use super::GlobalArgs;
use super::filters::FilterArgs;
use super::output::{OutputArgs, present};

#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Uploaded filename, or thread id for `thread-network`
    pub source: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(
    args: NetworkArgs,
    target: RemoteTarget,
    global: &GlobalArgs,
) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let params = args.filters.to_params()?;
    let client = super::api_client(&config)?;

    let backend = RemoteBackend::new(client, target);

    let mut state = AppState::new(config.analysis.strong_connection_threshold);
    state.apply(Action::UpdateParams(params));
    state
        .run_analysis(&backend, &args.source)
        .await
        .with_context(|| format!("Remote analysis of '{}' failed", args.source))?;

    if let Some(graph) = &state.network.graph {
        for link in graph.dangling_links() {
            tracing::warn!(source = %link.source, target = %link.target, "Link references an unknown participant");
        }
    }

    present(&mut state, &args.output)
}
