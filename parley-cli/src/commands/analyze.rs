use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use parley_core::analyze::{LocalBackend, SourceKind};
use parley_core::state::{Action, AppState};

use super::GlobalArgs;
use super::filters::FilterArgs;
use super::output::{OutputArgs, present};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Conversation file to analyze
    pub file: PathBuf,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: AnalyzeArgs, kind: SourceKind, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let params = args.filters.to_params()?;

    super::require_input_file(&args.file)?;
    let source = args
        .file
        .to_str()
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::InvalidInput))
        .with_context(|| format!("Cannot read input file: {}", args.file.display()))?;

    let backend = LocalBackend::new(kind, config.analysis.clone());
    let mut state = AppState::new(config.analysis.strong_connection_threshold);
    state.apply(Action::UpdateParams(params));
    state
        .run_analysis(&backend, source)
        .await
        .with_context(|| format!("Cannot analyze input file: {}", args.file.display()))?;

    present(&mut state, &args.output)
}
