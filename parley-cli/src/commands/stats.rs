use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use parley_core::error::ParseError;
use parley_core::state::{Action, AppState, Phase};
use parley_core::types::{DegreeMaps, NetworkGraph};

use super::GlobalArgs;
use super::output::render_statistics;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Network JSON file (nodes and links), e.g. saved with --save
    pub file: PathBuf,

    /// Output format: text, json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Also list in/out degree per participant
    #[arg(long)]
    pub degrees: bool,

    /// Only keep participants whose betweenness meets the configured threshold
    #[arg(long)]
    pub strong: bool,
}

pub fn run(args: StatsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Cannot read input file: {}", args.file.display()))?;
    let graph: NetworkGraph = serde_json::from_str(&content)
        .map_err(ParseError::Graph)
        .with_context(|| format!("Cannot parse input file: {}", args.file.display()))?;

    let dangling = graph.dangling_links().len();
    if dangling > 0 {
        tracing::warn!(dangling, "Ignoring links to unknown participants");
    }

    let mut state = AppState::new(config.analysis.strong_connection_threshold);
    state.apply(Action::Analyze(Phase::Done(graph)));
    if args.strong {
        state.apply(Action::ToggleStrongConnections);
    }

    let stats = state
        .network
        .statistics
        .clone()
        .context("No network to measure")?;
    let degrees = &state.network.degrees;

    if args.format == "json" {
        let mut json = serde_json::json!({ "statistics": stats });
        if args.degrees {
            json["degrees"] = serde_json::to_value(degrees)?;
        }
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print!("{}", render_statistics(&stats));
        if args.degrees {
            print!("{}", render_degrees(degrees));
        }
    }
    Ok(())
}

fn render_degrees(degrees: &DegreeMaps) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<32} {:>6} {:>6}", "Participant", "In", "Out");
    let _ = writeln!(out, "{:-<46}", "");
    let mut names: Vec<&String> = degrees
        .in_degree
        .keys()
        .chain(degrees.out_degree.keys())
        .collect();
    names.sort();
    names.dedup();
    for name in names {
        let _ = writeln!(
            out,
            "{:<32} {:>6} {:>6}",
            name,
            degrees.in_degree.get(name).copied().unwrap_or(0),
            degrees.out_degree.get(name).copied().unwrap_or(0)
        );
    }
    out
}
