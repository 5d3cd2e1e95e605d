//! Parley core library: conversation parsing, interaction-network analysis,
//! graph metrics, the analysis server client, and application state.
//!
//! A network is built either locally with [`analyze::build_network`] from a
//! parsed [`extract::ChatExport`] or [`extract::TalkPage`], or remotely with
//! [`client::ApiClient`]. Both sit behind [`analyze::AnalysisBackend`], which
//! [`state::AppState::run_analysis`] drives.

pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod state;
pub mod types;
