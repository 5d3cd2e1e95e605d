use std::fmt::Write;

use anyhow::Context;
use clap::{Args, Subcommand};

use parley_core::types::{Research, ResearchForm, ResearchUpdate};

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct ResearchArgs {
    #[command(subcommand)]
    pub command: ResearchCommand,
}

#[derive(Subcommand, Debug)]
pub enum ResearchCommand {
    /// List research projects
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one research project
    Show { id: String },
    /// Create a research project
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// First day of the studied period (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Last day of the studied period (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long, default_value = "50")]
        message_limit: u32,
        /// Uploaded chat export the project studies
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        anonymize: bool,
    },
    /// Change fields of a research project
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        message_limit: Option<u32>,
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        anonymize: Option<bool>,
    },
    /// Delete a research project
    Delete { id: String },
}

pub async fn run(args: ResearchArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let client = super::api_client(&config)?;

    match args.command {
        ResearchCommand::List { json } => {
            let researches = client
                .list_research()
                .await
                .context("Cannot list research projects")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&researches)?);
            } else {
                print!("{}", render_list(&researches));
            }
        }
        ResearchCommand::Show { id } => {
            let research = client
                .get_research(&id)
                .await
                .with_context(|| format!("Cannot fetch research project '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&research)?);
        }
        ResearchCommand::Create {
            name,
            description,
            start_date,
            end_date,
            message_limit,
            file,
            anonymize,
        } => {
            if name.trim().is_empty() {
                anyhow::bail!("Research name must not be empty");
            }
            let form = ResearchForm {
                name,
                description,
                start_date,
                end_date,
                message_limit: Some(message_limit),
                file_name: file,
                anonymize,
            };
            let created = client
                .create_research(&form)
                .await
                .context("Cannot create research project")?;
            println!("Created research {} ({})", created.name, created.id);
        }
        ResearchCommand::Update {
            id,
            name,
            description,
            start_date,
            end_date,
            message_limit,
            file,
            anonymize,
        } => {
            let update = ResearchUpdate {
                name,
                description,
                start_date,
                end_date,
                message_limit,
                file_name: file,
                anonymize,
            };
            if update == ResearchUpdate::default() {
                anyhow::bail!("Nothing to update; pass at least one field");
            }
            let updated = client
                .update_research(&id, &update)
                .await
                .with_context(|| format!("Cannot update research project '{id}'"))?;
            println!("Updated research {} ({})", updated.name, updated.id);
        }
        ResearchCommand::Delete { id } => {
            client
                .delete_research(&id)
                .await
                .with_context(|| format!("Cannot delete research project '{id}'"))?;
            println!("Deleted research {id}");
        }
    }
    Ok(())
}

fn render_list(researches: &[Research]) -> String {
    if researches.is_empty() {
        return "No research projects\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<24} {:<32} {:<12} {}", "ID", "Name", "Created", "File");
    let _ = writeln!(out, "{:-<80}", "");
    for r in researches {
        let created: String = r.created_at.chars().take(10).collect();
        let _ = writeln!(
            out,
            "{:<24} {:<32} {:<12} {}",
            r.id,
            r.name,
            created,
            r.file_name.as_deref().unwrap_or("-")
        );
    }
    out
}
