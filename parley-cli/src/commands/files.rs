use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct FilesArgs {
    #[command(subcommand)]
    pub command: FilesCommand,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// Upload a chat export
    Upload {
        /// File to upload
        path: PathBuf,
    },
    /// List uploaded chat exports
    List,
    /// Delete an uploaded chat export
    Delete {
        /// Server-side filename
        name: String,
    },
}

pub async fn run(args: FilesArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let client = super::api_client(&config)?;

    match args.command {
        FilesCommand::Upload { path } => {
            super::require_input_file(&path)?;
            let uploaded = client
                .upload_file(&path)
                .await
                .with_context(|| format!("Upload of {} failed", path.display()))?;
            println!("Uploaded {}", uploaded.filename);
        }
        FilesCommand::List => {
            let files = client.list_files().await.context("Cannot list files")?;
            if files.is_empty() {
                println!("No uploaded files");
            }
            for name in &files {
                println!("{name}");
            }
        }
        FilesCommand::Delete { name } => {
            let response = client
                .delete_file(&name)
                .await
                .with_context(|| format!("Cannot delete file '{name}'"))?;
            if !response.success {
                anyhow::bail!("Server refused to delete '{name}': {}", response.message);
            }
            println!("Deleted {name}");
        }
    }
    Ok(())
}
