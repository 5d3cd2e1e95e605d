use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use parley_core::types::{ThreadUpload, WikipediaSearchResult, WikipediaThread};

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct WikiArgs {
    #[command(subcommand)]
    pub command: WikiCommand,
}

#[derive(Subcommand, Debug)]
pub enum WikiCommand {
    /// Search article titles
    Search {
        query: String,
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    /// Print an article's wikitext
    Page { title: String },
    /// Print (or save) an article's talk page wikitext
    Talk {
        title: String,
        /// Write the wikitext to this file for `parley talk`
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Import a talk page as a thread on the server
    Import {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List imported threads
    Threads,
    /// Delete an imported thread
    DeleteThread { id: String },
}

pub async fn run(args: WikiArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let client = super::api_client(&config)?;

    match args.command {
        WikiCommand::Search { query, limit } => {
            let results = client
                .search_wikipedia(&query, limit)
                .await
                .context("Wikipedia search failed")?;
            print!("{}", render_results(&results));
        }
        WikiCommand::Page { title } => {
            let page = client
                .wikipedia_page(&title)
                .await
                .with_context(|| format!("Cannot fetch Wikipedia page '{title}'"))?;
            if let Some(err) = page.error {
                anyhow::bail!("Wikipedia page '{title}': {err}");
            }
            println!("{}", page.content);
        }
        WikiCommand::Talk { title, save } => {
            let page = client
                .wikipedia_talk_page(&title)
                .await
                .with_context(|| format!("Cannot fetch talk page '{title}'"))?;
            if let Some(err) = page.error {
                anyhow::bail!("Talk page '{title}': {err}");
            }
            match save {
                Some(path) => {
                    std::fs::write(&path, &page.content)
                        .with_context(|| format!("Cannot write talk page to {}", path.display()))?;
                    println!("Saved talk page of '{}' to {}", page.title, path.display());
                }
                None => println!("{}", page.content),
            }
        }
        WikiCommand::Import { title, description } => {
            let upload = ThreadUpload {
                wikipedia_title: title,
                description,
            };
            let created = client
                .import_thread(&upload)
                .await
                .with_context(|| format!("Cannot import talk page '{}'", upload.wikipedia_title))?;
            println!("Imported thread {}", created.thread_id);
        }
        WikiCommand::Threads => {
            let threads = client.list_threads().await.context("Cannot list threads")?;
            print!("{}", render_threads(&threads));
        }
        WikiCommand::DeleteThread { id } => {
            client
                .delete_thread(&id)
                .await
                .with_context(|| format!("Cannot delete thread '{id}'"))?;
            println!("Deleted thread {id}");
        }
    }
    Ok(())
}

fn render_results(results: &[WikipediaSearchResult]) -> String {
    if results.is_empty() {
        return "No results\n".to_string();
    }
    let mut out = String::new();
    for r in results {
        let _ = writeln!(out, "{}", r.title);
        let snippet = strip_markup(&r.snippet);
        if !snippet.is_empty() {
            let _ = writeln!(out, "  {snippet}");
        }
    }
    out
}

/// Search snippets carry `<span class="searchmatch">` highlights.
fn strip_markup(snippet: &str) -> String {
    let mut out = String::with_capacity(snippet.len());
    let mut in_tag = false;
    for c in snippet.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn render_threads(threads: &[WikipediaThread]) -> String {
    if threads.is_empty() {
        return "No imported threads\n".to_string();
    }
    let mut out = String::new();
    for t in threads {
        let messages = t.messages.as_ref().map_or(0, Vec::len);
        let _ = writeln!(
            out,
            "{}  {} ({messages} messages)",
            t.thread_id, t.wikipedia_title
        );
        if !t.description.is_empty() {
            let _ = writeln!(out, "  {}", t.description);
        }
    }
    out
}
