use std::fmt::Write;

use anyhow::Context;
use clap::Args;

use parley_core::config::ParleyConfig;
use parley_core::types::{Registration, UserResponse};

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "PARLEY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Store the token in the config file instead of printing it
    #[arg(long)]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "PARLEY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn login(args: LoginArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let client = super::api_client(&config)?;
    let token = client
        .login(&args.email, &args.password)
        .await
        .context("Login failed")?;

    if args.save {
        let path = match &global.config {
            Some(path) => path.clone(),
            None => {
                let cwd = std::env::current_dir().context("Cannot resolve current directory")?;
                ParleyConfig::default_path(&cwd)
            }
        };
        // Persist the token only, not command-line overrides.
        let mut stored = if path.is_file() {
            ParleyConfig::load(&path).context("Cannot load config")?
        } else {
            ParleyConfig::default()
        };
        stored.api.token = Some(token.access_token.clone());
        stored.save(&path).context("Cannot save config")?;
        println!("Logged in as {} (token saved to {})", token.user.email, path.display());
    } else {
        println!("{}", token.access_token);
    }
    tracing::info!(user = %token.user.id, "Logged in");
    Ok(())
}

pub async fn register(args: RegisterArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let client = super::api_client(&config)?;
    let registration = Registration {
        name: args.name,
        email: args.email,
        password: args.password,
    };
    let user = client
        .register(&registration)
        .await
        .context("Registration failed")?;
    print!("{}", render_user(&user));
    Ok(())
}

pub async fn whoami(global: &GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(global)?;
    let client = super::api_client(&config)?;
    let user = client.current_user().await.context("Cannot fetch current user")?;
    print!("{}", render_user(&user));
    Ok(())
}

fn render_user(user: &UserResponse) -> String {
    let mut out = format!("{} <{}>\n  id: {}\n", user.name, user.email, user.id);
    if !user.created_at.is_empty() {
        let _ = writeln!(out, "  created: {}", user.created_at);
    }
    out
}
