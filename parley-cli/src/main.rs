use clap::Parser;

use parley_core::error::{ApiError, ConfigError, ParleyError, ParseError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "parley",
    version,
    about = "Analyze who talks to whom in chat exports and wiki talk pages"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    #[command(flatten)]
    global: commands::GlobalArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Map an error to the process exit code by the first typed error in its
/// chain.
///
///   0 success
///   1 general error
///   2 configuration error
///   3 input file missing or unreadable
///   5 analysis server error (auth, HTTP status, network)
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ParleyError>() {
            return match e {
                ParleyError::Api(_) => 5,
                ParleyError::Config(_) => 2,
                ParleyError::Io(_) | ParleyError::Parse(_) => 3,
                ParleyError::Analyze(_) => 1,
            };
        }
        if cause.is::<ApiError>() {
            return 5;
        }
        if cause.is::<ConfigError>() {
            return 2;
        }
        if cause.is::<ParseError>() || cause.is::<std::io::Error>() {
            return 3;
        }
    }
    1
}

fn main() {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command, cli.global)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
