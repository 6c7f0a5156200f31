mod fetch;
mod resolve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "zephyr-manifest", version, about = "Resolve and inspect Zephyr federation manifests")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve `zephyr:dependencies` of a package and write its manifest
    Resolve(resolve::ResolveArgs),
    /// Print the live manifest of a deployed application
    Fetch(fetch::FetchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Resolve(args) => resolve::run(args).await,
        Command::Fetch(args) => fetch::run(args).await,
    }
}
