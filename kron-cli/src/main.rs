//! kron CLI - customer registration service
//!
//! Entry point for running the HTTP API:
//! - `kron serve` connects to PostgreSQL and serves `POST /customer/add`

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod env;
mod tracing_setup;

use commands::serve::{run_serve, ServeArgs};
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "kron",
    author,
    version,
    about = "Customer registration service with tag linking"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing so .env values feed clap's `env` fallbacks
    let loaded = env::load_dotenv();

    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug })?;
    for path in &loaded {
        tracing::debug!("Loaded .env from {}", path.display());
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
    }
}
