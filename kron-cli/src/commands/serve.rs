//! HTTP server command
//!
//! Connects the pool and runs the customer registration API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use kron_server::config::DEFAULT_DRIVER;
use kron_server::db::create_pool;
use kron_server::http::{run_server, ServerConfig};
use kron_server::{DatabaseConfig, PgStore};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "KRON_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL, e.g. postgres://localhost/kron
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Database username (overrides the one in the URL)
    #[arg(long, env = "DATABASE_USERNAME")]
    pub database_username: Option<String>,

    /// Database password (overrides the one in the URL)
    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,

    /// Database driver identifier
    #[arg(long, env = "DATABASE_DRIVER", default_value = DEFAULT_DRIVER)]
    pub database_driver: String,
}

impl ServeArgs {
    fn database_config(&self) -> Result<DatabaseConfig> {
        let url = self
            .database_url
            .clone()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or ~/.kron/.env")?;

        Ok(DatabaseConfig {
            url,
            username: self.database_username.clone(),
            password: self.database_password.clone(),
            driver: self.database_driver.clone(),
        })
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let database = args.database_config()?;
    let options = database
        .connect_options()
        .context("Invalid database configuration")?;

    tracing::info!(database = ?database, "Starting kron server on {}", args.bind);

    let pool = create_pool(options)
        .await
        .context("Failed to create database pool")?;

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Blocks until shutdown
    run_server(Arc::new(PgStore::new(pool)), config)
        .await
        .context("Server error")?;

    Ok(())
}
