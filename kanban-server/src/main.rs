//! Kanban task store server.
//!
//! Serves the task CRUD API over HTTP and persists every change to a JSON
//! file.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080, storing tasks in ./tasks.json
//! cargo run --bin kanban-server
//!
//! # Custom address and data file
//! cargo run --bin kanban-server -- --bind 127.0.0.1:9090 --data-file /tmp/board.json
//! ```

use std::sync::Arc;

use clap::Parser;
use kanban_server::api;
use kanban_server::config::{ServerCliArgs, ServerConfig};
use kanban_server::store::TaskRepository;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        addr = %config.bind_addr,
        data_file = %config.data_file.display(),
        "starting kanban store server"
    );

    let repo = match TaskRepository::open(&config.data_file).await {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            tracing::error!(error = %e, "failed to open task store");
            std::process::exit(1);
        }
    };

    match api::start_server_with_state(&config.bind_addr, repo, &config.allowed_origins).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "store server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "store server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start store server");
            std::process::exit(1);
        }
    }
}
