//! Lastmile Mock API Server - Entry Point

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use lastmile_server::auth::ApiKeyStore;
use lastmile_server::logs::{init_logging, LogOptions};
use lastmile_server::options::ServerOptions;
use lastmile_server::registry::{DeploymentRegistry, RegistrySettings};
use lastmile_server::serve::serve;
use lastmile_server::state::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse --key=value command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            cli_args.insert(key.trim_start_matches('-').to_string(), value.to_string());
        } else if arg.starts_with("--") {
            cli_args.insert(arg.trim_start_matches('-').to_string(), "true".to_string());
        }
    }

    let log_options = LogOptions {
        filter: cli_args
            .get("log")
            .cloned()
            .unwrap_or_else(|| "info".to_string()),
        json_format: cli_args.contains_key("log-json"),
    };
    init_logging(&log_options).context("failed to initialize logging")?;

    let mut options = ServerOptions::default();
    if let Some(host) = cli_args.get("host") {
        options.host = host.clone();
    }
    if let Some(port) = cli_args.get("port") {
        options.port = port.parse().context("invalid --port value")?;
    }

    let registry = DeploymentRegistry::new(RegistrySettings::default());
    let keys = Arc::new(ApiKeyStore::demo());
    let state = Arc::new(ServerState::new(registry, keys));

    let (addr, handle) = serve(&options, state, shutdown_signal()).await?;
    info!("Lastmile mock API listening on http://{}", addr);

    handle.await??;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down...");
}
