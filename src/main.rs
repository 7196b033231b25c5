mod cli;
mod config;
mod database;
mod documents;
mod error;
mod files;
mod github;
mod logging;
mod server;
mod state;
mod tools;
mod types;

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use tracing::info;

use cli::Cli;
use config::AppConfig;
use server::McpServer;
use state::AppState;
use tools::create_default_router;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    logging::init(config.server.debug);

    let state = AppState::new(config)?;
    info!(
        database = %state.database.path().display(),
        github = state.github.is_some(),
        debug = state.config.server.debug,
        "starting {} v{}",
        server::SERVER_NAME,
        env!("CARGO_PKG_VERSION")
    );

    let router = create_default_router(&state);
    info!(tools = router.len(), "tools registered");

    let service = McpServer::new(router, state.github.is_some())
        .serve(rmcp::transport::stdio())
        .await?;
    service.waiting().await?;

    info!("stdin closed, shutting down");
    Ok(())
}
