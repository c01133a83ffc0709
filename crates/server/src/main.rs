use anyhow::Result;
use clap::Parser;
use tracing::info;

use lernwerk_core::config::{load_dotenv, Config};
use lernwerk_server::router::build_router;
use lernwerk_server::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "lernwerk-server", about = "Study-notes generation backend")]
struct Cli {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory for notes and curricula
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir.into();
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(
        "Starting lernwerk-server with provider={} model={}",
        config.llm.provider, config.llm.model
    );

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
