use anyhow::{Context, Result};
use clap::Parser;
use shared::{build_router, AppState, Config};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pocket-calculator")]
#[command(about = "Serve a page of reading statistics for a Pocket account")]
struct Args {
    /// Address to bind (overrides POCKET_CALCULATOR_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides POCKET_CALCULATOR_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Public origin used for the OAuth callback (overrides POCKET_CALCULATOR_PUBLIC_URL)
    #[arg(long)]
    public_url: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(public_url) = args.public_url {
        config.public_url = public_url;
    }

    let bind_addr = config.bind_addr();
    let public_url = config.public_url.clone();
    let state = AppState::new(config)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!("Listening at {}", public_url);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
