use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pasted::{api::create_router, application::builder::ApplicationBuilder, Config};

/// Content-addressed paste and short-link service
#[derive(Debug, Parser)]
#[command(name = "pasted", version, about)]
struct Cli {
    /// Settings file (TOML, or YAML by extension)
    #[arg(short, long, env = "PASTED_SETTINGS")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides LISTEN_ADDR
    #[arg(short, long)]
    listen: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    info!("Starting pasted");

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    config.validate().context("validating configuration")?;
    info!("Configuration loaded and validated");

    let listen_addr = config.listen_addr.clone();
    let state = ApplicationBuilder::from_config(config)
        .await
        .context("initialising application")?;

    let app = create_router(state);

    info!("Listening on {}", listen_addr);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {}", listen_addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
