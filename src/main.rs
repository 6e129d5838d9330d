use std::{error::Error, path::PathBuf};

use clap::Parser;
use sensorlog::{
    config::ServerConfig, server::Listener, state::TelemetryState, store::SensorLogStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TCP port to listen on
    port: u16,
    /// Config file, defaults to ./sensorlog.* if present
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = ServerConfig::load(cli.config.as_deref())?;
    let store = SensorLogStore::new(cfg.data_dir.clone());
    tokio::fs::create_dir_all(store.data_dir()).await?;

    let state = TelemetryState::new(store);
    let listener = Listener::bind(cfg.listen_addr(cli.port), state.clone()).await?;
    info!(
        "listening on {} with data in {}",
        listener.local_addr()?,
        state.store.data_dir().display()
    );

    tokio::select! {
        _ = listener.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    Ok(())
}
