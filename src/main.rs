//! CancinHub API server

use cancinhub::{
    api::{init_tracing, monitoring::MetricsRegistry, ApiServer},
    Casino, ConfigLoader, SettlementMode,
};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cancinhub")]
#[command(about = "CancinHub virtual casino API", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// API server host (overrides config and environment)
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Directory holding users.json and historial.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// debit_then_credit or additive_credit
    #[arg(long)]
    settlement_mode: Option<SettlementMode>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(mode) = args.settlement_mode {
        config.settlement.mode = mode;
    }
    config.validate()?;

    if let Some(path) = args.dump_config {
        loader.save(&config, &path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    init_tracing(&config.monitoring.log_filter);
    info!("Starting CancinHub {}", env!("CARGO_PKG_VERSION"));

    let casino = Arc::new(Casino::open(&config, MetricsRegistry::new()).await?);
    ApiServer::new(config, casino).run().await
}
