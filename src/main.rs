use clap::Parser;
use enocean_ua_bridge::config::{CatalogNaming, Config, EnvLayer, Overrides, SensorSource};
use enocean_ua_bridge::lifecycle;
use log::{error, info};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "enocean-ua-bridge")]
#[command(about = "Publish EnOcean sensor bridge readings as address-space variables")]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the bridge's per-channel files
    #[arg(long)]
    bridge_dir: Option<PathBuf>,

    /// Where channel readings come from
    #[arg(long, value_enum)]
    source: Option<SensorSource>,

    /// Sync period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// How scalar catalog variables are named
    #[arg(long, value_enum)]
    catalog_naming: Option<CatalogNaming>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            bridge_dir: self.bridge_dir.clone(),
            source: self.source,
            sync_interval_ms: self.interval_ms,
            catalog_naming: self.catalog_naming,
        }
    }
}

fn init_logger(env: &EnvLayer) {
    env_logger::Builder::new()
        .parse_filters(env.get("RUST_LOG").unwrap_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let env = EnvLayer::from_system();
    init_logger(&env);
    info!("Starting EnOcean UA Bridge");

    let cli = Cli::parse();
    let mut config = match Config::load(cli.config.as_deref(), &env) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.apply_overrides(&cli.overrides());
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded:");
    info!("  Sensor source: {:?}", config.sensors.source);
    info!("  Bridge directory: {}", config.sensors.bridge_dir.display());
    info!("  Sync interval: {} ms", config.server.sync_interval_ms);
    info!("  Namespace: {}", config.server.namespace);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let status = runtime.block_on(async {
        let shutdown = CancellationToken::new();
        let _signal_task = lifecycle::install_shutdown_handler(shutdown.clone());
        info!("  - Press Ctrl+C to exit");
        lifecycle::run(&config, shutdown).await
    });

    match status {
        Ok(status) => {
            info!("EnOcean UA Bridge stopped: {}", status);
            std::process::exit(status.exit_code());
        }
        Err(e) => {
            error!("Failed to build address space: {}", e);
            std::process::exit(1);
        }
    }
}
