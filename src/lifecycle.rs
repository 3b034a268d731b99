//! Process lifecycle: assemble the server, run it, stop on Ctrl-C.

use crate::address_space::StatusCode;
use crate::bootstrap::{AddressSpaceBootstrapper, AddressSpaceLayout};
use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::sensors::reader_from_config;
use crate::server::Server;
use crate::sync_job::{JOB_NAME, PeriodicSyncJob};
use log::{error, info};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `shutdown` when the process receives Ctrl-C.
pub fn install_shutdown_handler(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                shutdown.cancel();
            }
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        }
    })
}

/// Build the server: populate the address space and register the sync job.
pub fn prepare(config: &Config) -> Result<(Server, AddressSpaceLayout)> {
    let mut server = Server::new();
    let layout = AddressSpaceBootstrapper::from_config(&config.server)
        .build(server.address_space_mut())?;

    let reader = reader_from_config(&config.sensors);
    let job = PeriodicSyncJob::new(reader, layout.channels.clone());
    server
        .add_repeated_job(Box::new(job), config.server.sync_interval())
        .map_err(|status| BridgeError::JobRegistrationFailed {
            name: JOB_NAME.to_string(),
            status,
        })?;

    Ok((server, layout))
}

/// Run until `shutdown` is cancelled. Returns the run loop's status.
pub async fn run(config: &Config, shutdown: CancellationToken) -> Result<StatusCode> {
    let (mut server, _layout) = prepare(config)?;
    info!(
        "Serving sensor channels from {:?} source, syncing every {:?}",
        config.sensors.source,
        config.server.sync_interval()
    );
    Ok(server.run(shutdown).await)
}
