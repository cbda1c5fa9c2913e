use clap::Parser;
use log::{debug, info, warn};
use server::config::ServerConfig;
use server::control::ControlServer;
use server::hub::{Hub, ServerMessage};
use server::network::NetworkServer;
use server::utils::watch_task;
use shared::MapCatalog;
use std::path::PathBuf;
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, then starts the WebSocket listener, the
/// control plane and the hub loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// WebSocket port
        #[clap(short, long, default_value = "3000")]
        port: u16,
        /// HTTP control plane port, 0 to disable
        #[clap(short, long, default_value = "3001")]
        control_port: u16,
        /// Directory with extra `*.map` layouts
        #[clap(short, long)]
        maps_dir: Option<PathBuf>,
        /// Minimum milliseconds between accepted updates per player
        #[clap(long, default_value = "50")]
        throttle_ms: u64,
        /// Milliseconds of silence before a player is evicted
        #[clap(long, default_value = "30000")]
        inactivity_timeout_ms: u64,
        /// Milliseconds between inactivity sweeps
        #[clap(long, default_value = "10000")]
        reaper_period_ms: u64,
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = Args::parse();

    let config = ServerConfig {
        bind_address: format!("{}:{}", args.host, args.port),
        control_address: (args.control_port != 0)
            .then(|| format!("{}:{}", args.host, args.control_port)),
        maps_dir: args.maps_dir,
        update_throttle: Duration::from_millis(args.throttle_ms),
        inactivity_timeout: Duration::from_millis(args.inactivity_timeout_ms),
        reaper_period: Duration::from_millis(args.reaper_period_ms),
        ..ServerConfig::default()
    };
    config.validate()?;

    let catalog = match &config.maps_dir {
        Some(dir) => match MapCatalog::load_dir(dir) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Failed to load maps from {}: {}, using built-in maps", dir.display(), e);
                MapCatalog::default()
            }
        },
        None => MapCatalog::default(),
    };
    info!("Maps available: {:?}", catalog.names());

    let mut hub = Hub::new(config.clone(), catalog);
    let hub_tx = hub.sender();

    let network = NetworkServer::bind(&config.bind_address, hub.sender()).await?;

    let _control = match &config.control_address {
        Some(address) => Some(ControlServer::start(address, hub.sender())?),
        None => {
            info!("Control plane disabled");
            None
        }
    };

    // Spawn network task
    let network_handle = tokio::spawn(network.run());

    // Spawn hub loop
    let hub_handle = tokio::spawn(async move {
        hub.run().await;
    });

    // Task failures are logged; only Ctrl+C stops the process
    tokio::spawn(watch_task("Network", network_handle));
    tokio::spawn(watch_task("Hub", hub_handle));

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down gracefully...");
    if hub_tx.send(ServerMessage::Shutdown).is_err() {
        debug!("Hub already stopped");
    }

    Ok(())
}
