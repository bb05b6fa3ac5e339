//! CMCast media server: catalogs local media folders and casts them to
//! networked receivers, with playlist advancement driven by status events.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cmcatalog::{scan_game_systems, scan_media_folders, GameCatalog};
use cmcontrol::{spawn_status_worker, status_channel, ChromecastClient, PlaybackOrchestrator};
use cmserver::{guess_local_ip, AppState, DiscoveryServer};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const SERVICE_NAME: &str = "cmcast";

/// Grace period for in-flight worker threads after the listeners stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn print_help() {
    println!("CMCast media server. Shares local media and casts it to receivers.");
    println!();
    println!("Usage: cmcast -c <configuration file>");
    println!();
    println!("  -c, --configuration  Path to the YAML configuration file.");
    println!("  -h, --help           Print this help message.");
    println!("  -v, --version        Print the version and exit.");
}

/// Returns the configuration path, or `None` when the process should exit
/// (help/version or a usage error).
fn parse_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return None;
            }
            "-v" | "--version" => {
                println!("CMCast version: {}", env!("CARGO_PKG_VERSION"));
                return None;
            }
            "-c" | "--configuration" => {
                config_path = args.next().map(PathBuf::from);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                return None;
            }
        }
    }

    if config_path.is_none() {
        eprintln!("No configuration file provided in command line arguments.");
        print_help();
    }
    config_path
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(config_path) = parse_args() else {
        return ExitCode::FAILURE;
    };

    match run(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(config_path: &std::path::Path) -> Result<()> {
    let config = Config::load(config_path)?;

    // The catalogs are built once and immutable afterwards.
    let catalog = Arc::new(scan_media_folders(&config.folders));
    let games = Arc::new(match &config.games_dir {
        Some(root) => GameCatalog::from_systems(&scan_game_systems(root)),
        None => GameCatalog::default(),
    });
    info!(media = catalog.len(), games = games.len(), "catalogs ready");

    let media_base_url = config
        .media_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", guess_local_ip(), config.http_port));

    let (status_tx, status_rx) = status_channel();
    let client = Arc::new(ChromecastClient::new(media_base_url, status_tx));
    let orchestrator = Arc::new(PlaybackOrchestrator::new(client));
    let status_worker = spawn_status_worker(orchestrator.clone(), status_rx);

    let mut discovery = DiscoveryServer::start(SERVICE_NAME, config.discovery_port, config.http_port)?;

    let state = AppState {
        catalog,
        games,
        orchestrator,
    };
    let router = cmserver::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!(port = config.http_port, "RPC facade listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal::ctrl_c().await.expect("failed to listen for ctrl_c");
            info!("shutdown signal received");
            // Discovery stops before the RPC listener closes, so no client
            // learns the address of a server that is already going away.
            discovery.stop();
        })
        .await?;

    info!(grace = ?SHUTDOWN_GRACE, "waiting for in-flight workers");
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    // The status worker thread holds only the receiving side; the casting
    // client keeps a sender alive, so the thread exits with the process.
    drop(status_worker);

    Ok(())
}
