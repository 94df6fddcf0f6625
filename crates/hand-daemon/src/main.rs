//! Hand bridge daemon entry point.
//!
//! Headless stand-in for the presentation layer: brings a transport up,
//! loads the joint topology, re-asserts joint outputs, and polls inputs on a
//! fixed interval until signaled to stop. SIGHUP reloads the topology
//! document.

mod signals;

use anyhow::{bail, Context, Result};
use clap::Parser;
use hand_common::config::{BridgeConfig, HandConfig, TransportMode};
use hand_fieldbus::{SimulatedTransport, Transport};
use hand_model::HandModel;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::signals::SignalHandler;

/// Hand bridge command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "hand-daemon",
    about = "Dexterous-hand EtherCAT bridge daemon",
    version,
    long_about = None
)]
struct Args {
    /// Path to a bridge configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a joint topology document (JSON, overrides config file).
    #[arg(long, short = 'j', value_name = "FILE")]
    joints: Option<PathBuf>,

    /// Run against the simulated loopback transport (no hardware).
    #[arg(long, short = 's')]
    simulated: bool,

    /// Adapter name to auto-connect (overrides config file).
    #[arg(long, short = 'a', value_name = "NAME")]
    adapter: Option<String>,

    /// Maximum polling cycles to run (0 = until signaled).
    #[arg(long, default_value = "0")]
    max_cycles: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting hand bridge");

    let mut config = load_config(&args)?;

    // Override with command-line arguments
    if args.simulated {
        config.mode = TransportMode::Simulated;
    }
    if let Some(adapter) = &args.adapter {
        config.adapter = Some(adapter.clone());
    }
    if let Some(joints) = &args.joints {
        config.joints = Some(joints.clone());
    }

    info!(?config.mode, ?config.poll_interval, "Configuration loaded");

    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    run_bridge(&config, &signal_handler, args.max_cycles)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "hand_daemon={},hand_model={},hand_fieldbus={},hand_common={}",
        level, level, level, level
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `HAND_CONFIG_PATH` environment variable
/// 3. `/etc/dexhand/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<BridgeConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return BridgeConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("HAND_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from HAND_CONFIG_PATH");
            return BridgeConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from HAND_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "HAND_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    let system_path = PathBuf::from("/etc/dexhand/config.toml");
    if system_path.exists() {
        info!(?system_path, "Loading config from system path");
        return BridgeConfig::from_file(&system_path)
            .with_context(|| format!("Failed to load config from {system_path:?}"));
    }

    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return BridgeConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    info!("No config file found, using built-in defaults");
    Ok(BridgeConfig::default())
}

/// Construct the transport variant selected by the configuration.
fn create_transport(config: &BridgeConfig) -> Result<Box<dyn Transport>> {
    match config.mode {
        TransportMode::Simulated => Ok(Box::new(SimulatedTransport::new())),
        TransportMode::Real => create_real_transport(config),
    }
}

#[cfg(all(feature = "soem", target_os = "linux"))]
fn create_real_transport(config: &BridgeConfig) -> Result<Box<dyn Transport>> {
    let port = hand_fieldbus::SoemPort::new(config.receive_timeout);
    Ok(Box::new(hand_fieldbus::RealTransport::new(Box::new(port))))
}

#[cfg(not(all(feature = "soem", target_os = "linux")))]
fn create_real_transport(_config: &BridgeConfig) -> Result<Box<dyn Transport>> {
    bail!("built without EtherCAT hardware support (enable the `soem` feature on Linux)")
}

/// Load the joint topology document and push it into the model.
fn load_topology(model: &mut HandModel, path: &std::path::Path) -> Result<()> {
    let topology =
        HandConfig::from_file(path).with_context(|| format!("Failed to load joints from {path:?}"))?;
    model.load_from_config(&topology.joints);
    Ok(())
}

/// Main bridge loop: poll inputs until signaled or the cycle limit is hit.
fn run_bridge(config: &BridgeConfig, signal_handler: &SignalHandler, max_cycles: u64) -> Result<()> {
    let mut transport = create_transport(config)?;

    let adapter = match config.adapter.clone() {
        Some(name) => name,
        None => {
            let adapters = transport.list_adapters();
            if adapters.is_empty() {
                bail!("no fieldbus adapters available");
            }
            for adapter in &adapters {
                info!(name = %adapter.name, description = %adapter.description, "Adapter");
            }
            adapters[0].name.clone()
        }
    };

    transport
        .start(&adapter)
        .with_context(|| format!("Failed to start on adapter {adapter}"))?;
    info!(adapter, state = %transport.state(), "Transport started");

    let mut model = HandModel::new();
    match &config.joints {
        Some(path) => {
            load_topology(&mut model, path)?;
            model.write_to_master(transport.as_mut());
        }
        None => warn!("No joint topology loaded; bridge is idle until one is provided"),
    }

    let mut cycles = 0u64;
    while !signal_handler.shutdown_requested() {
        if signal_handler.take_reload_request() {
            match &config.joints {
                Some(path) => match load_topology(&mut model, path) {
                    Ok(()) => model.write_to_master(transport.as_mut()),
                    Err(e) => warn!(error = %e, "Topology reload failed; keeping previous joints"),
                },
                None => warn!("Reload requested but no topology path is configured"),
            }
        }

        model.update_from_master(transport.as_ref());
        for joint in model.joints() {
            debug!(
                name = %joint.name,
                value = joint.value(),
                display = joint.display_value(),
                unit = %joint.unit,
                "Joint input"
            );
        }

        cycles += 1;
        if max_cycles > 0 && cycles >= max_cycles {
            info!(cycles, "Cycle limit reached");
            break;
        }
        std::thread::sleep(config.poll_interval);
    }

    transport.stop().context("Failed to stop transport")?;
    info!("Transport stopped");
    Ok(())
}
