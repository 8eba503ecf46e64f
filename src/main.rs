//! DishaGW - Protocol gateway daemon for TK103-family GPS trackers
//!
//! ## Protocol Architecture
//!
//! - **TCP**: delimiter-framed device stream, one handler thread per
//!   connection
//! - **UDP**: one datagram = one frame, single reader thread
//!
//! Both feed the same decoder; decoded positions fan into a sink thread
//! that logs them, optionally emits JSON lines, and maintains the
//! last-known-location state used by network-only reports.

use disha_gw::config::AppConfig;
use disha_gw::core::registry::{DeviceRegistry, MemoryRegistry};
use disha_gw::error::{Error, Result};
use disha_gw::protocol::{BatteryStore, ProtocolDecoder};
use disha_gw::server::{PositionSink, TcpHandler, UdpListener};
use std::env;
use std::net::{TcpListener, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `disha-gw <path>` (positional)
/// - `disha-gw --config <path>` (flag-based)
/// - `disha-gw -c <path>` (short flag)
///
/// Defaults to `/etc/disha-gw.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/disha-gw.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = match AppConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("Config {} not found, using defaults", config_path);
            AppConfig::default()
        }
        Err(e) => return Err(e),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("DishaGW v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Speed unit: {:?}, auto-register: {}",
        config.protocol.speed_unit,
        config.protocol.auto_register
    );

    let registry: Arc<dyn DeviceRegistry> =
        Arc::new(MemoryRegistry::new(config.protocol.auto_register));
    let battery = Arc::new(BatteryStore::new());
    let decoder = Arc::new(ProtocolDecoder::new(
        Arc::clone(&registry),
        battery,
        config.protocol.speed_unit,
    ));

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Position sink: fan-in point for all connection handlers
    let (sink_tx, sink_rx) = crossbeam_channel::unbounded();
    let sink_registry = Arc::clone(&registry);
    let sink_running = Arc::clone(&running);
    let emit_json = config.sink.emit_json;
    let _sink_handle = thread::Builder::new()
        .name("position-sink".to_string())
        .spawn(move || {
            PositionSink::new(sink_rx, sink_registry, sink_running, emit_json).run();
        })
        .map_err(|e| Error::Other(format!("Failed to spawn position sink: {}", e)))?;

    // UDP listener
    let udp_socket = UdpSocket::bind(&config.network.udp_bind)
        .map_err(|e| Error::Other(format!("Failed to bind UDP {}: {}", config.network.udp_bind, e)))?;
    log::info!("UDP listening on {}", config.network.udp_bind);

    let udp_decoder = Arc::clone(&decoder);
    let udp_sink = sink_tx.clone();
    let udp_running = Arc::clone(&running);
    let _udp_handle = thread::Builder::new()
        .name("udp-listener".to_string())
        .spawn(move || {
            let listener = UdpListener::new(udp_socket, udp_decoder, udp_sink, udp_running);
            if let Err(e) = listener.run() {
                log::error!("UDP listener error: {}", e);
            }
        })
        .map_err(|e| Error::Other(format!("Failed to spawn UDP listener: {}", e)))?;

    // TCP server
    let listener = TcpListener::bind(&config.network.tcp_bind)
        .map_err(|e| Error::Other(format!("Failed to bind TCP {}: {}", config.network.tcp_bind, e)))?;
    if let Err(e) = listener.set_nonblocking(true) {
        log::warn!("Failed to set nonblocking mode: {}", e);
    }

    log::info!("TCP listening on {}", config.network.tcp_bind);
    log::info!("DishaGW running. Press Ctrl-C to stop.");

    // Main loop - accept device connections
    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let conn_decoder = Arc::clone(&decoder);
                let conn_sink = sink_tx.clone();
                let conn_running = Arc::clone(&running);

                let _handle = thread::Builder::new()
                    .name("tcp-handler".to_string())
                    .spawn(move || {
                        let mut handler = TcpHandler::new(conn_decoder, conn_sink, conn_running);
                        if let Err(e) = handler.run(stream) {
                            log::error!("Handler error for {}: {}", addr, e);
                        }
                    });
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // No connection pending, sleep briefly
                thread::sleep(std::time::Duration::from_millis(10));
            }
            Err(e) => {
                log::error!("Accept error: {}", e);
            }
        }
    }

    log::info!("DishaGW stopped");
    Ok(())
}
