//! Transport shell: TCP/UDP listeners and the position sink.
//!
//! Each TCP connection gets its own handler thread; UDP frames are
//! handled by a single reader thread with no connection affinity. Both
//! push decoded positions into a channel drained by the sink thread,
//! which logs each record and feeds the registry's last-known-location
//! state.

mod tcp;
mod udp;

pub use tcp::TcpHandler;
pub use udp::UdpListener;

use crate::core::position::Position;
use crate::core::registry::DeviceRegistry;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Drains decoded positions from the connection handlers
pub struct PositionSink {
    rx: Receiver<Position>,
    registry: Arc<dyn DeviceRegistry>,
    running: Arc<AtomicBool>,
    emit_json: bool,
}

impl PositionSink {
    pub fn new(
        rx: Receiver<Position>,
        registry: Arc<dyn DeviceRegistry>,
        running: Arc<AtomicBool>,
        emit_json: bool,
    ) -> Self {
        Self {
            rx,
            registry,
            running,
            emit_json,
        }
    }

    /// Run the sink loop until shutdown
    pub fn run(&self) {
        log::info!("Position sink started");

        while self.running.load(Ordering::Relaxed) {
            let position = match self.rx.recv_timeout(Duration::from_millis(500)) {
                Ok(position) => position,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            log::info!(
                "Position {:?}: time={} valid={} lat={:.6} lon={:.6} speed={:.1}kn attrs={}",
                position.device_id,
                position.time,
                position.valid,
                position.latitude,
                position.longitude,
                position.speed,
                position.attributes.len()
            );

            self.registry.record_position(&position);

            if self.emit_json {
                match serde_json::to_string(&position) {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::error!("Failed to serialize position: {}", e),
                }
            }
        }

        log::info!("Position sink stopped");
    }
}
