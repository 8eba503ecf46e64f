//! UDP frame reader.
//!
//! Connectionless side of the protocol: each datagram is one complete
//! frame, no delimiter framing involved. All datagrams share one socket
//! and one reader thread.

use crate::core::position::Position;
use crate::error::Result;
use crate::protocol::ProtocolDecoder;
use crossbeam_channel::Sender;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Largest datagram we accept; matches the TCP frame cap
const MAX_DATAGRAM_SIZE: usize = 1024;

/// Reads device datagrams from a bound socket
pub struct UdpListener {
    socket: UdpSocket,
    decoder: Arc<ProtocolDecoder>,
    sink: Sender<Position>,
    running: Arc<AtomicBool>,
}

impl UdpListener {
    pub fn new(
        socket: UdpSocket,
        decoder: Arc<ProtocolDecoder>,
        sink: Sender<Position>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            socket,
            decoder,
            sink,
            running,
        }
    }

    /// Run the reader loop until shutdown
    pub fn run(&self) -> Result<()> {
        log::info!("UDP listener started on {:?}", self.socket.local_addr());

        // Receive timeout so we can check the shutdown flag
        self.socket
            .set_read_timeout(Some(Duration::from_millis(500)))?;

        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        while self.running.load(Ordering::Relaxed) {
            let (n, remote) = match self.socket.recv_from(&mut buffer) {
                Ok(received) => received,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => {
                    // A failed receive does not kill the listener; the
                    // next datagram may be fine
                    log::error!("UDP receive error: {}", e);
                    continue;
                }
            };

            let frame = String::from_utf8_lossy(&buffer[..n]);
            log::debug!("Datagram from {}: {}", remote, frame);
            if let Some(position) = self.decoder.decode(&frame, remote)
                && self.sink.send(position).is_err()
            {
                log::warn!("Position sink is gone, stopping UDP listener");
                return Ok(());
            }
        }

        log::info!("UDP listener stopped");
        Ok(())
    }
}
