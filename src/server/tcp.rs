//! TCP connection handler.
//!
//! One handler per connected device. The byte stream is delimiter-framed
//! by [`FrameSplitter`]; each completed frame goes through the shared
//! decoder and any resulting position is pushed to the sink channel.
//!
//! A 500 ms read timeout keeps the loop responsive to the shutdown flag.
//! I/O errors terminate this connection only; malformed frames are the
//! decoder's business and never surface here.

use crate::core::position::Position;
use crate::error::{Error, Result};
use crate::protocol::{FrameSplitter, ProtocolDecoder};
use crossbeam_channel::Sender;
use std::io::Read;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Read buffer size; frames are at most 1024 bytes
const READ_BUFFER_SIZE: usize = 512;

/// Handles a single device connection
pub struct TcpHandler {
    decoder: Arc<ProtocolDecoder>,
    sink: Sender<Position>,
    running: Arc<AtomicBool>,
    splitter: FrameSplitter,
}

impl TcpHandler {
    pub fn new(
        decoder: Arc<ProtocolDecoder>,
        sink: Sender<Position>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            decoder,
            sink,
            running,
            splitter: FrameSplitter::new(),
        }
    }

    /// Run the receive loop for a connected device
    pub fn run(&mut self, mut stream: TcpStream) -> Result<()> {
        let remote = stream.peer_addr()?;
        log::info!("Device connected: {}", remote);

        // Read timeout so we can check the shutdown flag
        if let Err(e) = stream.set_read_timeout(Some(Duration::from_millis(500))) {
            log::warn!("Failed to set read timeout: {}", e);
        }

        let mut buffer = [0u8; READ_BUFFER_SIZE];

        while self.running.load(Ordering::Relaxed) {
            let n = match stream.read(&mut buffer) {
                Ok(0) => {
                    log::info!("Device disconnected: {}", remote);
                    return Ok(());
                }
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e)
                    if e.kind() == std::io::ErrorKind::UnexpectedEof
                        || e.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    log::info!("Device disconnected: {}", remote);
                    return Ok(());
                }
                Err(e) => {
                    log::error!("Read error from {}: {}", remote, e);
                    return Err(Error::Io(e));
                }
            };

            for frame in self.splitter.push(&buffer[..n]) {
                log::debug!("Frame from {}: {}", remote, frame);
                if let Some(position) = self.decoder.decode(&frame, remote)
                    && self.sink.send(position).is_err()
                {
                    log::warn!("Position sink is gone, closing connection {}", remote);
                    return Ok(());
                }
            }
        }

        log::info!("Handler for {} stopped", remote);
        Ok(())
    }
}
