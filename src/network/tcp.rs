//! TCP Transport
//!
//! Blocking connection to a tracker server.

use std::io::{self, BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use super::framing::{write_frame, FrameReader};
use super::transport::Transport;
use crate::config::Config;
use crate::error::{EyeTribeError, Result};
use crate::protocol::{decode_frame, encode_heartbeat, frame_matches, response_from_frame, Response};

type SharedWriter = Arc<Mutex<BufWriter<TcpStream>>>;

/// TCP implementation of [`Transport`]
///
/// A reader thread splits the socket into frames and queues them on a
/// channel; `read_blocking_match` drains that channel. When a heartbeat
/// interval is configured, a second thread keeps the session alive.
///
/// A reply timeout, an unreadable frame or a lost socket tears the
/// connection down. Until the next `connect`, every call fails with
/// `Connection`, so a late reply can never be taken as the answer to a
/// later call.
pub struct TcpTransport {
    config: Config,

    /// Live connection, if any
    connection: Option<ActiveConnection>,

    /// Why the last connection was dropped, if it failed
    failure: Option<String>,
}

/// Everything owned by one open socket
struct ActiveConnection {
    /// Handle used to shut the socket down on close
    stream: TcpStream,

    /// Socket writer, shared with the heartbeat thread
    writer: SharedWriter,

    /// Frames decoded by the reader thread
    frames: Receiver<Result<Bytes>>,

    /// Dropping this stops the heartbeat thread
    stop_heartbeat: Option<Sender<()>>,

    reader: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpTransport {
    /// Create a disconnected transport
    pub fn new(config: Config) -> Self {
        Self {
            config,
            connection: None,
            failure: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Address of the connected server
    pub fn peer_addr(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.peer_addr.as_str())
    }

    fn active(&mut self) -> Result<&mut ActiveConnection> {
        if let Some(reason) = &self.failure {
            return Err(EyeTribeError::Connection(io::Error::new(
                ErrorKind::NotConnected,
                reason.clone(),
            )));
        }
        self.connection.as_mut().ok_or(EyeTribeError::NotConnected)
    }

    /// Drop the connection after `error` and remember why
    fn fail(&mut self, error: &EyeTribeError) {
        if let Some(conn) = &self.connection {
            tracing::warn!("Dropping connection to {}: {}", conn.peer_addr, error);
        }
        self.teardown();
        self.failure = Some(format!("connection dropped: {}", error));
    }

    /// Stop both threads and shut the socket
    fn teardown(&mut self) {
        let Some(mut conn) = self.connection.take() else {
            return;
        };

        // Disconnects the heartbeat thread's stop channel
        drop(conn.stop_heartbeat.take());
        if let Some(handle) = conn.heartbeat.take() {
            let _ = handle.join();
        }

        // Unblocks the reader thread
        if let Err(e) = conn.stream.shutdown(Shutdown::Both) {
            tracing::debug!("Shutdown of {} failed: {}", conn.peer_addr, e);
        }
        if let Some(handle) = conn.reader.take() {
            let _ = handle.join();
        }

        tracing::info!("Closed connection to {}", conn.peer_addr);
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: &str) -> Result<()> {
        if self.connection.is_some() {
            tracing::debug!("Replacing existing connection before connecting to {}:{}", host, port);
            self.teardown();
        }
        self.failure = None;

        let port_number: u16 = port.parse().map_err(|_| {
            EyeTribeError::Connection(io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid port '{}'", port),
            ))
        })?;

        let stream = TcpStream::connect((host, port_number))?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| format!("{}:{}", host, port));

        // Requests are tiny and latency bound
        stream.set_nodelay(true)?;
        stream.set_write_timeout(self.config.write_timeout())?;

        let read_stream = stream.try_clone()?;
        let writer: SharedWriter = Arc::new(Mutex::new(BufWriter::new(stream.try_clone()?)));

        let (frame_tx, frame_rx) = channel::unbounded();
        let frames = FrameReader::new(read_stream, self.config.max_frame_size);
        let reader_peer = peer_addr.clone();
        let reader = thread::Builder::new()
            .name("eyetribe-reader".to_string())
            .spawn(move || reader_loop(frames, frame_tx, reader_peer))?;

        let (stop_heartbeat, heartbeat) = match self.config.heartbeat_interval() {
            Some(interval) => {
                let (stop_tx, stop_rx) = channel::bounded::<()>(0);
                let heartbeat_writer = Arc::clone(&writer);
                let handle = thread::Builder::new()
                    .name("eyetribe-heartbeat".to_string())
                    .spawn(move || heartbeat_loop(heartbeat_writer, stop_rx, interval))?;
                (Some(stop_tx), Some(handle))
            }
            None => (None, None),
        };

        tracing::info!("Connected to tracker server at {}", peer_addr);

        self.connection = Some(ActiveConnection {
            stream,
            writer,
            frames: frame_rx,
            stop_heartbeat,
            reader: Some(reader),
            heartbeat,
            peer_addr,
        });

        Ok(())
    }

    fn send_bytes(&mut self, payload: &[u8]) -> Result<()> {
        let conn = self.active()?;
        let result = write_frame(&mut *conn.writer.lock(), payload);

        match result {
            Ok(()) => {
                tracing::trace!("Sent {} bytes to {}", payload.len(), conn.peer_addr);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn read_blocking_match(&mut self, field: &str, value: &str) -> Result<Response> {
        let timeout_ms = self.config.match_timeout_ms;
        let deadline = self.config.match_timeout().map(|t| Instant::now() + t);
        let conn = self.active()?;

        match wait_for_match(conn, field, value, deadline, timeout_ms) {
            Wait::Matched(result) => result,
            Wait::Broken(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.teardown();
        self.failure = None;
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Outcome of waiting on the frame channel
enum Wait {
    /// A frame with the key arrived; its reply is consumed either way
    Matched(Result<Response>),

    /// The reply may still be in flight, or the socket is gone
    Broken(EyeTribeError),
}

/// Drain frames until one has `field == value`
fn wait_for_match(
    conn: &mut ActiveConnection,
    field: &str,
    value: &str,
    deadline: Option<Instant>,
    timeout_ms: u64,
) -> Wait {
    loop {
        let next = match deadline {
            Some(deadline) => match conn.frames.recv_deadline(deadline) {
                Ok(next) => next,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        "No frame with {}={} from {} within {} ms",
                        field, value, conn.peer_addr, timeout_ms
                    );
                    return Wait::Broken(EyeTribeError::Timeout(timeout_ms));
                }
                Err(RecvTimeoutError::Disconnected) => return Wait::Broken(connection_closed()),
            },
            None => match conn.frames.recv() {
                Ok(next) => next,
                Err(_) => return Wait::Broken(connection_closed()),
            },
        };

        // An unreadable frame could have been the reply
        let bytes = match next {
            Ok(bytes) => bytes,
            Err(e) => return Wait::Broken(e),
        };
        let frame = match decode_frame(&bytes) {
            Ok(frame) => frame,
            Err(e) => return Wait::Broken(e),
        };

        if frame_matches(&frame, field, value) {
            return Wait::Matched(response_from_frame(frame));
        }

        tracing::trace!(
            "Discarding frame while waiting for {}={}: {}",
            field,
            value,
            String::from_utf8_lossy(&bytes)
        );
    }
}

fn connection_closed() -> EyeTribeError {
    EyeTribeError::Connection(io::Error::new(
        ErrorKind::UnexpectedEof,
        "connection closed by server",
    ))
}

/// Forward frames until the socket closes or the receiver goes away
fn reader_loop(mut frames: FrameReader<TcpStream>, tx: Sender<Result<Bytes>>, peer_addr: String) {
    loop {
        match frames.read_frame() {
            Ok(Some(frame)) => {
                if tx.send(Ok(frame)).is_err() {
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!("Server {} closed the connection", peer_addr);
                let _ = tx.send(Err(connection_closed()));
                return;
            }
            Err(e) => {
                tracing::debug!("Reader for {} stopped: {}", peer_addr, e);
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

/// Write a heartbeat every `interval` until `stop` disconnects
fn heartbeat_loop(writer: SharedWriter, stop: Receiver<()>, interval: Duration) {
    let message = encode_heartbeat();

    while let Err(RecvTimeoutError::Timeout) = stop.recv_timeout(interval) {
        let mut guard = writer.lock();
        if let Err(e) = write_frame(&mut *guard, &message) {
            tracing::warn!("Heartbeat failed: {}", e);
            return;
        }
        tracing::trace!("Heartbeat sent");
    }
}
