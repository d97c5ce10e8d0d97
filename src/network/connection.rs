//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::{Result, TagFrameError};
use crate::protocol::{read_handshake, read_u8, write_reply, HandlerKind, Reply};

use super::handlers::{handler_table, HandlerTable, Session};
use super::SharedStorage;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Storage shared with every other connection
    storage: SharedStorage,

    /// Largest payload accepted from this client
    max_payload: u64,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, storage: SharedStorage, max_payload: u64) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            storage,
            max_payload,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads the handshake, then `(kind, cause)` pairs in a loop, dispatching
    /// each to its handler. Returns when the client disconnects or the
    /// transport fails.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let kind = match read_handshake(&mut self.reader) {
            Ok(kind) => kind,
            Err(e) => {
                if self.is_disconnect(&e) {
                    return Ok(());
                }
                tracing::warn!("Bad handshake from {}: {}", self.peer_addr, e);
                let _ = self.send_reply(&Reply::error(e.to_string()));
                return Err(e);
            }
        };
        self.send_reply(&Reply::Done)?;
        tracing::debug!("Client {} opened a {:?} session", self.peer_addr, kind);

        let table = handler_table(kind);
        let mut session = Session::new(kind, self.storage.clone(), self.max_payload);

        loop {
            // Read next (kind, cause) pair
            let pair = match self.read_pair() {
                Ok(pair) => pair,
                Err(e) if self.is_disconnect(&e) => return Ok(()),
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!(
                "Received request {:02x}/{:02x} from {}",
                pair.0,
                pair.1,
                self.peer_addr
            );

            let reply = match self.dispatch(&table, &mut session, pair) {
                Ok(reply) => reply,
                Err(e) => {
                    // The rest of the request cannot be skipped, so the
                    // stream is out of step from here on
                    tracing::warn!("Closing {} after bad request: {}", self.peer_addr, e);
                    let _ = self.send_reply(&Reply::error(e.to_string()));
                    return Err(e);
                }
            };

            // Send reply
            if let Err(e) = self.send_reply(&reply) {
                // If the client disconnected before we could send the reply,
                // log and exit gracefully rather than treating it as a server
                // error.
                if let TagFrameError::Io(ref io_err) = e {
                    match io_err.kind() {
                        ErrorKind::ConnectionAborted
                        | ErrorKind::ConnectionReset
                        | ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before reply could be sent: {}",
                                self.peer_addr,
                                e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn read_pair(&mut self) -> Result<(u8, u8)> {
        let kind = read_u8(&mut self.reader)?;
        let cause = read_u8(&mut self.reader)?;
        Ok((kind, cause))
    }

    /// Run the handler registered for `pair`
    fn dispatch(
        &mut self,
        table: &HandlerTable,
        session: &mut Session,
        pair: (u8, u8),
    ) -> Result<Reply> {
        match table.get(&pair) {
            Some(handler) => handler(session, &mut self.reader),
            None if pair.0 == HandlerKind::Storage as u8 && session.kind == HandlerKind::Control => {
                Err(TagFrameError::Protocol(
                    "Storage request on a control session".to_string(),
                ))
            }
            None => Err(TagFrameError::Protocol(format!(
                "Unknown request {:02x}/{:02x}",
                pair.0, pair.1
            ))),
        }
    }

    /// Whether `e` means the client went away (or timed out) rather than a
    /// server-side failure
    fn is_disconnect(&self, e: &TagFrameError) -> bool {
        let TagFrameError::Io(io_err) = e else {
            return false;
        };
        match io_err.kind() {
            // Client disconnected gracefully
            ErrorKind::UnexpectedEof => {
                tracing::debug!("Client {} disconnected", self.peer_addr);
                true
            }
            ErrorKind::ConnectionReset => {
                tracing::debug!("Connection reset by client {}", self.peer_addr);
                true
            }
            ErrorKind::ConnectionAborted => {
                tracing::debug!("Connection aborted by client {}", self.peer_addr);
                true
            }
            // Read timeout (Windows uses TimedOut instead of WouldBlock)
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                tracing::debug!("Read timeout for client {}", self.peer_addr);
                true
            }
            _ => false,
        }
    }

    /// Send a reply to the client
    fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        write_reply(&mut self.writer, reply)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
