//! Remote storage client
//!
//! A [`Storage`] whose every call is one blocking round trip to a server.
//! The connection sits behind a Mutex, so calls from several threads are
//! serialised and there is never more than one request in flight.
//!
//! A failed round trip (I/O error, timeout, malformed reply) closes the
//! connection and every later call fails with `NotConnected`. An error status
//! from the server is an ordinary reply and the session stays usable.
//!
//! `insert` uses the trait default (slice the tail, then `set`). Those are two
//! requests, so another client may change the storage in between.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, TagFrameError};
use crate::protocol::{read_reply, write_handshake, write_request, HandlerKind, Reply, ReplyShape, Request};
use crate::storage::Storage;

struct Channel {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// Storage proxy speaking the wire protocol
pub struct RemoteStorage {
    channel: Mutex<Option<Channel>>,
    peer_addr: String,
    max_payload: u64,
}

impl RemoteStorage {
    /// Connect and open a storage session
    pub fn connect<A: ToSocketAddrs>(addr: A, config: &Config) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let mut channel = Channel {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        };

        write_handshake(&mut channel.writer, HandlerKind::Storage)?;
        if let Reply::Error(message) =
            read_reply(&mut channel.reader, ReplyShape::Done, config.max_payload_size)?
        {
            return Err(TagFrameError::Remote(message));
        }
        tracing::debug!("Connected to storage server {}", peer_addr);

        Ok(Self {
            channel: Mutex::new(Some(channel)),
            peer_addr,
            max_payload: config.max_payload_size,
        })
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Round-trip a control ping
    pub fn ping(&self) -> Result<()> {
        self.call(&Request::Ping).map(|_| ())
    }

    /// Send one request and wait for its reply
    fn call(&self, request: &Request) -> Result<Reply> {
        let mut guard = self.channel.lock();
        let channel = guard.as_mut().ok_or_else(|| {
            TagFrameError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "remote storage is closed",
            ))
        })?;

        let outcome = write_request(&mut channel.writer, request)
            .and_then(|_| read_reply(&mut channel.reader, request.reply_shape(), self.max_payload));

        match outcome {
            Ok(Reply::Error(message)) => Err(TagFrameError::Remote(message)),
            Ok(reply) => Ok(reply),
            Err(e) => {
                // Whatever is left of the reply is still in the socket, so the
                // next call would read it as its own. Drop the connection.
                tracing::warn!("Dropping connection to {}: {}", self.peer_addr, e);
                let _ = channel.writer.get_ref().shutdown(Shutdown::Both);
                *guard = None;
                Err(e)
            }
        }
    }

    fn call_bytes(&self, request: &Request) -> Result<Vec<u8>> {
        match self.call(request)? {
            Reply::Bytes(data) => Ok(data),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(reply: Reply) -> TagFrameError {
    TagFrameError::Protocol(format!("Unexpected reply: {:?}", reply))
}

impl Storage for RemoteStorage {
    fn size(&self) -> Result<u64> {
        match self.call(&Request::GetSize)? {
            Reply::Size(size) => Ok(size),
            other => Err(unexpected(other)),
        }
    }

    fn slice(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        self.call_bytes(&Request::SubArray { start, end })
    }

    fn get_all(&self) -> Result<Vec<u8>> {
        self.call_bytes(&Request::GetContent)
    }

    fn set_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.call(&Request::SetContent {
            data: bytes.to_vec(),
        })
        .map(|_| ())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.call(&Request::Append {
            data: bytes.to_vec(),
        })
        .map(|_| ())
    }

    fn set(&mut self, start: u64, bytes: &[u8]) -> Result<()> {
        self.call(&Request::Set {
            start,
            data: bytes.to_vec(),
        })
        .map(|_| ())
    }

    fn delete(&mut self, start: u64, end: u64) -> Result<()> {
        self.call(&Request::DeleteRange { start, end }).map(|_| ())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.lock().take() {
            tracing::debug!("Closing connection to {}", self.peer_addr);
            // The server may already have dropped its end
            match channel.writer.get_ref().shutdown(Shutdown::Both) {
                Err(e) if e.kind() != std::io::ErrorKind::NotConnected => return Err(e.into()),
                _ => {}
            }
        }
        Ok(())
    }
}

impl Drop for RemoteStorage {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
