//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.
//!
//! ## Lifecycle
//! ```text
//! bind() ──► run() ──► accept loop (non-blocking, polls shutdown flag)
//!                        │
//!                        ├─► worker thread per connection (≤ max_connections)
//!                        │
//! shutdown() ──► flag ───┴─► close live sockets ──► WaitGroup::wait ──► sync
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, TagFrameError};
use crate::storage::Storage;

use super::Connection;

/// Storage shared by every connection of one server
pub type SharedStorage = Arc<Mutex<Box<dyn Storage>>>;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stops a running server from another thread
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting and close its connections
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server exposing one storage
pub struct Server {
    config: Config,
    storage: SharedStorage,
    listener: Option<TcpListener>,
    shutdown: ShutdownHandle,

    /// Live client sockets, so shutdown can unblock their workers
    live: Arc<Mutex<HashMap<u64, TcpStream>>>,
    next_id: AtomicU64,
}

impl Server {
    /// Create a new server with the given config and storage
    pub fn new(config: Config, storage: Box<dyn Storage>) -> Self {
        Self {
            config,
            storage: Arc::new(Mutex::new(storage)),
            listener: None,
            shutdown: ShutdownHandle::default(),
            live: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Bind the listener to `config.listen_addr` and return the actual address
    /// (useful with port 0)
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        tracing::info!("Listening on {}", addr);
        Ok(addr)
    }

    /// Address the listener is bound to, if bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Handle that stops this server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// The storage this server exposes
    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| TagFrameError::Config("Server is not bound".to_string()))?;

        let workers = WaitGroup::new();

        while !self.shutdown.is_shutdown() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if self.live.lock().len() >= self.config.max_connections {
                        tracing::warn!(
                            "Rejecting {}: {} connections already open",
                            peer,
                            self.config.max_connections
                        );
                        let _ = stream.shutdown(Shutdown::Both);
                        continue;
                    }
                    if let Err(e) = self.spawn_worker(stream, workers.clone()) {
                        tracing::warn!("Failed to start worker for {}: {}", peer, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, closing {} connections", self.live.lock().len());
        drop(listener);
        for stream in self.live.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        workers.wait();

        self.storage.lock().sync()?;
        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_worker(&self, stream: TcpStream, worker: WaitGroup) -> Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live.lock().insert(id, stream.try_clone()?);

        let mut connection = Connection::new(
            stream,
            Arc::clone(&self.storage),
            self.config.max_payload_size,
        )?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;

        let live = Arc::clone(&self.live);
        let spawned = thread::Builder::new()
            .name(format!("tagframe-conn-{}", id))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
                }
                live.lock().remove(&id);
                drop(worker);
            });

        if let Err(e) = spawned {
            self.live.lock().remove(&id);
            return Err(e.into());
        }
        Ok(())
    }
}
