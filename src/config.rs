//! Configuration for tagframe
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration shared by file storage, routers, server and client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for file-backed data
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── store.tfr        (default single store file)
    ///     └── children/        (one file per super-tag for the multi-store router)
    pub data_dir: PathBuf,

    /// Whether file storage syncs to disk after every mutation
    pub sync_mode: SyncMode,

    // -------------------------------------------------------------------------
    // Router Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of child stores the multi-store router keeps open
    pub max_open_children: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Largest variable-length payload accepted on the wire (bytes)
    pub max_payload_size: u64,
}

/// File sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Leave flushing to the operating system
    Never,

    /// sync_data after every mutating call (safest, slowest)
    EveryWrite,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tagframe_data"),
            sync_mode: SyncMode::Never,
            max_open_children: 100,
            listen_addr: "127.0.0.1:7411".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            max_payload_size: 256 * 1024 * 1024, // 256 MB
        }
    }
}

impl Config {
    const STORE_FILENAME: &'static str = "store.tfr";
    const CHILDREN_DIR: &'static str = "children";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the default single store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(Self::STORE_FILENAME)
    }

    /// Directory holding the multi-store router's child files
    pub fn children_dir(&self) -> PathBuf {
        self.data_dir.join(Self::CHILDREN_DIR)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all file storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the file sync mode
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.config.sync_mode = mode;
        self
    }

    /// Set the open-child cap of the multi-store router
    pub fn max_open_children(mut self, count: usize) -> Self {
        self.config.max_open_children = count;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the maximum wire payload size (in bytes)
    pub fn max_payload_size(mut self, bytes: u64) -> Self {
        self.config.max_payload_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
