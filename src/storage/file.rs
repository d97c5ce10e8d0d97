//! File-backed storage
//!
//! Operations map to positioned reads and writes on one exclusively owned
//! file. Shrinking truncates the file, growing extends it. The file content is
//! exactly the codec's byte stream: no header, no footer.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::SyncMode;
use crate::error::Result;

use super::{check_range, Storage};

/// Block size used when shifting a tail during delete and insert
const SHIFT_BLOCK_SIZE: u64 = 64 * 1024;

/// Storage backed by a single file
///
/// ## Concurrency:
/// - `file`: Mutex so reads can seek through `&self`
/// - `size`: cached, only changed by `&mut self` mutations
pub struct FileStorage {
    /// Path to the file (for logging)
    path: PathBuf,

    /// File handle, `None` once closed
    file: Mutex<Option<File>>,

    /// Cached file length
    size: u64,

    /// Whether to sync after each mutation
    sync_mode: SyncMode,
}

impl FileStorage {
    /// Open or create a file, keeping any existing content
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, SyncMode::Never)
    }

    /// Open or create a file with an explicit sync mode
    pub fn open_with(path: impl AsRef<Path>, sync_mode: SyncMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        let size = file.metadata()?.len();

        tracing::debug!("Opened file storage {} ({} bytes)", path.display(), size);

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
            size,
            sync_mode,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the open file handle
    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> std::io::Result<T>) -> Result<T> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                format!("file storage {} is closed", self.path.display()),
            )
        })?;
        Ok(f(file)?)
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.with_file(|file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(bytes)
        })
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.with_file(|file| {
            let mut buf = vec![0u8; len];
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)?;
            Ok(buf)
        })
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.with_file(|file| file.set_len(len))?;
        self.size = len;
        Ok(())
    }

    fn after_write(&self) -> Result<()> {
        if self.sync_mode == SyncMode::EveryWrite {
            self.sync()?;
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn slice(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.size)?;
        if start == end {
            return Ok(Vec::new());
        }
        self.read_at(start, (end - start) as usize)
    }

    fn set_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_len(0)?;
        self.write_at(0, bytes)?;
        self.size = bytes.len() as u64;
        self.after_write()
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_at(self.size, bytes)?;
        self.size += bytes.len() as u64;
        self.after_write()
    }

    fn set(&mut self, start: u64, bytes: &[u8]) -> Result<()> {
        check_range(start, start, self.size)?;
        self.write_at(start, bytes)?;
        self.size = self.size.max(start + bytes.len() as u64);
        self.after_write()
    }

    fn delete(&mut self, start: u64, end: u64) -> Result<()> {
        check_range(start, end, self.size)?;
        let gap = end - start;
        if gap == 0 {
            return Ok(());
        }

        // Move the tail left block by block, front to back
        let mut read_pos = end;
        while read_pos < self.size {
            let block = SHIFT_BLOCK_SIZE.min(self.size - read_pos);
            let bytes = self.read_at(read_pos, block as usize)?;
            self.write_at(read_pos - gap, &bytes)?;
            read_pos += block;
        }

        let new_size = self.size - gap;
        self.set_len(new_size)?;
        self.after_write()
    }

    fn insert(&mut self, at: u64, bytes: &[u8]) -> Result<()> {
        check_range(at, at, self.size)?;
        let gap = bytes.len() as u64;
        if gap == 0 {
            return Ok(());
        }

        // Move the tail right block by block, back to front
        let mut block_end = self.size;
        while block_end > at {
            let block = SHIFT_BLOCK_SIZE.min(block_end - at);
            let block_start = block_end - block;
            let moved = self.read_at(block_start, block as usize)?;
            self.write_at(block_start + gap, &moved)?;
            block_end = block_start;
        }

        self.write_at(at, bytes)?;
        self.size += gap;
        self.after_write()
    }

    fn sync(&self) -> Result<()> {
        self.with_file(|file| file.sync_data())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.lock().take() {
            file.sync_data()?;
            tracing::debug!("Closed file storage {}", self.path.display());
        }
        Ok(())
    }
}
