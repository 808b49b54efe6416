//! Storage abstraction for index files.
//!
//! An index lives in one flat namespace of named files. Two backends are
//! provided: [`file::FileStorage`] (a directory on disk) and
//! [`memory::MemoryStorage`] (process memory, for tests and ephemeral
//! indexes). Both also provide the advisory lock used to keep a single
//! writer per index.

pub mod file;
pub mod memory;
pub mod structured;

use std::fmt::Debug;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;

use self::file::{FileStorage, FileStorageConfig};
use self::memory::{MemoryStorage, MemoryStorageConfig};

/// A readable file.
pub trait StorageInput: Read + Send + Debug {
    /// Total size of the file in bytes.
    fn size(&self) -> Result<u64>;
}

/// A writable file. Data is only guaranteed to be visible and durable after
/// `close()`.
pub trait StorageOutput: Write + Send + Debug {
    /// Flush buffers and ask the backend to persist the data.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Flush, persist and publish the file.
    fn close(&mut self) -> Result<()>;
}

impl<T: StorageInput + ?Sized> StorageInput for Box<T> {
    fn size(&self) -> Result<u64> {
        (**self).size()
    }
}

impl<T: StorageOutput + ?Sized> StorageOutput for Box<T> {
    fn flush_and_sync(&mut self) -> Result<()> {
        (**self).flush_and_sync()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A flat namespace of files.
pub trait Storage: Send + Sync + Debug {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    fn file_exists(&self, name: &str) -> bool;

    fn delete_file(&self, name: &str) -> Result<()>;

    fn list_files(&self) -> Result<Vec<String>>;

    /// Atomically replace `to` with `from`.
    fn rename_file(&self, from: &str, to: &str) -> Result<()>;

    /// Take the named advisory lock, failing with `LockContention` if it is
    /// already held. The lock is released when the returned guard drops.
    fn obtain_lock(&self, name: &str) -> Result<StorageLock>;

    /// Persist directory-level changes (creations, renames, deletions).
    fn sync(&self) -> Result<()>;

    /// Read a whole file into memory.
    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let mut input = self.open_input(name)?;
        let mut data = Vec::with_capacity(input.size()? as usize);
        input.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Write a whole file and close it.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut output = self.create_output(name)?;
        output.write_all(data)?;
        output.close()
    }
}

/// Guard for a lock obtained with [`Storage::obtain_lock`].
pub struct StorageLock {
    name: String,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl StorageLock {
    pub fn new(name: impl Into<String>, release: Box<dyn FnOnce() + Send + Sync>) -> Self {
        StorageLock {
            name: name.into(),
            release: Some(release),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release the lock now instead of on drop.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Debug for StorageLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageLock")
            .field("name", &self.name)
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// Storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File(FileStorageConfig),
    Memory(MemoryStorageConfig),
}

/// Creates storage backends from a [`StorageConfig`].
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::new(config)?)),
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
        }
    }
}
