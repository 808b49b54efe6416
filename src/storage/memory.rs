//! In-memory storage.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use ahash::AHashSet;
use parking_lot::{Mutex, RwLock};

use crate::error::{LucerneError, Result};
use crate::storage::{Storage, StorageInput, StorageLock, StorageOutput};

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {
    /// Initial capacity of the file table.
    pub initial_capacity: usize,
}

type FileTable = Arc<RwLock<HashMap<String, Arc<[u8]>>>>;

/// Storage that keeps every file in process memory. Cloning shares the files.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: FileTable,
    locks: Arc<Mutex<AHashSet<String>>>,
}

impl MemoryStorage {
    pub fn new(config: MemoryStorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(RwLock::new(HashMap::with_capacity(config.initial_capacity))),
            locks: Arc::new(Mutex::new(AHashSet::new())),
        }
    }

    fn not_found(name: &str) -> LucerneError {
        io::Error::new(io::ErrorKind::NotFound, format!("file not found: {name}")).into()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        MemoryStorage::new(MemoryStorageConfig::default())
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let data = self
            .files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))?;
        Ok(Box::new(MemoryInput {
            cursor: Cursor::new(data),
        }))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput {
            name: name.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
            closed: false,
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.files.write();
        let data = files.remove(from).ok_or_else(|| Self::not_found(from))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    fn obtain_lock(&self, name: &str) -> Result<StorageLock> {
        if !self.locks.lock().insert(name.to_string()) {
            return Err(LucerneError::lock_contention(format!(
                "lock {name} is held by another writer"
            )));
        }
        let locks = Arc::clone(&self.locks);
        let owned = name.to_string();
        Ok(StorageLock::new(
            name,
            Box::new(move || {
                locks.lock().remove(&owned);
            }),
        ))
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct MemoryInput {
    cursor: Cursor<Arc<[u8]>>,
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }
}

/// Buffers writes and publishes the file on close.
#[derive(Debug)]
struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: FileTable,
    closed: bool,
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::other("write after close"));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            let data = std::mem::take(&mut self.buffer);
            self.files.write().insert(self.name.clone(), Arc::from(data));
        }
        Ok(())
    }
}
