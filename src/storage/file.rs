//! File system storage.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{LucerneError, Result};
use crate::storage::{Storage, StorageInput, StorageLock, StorageOutput};

/// Configuration for [`FileStorage`].
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Directory holding the index files. Created if missing.
    pub path: PathBuf,
}

impl FileStorageConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileStorageConfig {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Storage backed by one directory.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Ok(FileStorage {
            directory: config.path,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let file = File::open(self.path(name))?;
        let size = file.metadata()?.len();
        Ok(Box::new(FileInput {
            reader: BufReader::new(file),
            size,
        }))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        let file = File::create(self.path(name))?;
        Ok(Box::new(FileOutput {
            writer: BufWriter::new(file),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                files.push(name.to_string());
            }
        }
        files.sort();
        Ok(files)
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.path(from), self.path(to))?;
        Ok(())
    }

    /// The lock is an OS file lock on `name`, so it dies with the process
    /// holding it. The file itself stays behind and records the pid of the
    /// last holder.
    fn obtain_lock(&self, name: &str) -> Result<StorageLock> {
        let path = self.path(name);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(LucerneError::lock_contention(format!(
                    "lock file {} is held by another writer",
                    path.display()
                )));
            }
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;
        debug!("obtained lock {}", path.display());

        Ok(StorageLock::new(
            name,
            Box::new(move || {
                if let Err(e) = file.unlock() {
                    warn!("failed to release lock {}: {e}", path.display());
                }
            }),
        ))
    }

    fn sync(&self) -> Result<()> {
        #[cfg(unix)]
        File::open(&self.directory)?.sync_all()?;
        Ok(())
    }
}

#[derive(Debug)]
struct FileInput {
    reader: BufReader<File>,
    size: u64,
}

impl Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl StorageInput for FileInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }
}

#[derive(Debug)]
struct FileOutput {
    writer: BufWriter<File>,
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush_and_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_rename() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(dir.path())).unwrap();

        storage.write_file("a.tmp", b"hello").unwrap();
        storage.rename_file("a.tmp", "a").unwrap();

        assert!(!storage.file_exists("a.tmp"));
        assert_eq!(storage.read_file("a").unwrap(), b"hello");
        assert_eq!(storage.list_files().unwrap(), vec!["a".to_string()]);

        storage.delete_file("a").unwrap();
        storage.delete_file("a").unwrap();
        assert!(storage.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(dir.path())).unwrap();

        let lock = storage.obtain_lock("write.lock").unwrap();
        assert!(matches!(
            storage.obtain_lock("write.lock"),
            Err(LucerneError::LockContention(_))
        ));
        drop(lock);
        assert!(storage.obtain_lock("write.lock").is_ok());
    }

    #[test]
    fn test_lock_file_left_by_dead_process_is_reusable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("write.lock"), b"999999\n").unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(dir.path())).unwrap();

        let lock = storage.obtain_lock("write.lock").unwrap();
        let holder = fs::read_to_string(dir.path().join("write.lock")).unwrap();
        assert_eq!(holder.trim(), std::process::id().to_string());
        drop(lock);
        assert!(dir.path().join("write.lock").exists());
    }
}
