use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use lucerne::storage::memory::MemoryStorage;
use lucerne::storage::{Storage, StorageInput, StorageLock, StorageOutput};
use lucerne::{Document, Engine, IndexConfig, LucerneError, Query};

/// Storage operation made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Creating a file whose name ends with the suffix.
    Create(&'static str),
    Rename,
    Delete,
}

/// Memory storage that fails the next operation matching an armed fault.
#[derive(Debug, Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    fault: Mutex<Option<Fault>>,
}

impl FlakyStorage {
    fn arm(&self, fault: Fault) {
        *self.fault.lock() = Some(fault);
    }

    fn armed(&self) -> bool {
        self.fault.lock().is_some()
    }

    fn trip(&self, hit: impl Fn(Fault) -> bool) -> lucerne::Result<()> {
        let mut fault = self.fault.lock();
        match *fault {
            Some(armed) if hit(armed) => {
                *fault = None;
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected failure").into())
            }
            _ => Ok(()),
        }
    }
}

impl Storage for FlakyStorage {
    fn open_input(&self, name: &str) -> lucerne::Result<Box<dyn StorageInput>> {
        self.inner.open_input(name)
    }

    fn create_output(&self, name: &str) -> lucerne::Result<Box<dyn StorageOutput>> {
        self.trip(|f| matches!(f, Fault::Create(suffix) if name.ends_with(suffix)))?;
        self.inner.create_output(name)
    }

    fn file_exists(&self, name: &str) -> bool {
        self.inner.file_exists(name)
    }

    fn delete_file(&self, name: &str) -> lucerne::Result<()> {
        self.trip(|f| f == Fault::Delete)?;
        self.inner.delete_file(name)
    }

    fn list_files(&self) -> lucerne::Result<Vec<String>> {
        self.inner.list_files()
    }

    fn rename_file(&self, from: &str, to: &str) -> lucerne::Result<()> {
        self.trip(|f| f == Fault::Rename)?;
        self.inner.rename_file(from, to)
    }

    fn obtain_lock(&self, name: &str) -> lucerne::Result<StorageLock> {
        self.inner.obtain_lock(name)
    }

    fn sync(&self) -> lucerne::Result<()> {
        self.inner.sync()
    }
}

fn fruit(id: &str, name: &str) -> Document {
    Document::with_id(id).add_text("name", name, true)
}

fn search(engine: &Engine, term: &str) -> lucerne::Result<Vec<String>> {
    let hits = engine.searcher()?.search(&Query::term("name", term), 100)?;
    let mut ids: Vec<String> = hits.into_iter().map(|hit| hit.id).collect();
    ids.sort();
    Ok(ids)
}

#[test]
fn test_failed_commit_keeps_last_commit_and_can_be_retried() -> lucerne::Result<()> {
    let faults = [
        Fault::Create(".pst"),
        Fault::Create(".sto"),
        Fault::Create("manifest.json.tmp"),
        Fault::Rename,
    ];
    for fault in faults {
        let storage = Arc::new(FlakyStorage::default());
        let engine = Engine::new(storage.clone(), IndexConfig::default())?;
        let mut writer = engine.writer()?;
        writer.add_document(fruit("1", "apple"))?;
        writer.commit()?;
        let generation = engine.reader()?.generation();

        writer.add_document(fruit("2", "apple pie"))?;
        writer.delete_document("1")?;
        storage.arm(fault);
        assert!(
            matches!(writer.commit(), Err(LucerneError::Io(_))),
            "{fault:?} should fail the commit"
        );
        assert!(!storage.armed());

        let reader = engine.reader()?;
        assert_eq!(reader.generation(), generation, "{fault:?}");
        assert!(reader.document("1").is_some());
        assert_eq!(search(&engine, "apple")?, vec!["1"]);
        assert_eq!(writer.pending_docs(), 1);
        assert_eq!(writer.pending_deletes(), 1);

        assert!(writer.commit()?, "{fault:?}");
        assert_eq!(search(&engine, "apple")?, vec!["2"]);
        assert_eq!(engine.reader()?.doc_count(), 1);
        assert!(!writer.commit()?);
    }
    Ok(())
}

#[test]
fn test_commit_that_landed_is_not_reported_as_failed() -> lucerne::Result<()> {
    let storage = Arc::new(FlakyStorage::default());
    let engine = Engine::new(storage.clone(), IndexConfig::default())?;
    let mut writer = engine.writer()?;
    writer.add_document(fruit("old", "apple"))?;
    writer.commit()?;

    writer.delete_document("old")?;
    writer.add_document(fruit("new", "apple"))?;
    storage.arm(Fault::Delete);
    assert!(writer.commit()?);
    assert!(!storage.armed());
    assert_eq!(writer.pending_docs(), 0);
    assert!(!writer.commit()?);
    assert_eq!(search(&engine, "apple")?, vec!["new"]);

    // The next session removes what the failed cleanup left behind.
    assert!(storage.file_exists("seg_000000.pst"));
    writer.close()?;
    drop(writer);
    drop(engine.writer()?);
    assert!(!storage.file_exists("seg_000000.pst"));
    assert!(!storage.file_exists("seg_000000.sto"));
    assert_eq!(search(&engine, "apple")?, vec!["new"]);
    Ok(())
}

#[test]
fn test_failed_merge_keeps_the_committed_deletions() -> lucerne::Result<()> {
    let storage = Arc::new(FlakyStorage::default());
    let engine = Engine::new(storage.clone(), IndexConfig::default())?;
    let mut writer = engine.writer()?;
    writer.add_documents(vec![fruit("1", "apple"), fruit("2", "apple")])?;
    writer.commit()?;
    writer.delete_document("1")?;
    writer.commit()?;

    storage.arm(Fault::Create(".pst"));
    assert!(matches!(writer.force_merge_deletes(), Err(LucerneError::Io(_))));
    let reader = engine.reader()?;
    assert!(reader.has_deletions());
    assert_eq!(search(&engine, "apple")?, vec!["2"]);

    assert!(writer.force_merge_deletes()?);
    assert!(!engine.reader()?.has_deletions());
    assert_eq!(search(&engine, "apple")?, vec!["2"]);
    Ok(())
}
