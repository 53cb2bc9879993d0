//! JSON-file-backed [`BlockRepository`].
//!
//! The file holds a single JSON array of records. Reads are served from an
//! in-memory index loaded at open. Every mutation:
//!
//! 1. takes an exclusive lock on `<store>.lock`, so writers in other
//!    processes queue behind it
//! 2. reloads the file, picking up records written by other processes
//! 3. applies the change to that fresh copy and writes it through
//!    `<store>.tmp` and a rename
//! 4. swaps the fresh copy in as the read index
//!
//! A failed write leaves both the file and the read index untouched.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{BlockError, Result};
use crate::memory::InMemoryBlockRepository;
use crate::record::{BlockDraft, BlockId, BlockRecord, StaffId, TenantId};
use crate::repository::{BlockFilter, BlockRepository};

#[derive(Debug)]
pub struct FileBlockRepository {
    path: PathBuf,
    lock_path: PathBuf,
    tmp_path: PathBuf,
    inner: RwLock<InMemoryBlockRepository>,
    /// Serializes writers within this process; `lock_path` covers the rest.
    write_lock: Mutex<()>,
}

impl FileBlockRepository {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = load(&path)?;
        debug!(path = %path.display(), records = records.len(), "opened block store");
        Ok(Self {
            lock_path: sibling(&path, ".lock"),
            tmp_path: sibling(&path, ".tmp"),
            path,
            inner: RwLock::new(InMemoryBlockRepository::from_records(records)),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                BlockError::Storage(format!("cannot open {}: {e}", self.lock_path.display()))
            })?;
        file.lock_exclusive().map_err(|e| {
            BlockError::Storage(format!("cannot lock {}: {e}", self.lock_path.display()))
        })?;
        Ok(file)
    }

    fn persist(&self, records: &[BlockRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| BlockError::Storage(format!("cannot encode block store: {e}")))?;
        fs::write(&self.tmp_path, json).map_err(|e| {
            BlockError::Storage(format!("cannot write {}: {e}", self.tmp_path.display()))
        })?;
        fs::rename(&self.tmp_path, &self.path).map_err(|e| {
            BlockError::Storage(format!("cannot replace {}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), records = records.len(), "block store written");
        Ok(())
    }

    fn mutate<T>(&self, op: impl FnOnce(&InMemoryBlockRepository) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock();
        // Released when the handle is dropped.
        let _file_lock = self.lock_file()?;

        let fresh = InMemoryBlockRepository::from_records(load(&self.path)?);
        let value = op(&fresh)?;
        self.persist(&fresh.snapshot())?;
        *self.inner.write() = fresh;
        Ok(value)
    }
}

/// Read every record in the file at `path`. Missing or blank files are empty.
fn load(path: &Path) -> Result<Vec<BlockRecord>> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
        Ok(text) => serde_json::from_str(&text).map_err(|e| {
            BlockError::Storage(format!("corrupt block store {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(BlockError::Storage(format!(
            "cannot read block store {}: {e}",
            path.display()
        ))),
    }
}

/// `path` with `suffix` appended to its full file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("blocks"));
    name.push(suffix);
    path.with_file_name(name)
}

impl BlockRepository for FileBlockRepository {
    fn save(&self, draft: BlockDraft) -> Result<BlockRecord> {
        self.mutate(|inner| inner.save(draft))
    }

    fn find_by_id(&self, tenant_id: &TenantId, id: BlockId) -> Result<Option<BlockRecord>> {
        self.inner.read().find_by_id(tenant_id, id)
    }

    fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
        filter: &BlockFilter,
    ) -> Result<Vec<BlockRecord>> {
        self.inner.read().find_by_tenant(tenant_id, filter)
    }

    fn find_by_date_range(
        &self,
        tenant_id: &TenantId,
        start: NaiveDate,
        end: NaiveDate,
        staff_id: Option<&StaffId>,
    ) -> Result<Vec<BlockRecord>> {
        self.inner
            .read()
            .find_by_date_range(tenant_id, start, end, staff_id)
    }

    fn find_active_by_date(
        &self,
        tenant_id: &TenantId,
        date: NaiveDate,
        staff_id: Option<&StaffId>,
    ) -> Result<Vec<BlockRecord>> {
        self.inner
            .read()
            .find_active_by_date(tenant_id, date, staff_id)
    }

    fn update(&self, tenant_id: &TenantId, id: BlockId, draft: BlockDraft) -> Result<BlockRecord> {
        self.mutate(|inner| inner.update(tenant_id, id, draft))
    }

    fn soft_delete(&self, tenant_id: &TenantId, id: BlockId) -> Result<()> {
        self.mutate(|inner| inner.soft_delete(tenant_id, id))
    }

    fn reactivate(&self, tenant_id: &TenantId, id: BlockId) -> Result<BlockRecord> {
        self.mutate(|inner| inner.reactivate(tenant_id, id))
    }

    fn count_by_tenant(&self, tenant_id: &TenantId, filter: &BlockFilter) -> Result<usize> {
        self.inner.read().count_by_tenant(tenant_id, filter)
    }
}
