//! Persistence backends.
//!
//! The session treats the record store as an opaque upsert-by-id service:
//! no versions, no locks, no transactions. A request without an id creates a
//! record and the store picks the permanent id.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use campaign_editor::{PersistedRecord, SaveRequest};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{SyncError, SyncResult};

/// Remote record store
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Create or upsert; the returned record carries the permanent id
    async fn save(&self, request: SaveRequest) -> SyncResult<PersistedRecord>;

    /// `Ok(None)` when no record exists under `id`
    async fn load(&self, id: &str) -> SyncResult<Option<PersistedRecord>>;
}

/// In-process record store with failure and latency injection
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, PersistedRecord>>,
    saves: Mutex<Vec<SaveRequest>>,
    next_id: AtomicU64,
    save_attempts: AtomicU64,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    save_delay: Mutex<Duration>,
    load_delay: Mutex<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: PersistedRecord) {
        lock(&self.records).insert(record.id.clone(), record);
    }

    pub fn record(&self, id: &str) -> Option<PersistedRecord> {
        lock(&self.records).get(id).cloned()
    }

    pub fn record_count(&self) -> usize {
        lock(&self.records).len()
    }

    /// Successful save requests, oldest first
    pub fn saves(&self) -> Vec<SaveRequest> {
        lock(&self.saves).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.saves).len()
    }

    /// Every save call, failed ones included
    pub fn save_attempts(&self) -> u64 {
        self.save_attempts.load(Ordering::SeqCst)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_save_delay(&self, delay: Duration) {
        *lock(&self.save_delay) = delay;
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *lock(&self.load_delay) = delay;
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn save(&self, request: SaveRequest) -> SyncResult<PersistedRecord> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.save_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SyncError::Backend("save rejected by store".to_string()));
        }

        let now = Utc::now();
        let record = {
            let mut records = lock(&self.records);
            match request.id.clone() {
                Some(id) => {
                    let record = records
                        .entry(id.clone())
                        .or_insert_with(|| PersistedRecord::create(id, empty_request(), now));
                    record.upsert(request.clone(), now);
                    record.clone()
                }
                None => {
                    let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    let id = format!("campaign-{}", n);
                    let record = PersistedRecord::create(id, request.clone(), now);
                    records.insert(record.id.clone(), record.clone());
                    record
                }
            }
        };

        lock(&self.saves).push(request);
        Ok(record)
    }

    async fn load(&self, id: &str) -> SyncResult<Option<PersistedRecord>> {
        let delay = *lock(&self.load_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(SyncError::Backend("load rejected by store".to_string()));
        }
        Ok(self.record(id))
    }
}

/// One pretty-printed JSON file per record under a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, id: &str) -> SyncResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SyncError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Ids of every record in the directory
    pub async fn list(&self) -> SyncResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read(&self, id: &str) -> SyncResult<Option<PersistedRecord>> {
        let path = self.record_path(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(PersistedRecord::from_json(&json)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    async fn save(&self, request: SaveRequest) -> SyncResult<PersistedRecord> {
        let now = Utc::now();
        let record = match request.id.clone() {
            Some(id) => match self.read(&id).await? {
                Some(mut existing) => {
                    existing.upsert(request, now);
                    existing
                }
                None => PersistedRecord::create(id, request, now),
            },
            None => PersistedRecord::create(Uuid::new_v4().to_string(), request, now),
        };

        let path = self.record_path(&record.id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, record.to_json()?).await?;
        tracing::debug!("Wrote record {} to {}", record.id, path.display());
        Ok(record)
    }

    async fn load(&self, id: &str) -> SyncResult<Option<PersistedRecord>> {
        self.read(id).await
    }
}

fn empty_request() -> SaveRequest {
    SaveRequest { id: None, canvas: None, modules: None }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
