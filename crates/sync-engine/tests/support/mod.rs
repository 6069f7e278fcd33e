//! In-memory fake remote service for reconciler and gateway tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fleetsync_core::EntityKind;
use fleetsync_remote::{DeleteOutcome, RemoteError, RemoteResult};
use fleetsync_sync_engine::RemoteApi;
use serde_json::Value;

/// Fake backend: collections are plain JSON arrays, created records get
/// sequential ids, call history is recorded for assertions
pub struct FakeRemote {
    collections: Mutex<HashMap<&'static str, Vec<Value>>>,
    next_id: AtomicI64,
    pub created: Mutex<Vec<(EntityKind, Value)>>,
    pub updated: Mutex<Vec<(EntityKind, i64, Value)>>,
    pub deleted: Mutex<Vec<(EntityKind, i64)>>,
    pub last_since: Mutex<Option<DateTime<Utc>>>,
    fetch_failures: AtomicUsize,
    create_failures: AtomicUsize,
    delete_status: Mutex<Option<u16>>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1000),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            last_since: Mutex::new(None),
            fetch_failures: AtomicUsize::new(0),
            create_failures: AtomicUsize::new(0),
            delete_status: Mutex::new(None),
        }
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_collection(&self, kind: EntityKind, records: Vec<Value>) {
        self.collections.lock().unwrap().insert(kind.name(), records);
    }

    /// The next `n` collection fetches fail with a 503
    pub fn fail_fetches(&self, n: usize) {
        self.fetch_failures.store(n, Ordering::SeqCst);
    }

    /// The next `n` creates fail with a 503
    pub fn fail_creates(&self, n: usize) {
        self.create_failures.store(n, Ordering::SeqCst);
    }

    /// All deletes answer with the given status (404 means "already gone")
    pub fn answer_deletes_with(&self, status: u16) {
        *self.delete_status.lock().unwrap() = Some(status);
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

// Tests keep the fake and hand the engine a borrow, so call history
// stays inspectable after the run
impl RemoteApi for &FakeRemote {
    async fn fetch_collection(
        &self,
        kind: EntityKind,
        since: Option<DateTime<Utc>>,
    ) -> RemoteResult<Vec<Value>> {
        <FakeRemote as RemoteApi>::fetch_collection(self, kind, since).await
    }

    async fn create(&self, kind: EntityKind, body: &Value) -> RemoteResult<i64> {
        <FakeRemote as RemoteApi>::create(self, kind, body).await
    }

    async fn update(&self, kind: EntityKind, external_id: i64, body: &Value) -> RemoteResult<()> {
        <FakeRemote as RemoteApi>::update(self, kind, external_id, body).await
    }

    async fn delete(&self, kind: EntityKind, external_id: i64) -> RemoteResult<DeleteOutcome> {
        <FakeRemote as RemoteApi>::delete(self, kind, external_id).await
    }
}

impl RemoteApi for FakeRemote {
    async fn fetch_collection(
        &self,
        kind: EntityKind,
        since: Option<DateTime<Utc>>,
    ) -> RemoteResult<Vec<Value>> {
        *self.last_since.lock().unwrap() = since;
        if Self::take_failure(&self.fetch_failures) {
            return Err(RemoteError::UnexpectedStatus {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(kind.name())
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, kind: EntityKind, body: &Value) -> RemoteResult<i64> {
        if Self::take_failure(&self.create_failures) {
            return Err(RemoteError::UnexpectedStatus {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push((kind, body.clone()));
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, external_id: i64, body: &Value) -> RemoteResult<()> {
        self.updated
            .lock()
            .unwrap()
            .push((kind, external_id, body.clone()));
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, external_id: i64) -> RemoteResult<DeleteOutcome> {
        self.deleted.lock().unwrap().push((kind, external_id));
        match *self.delete_status.lock().unwrap() {
            Some(404) => Ok(DeleteOutcome::NotFound),
            Some(status) if status >= 400 => Err(RemoteError::UnexpectedStatus {
                status,
                body: "delete failed".to_string(),
            }),
            _ => Ok(DeleteOutcome::Deleted),
        }
    }
}
