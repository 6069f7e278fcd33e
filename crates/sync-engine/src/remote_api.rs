//! Remote API seam
//!
//! The reconciler and gateway talk to this trait rather than to the HTTP
//! client directly, so tests drive them with an in-memory fake service.

use chrono::{DateTime, Utc};
use fleetsync_core::EntityKind;
use fleetsync_remote::{ApiClient, DeleteOutcome, Endpoints, RemoteResult};
use serde_json::Value;

/// Operations the sync engine needs from the remote services
pub trait RemoteApi {
    /// Fetches an entity collection, optionally filtered to records
    /// updated since the given instant
    fn fetch_collection(
        &self,
        kind: EntityKind,
        since: Option<DateTime<Utc>>,
    ) -> impl std::future::Future<Output = RemoteResult<Vec<Value>>> + Send;

    /// Creates a record, returning the remote-assigned id
    fn create(
        &self,
        kind: EntityKind,
        body: &Value,
    ) -> impl std::future::Future<Output = RemoteResult<i64>> + Send;

    /// Replaces a record
    fn update(
        &self,
        kind: EntityKind,
        external_id: i64,
        body: &Value,
    ) -> impl std::future::Future<Output = RemoteResult<()>> + Send;

    /// Deletes a record; 404 reports `NotFound` rather than an error
    fn delete(
        &self,
        kind: EntityKind,
        external_id: i64,
    ) -> impl std::future::Future<Output = RemoteResult<DeleteOutcome>> + Send;
}

/// HTTP-backed remote, routing each entity kind to its service
pub struct HttpRemote {
    client: ApiClient,
    endpoints: Endpoints,
}

impl HttpRemote {
    pub fn new(client: ApiClient, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }
}

impl RemoteApi for HttpRemote {
    async fn fetch_collection(
        &self,
        kind: EntityKind,
        since: Option<DateTime<Utc>>,
    ) -> RemoteResult<Vec<Value>> {
        self.client
            .fetch_collection(&self.endpoints.collection_url(kind), since)
            .await
    }

    async fn create(&self, kind: EntityKind, body: &Value) -> RemoteResult<i64> {
        self.client
            .create(&self.endpoints.collection_url(kind), kind.label(), body)
            .await
    }

    async fn update(&self, kind: EntityKind, external_id: i64, body: &Value) -> RemoteResult<()> {
        self.client
            .update(&self.endpoints.record_url(kind, external_id), body)
            .await
    }

    async fn delete(&self, kind: EntityKind, external_id: i64) -> RemoteResult<DeleteOutcome> {
        self.client
            .delete(&self.endpoints.record_url(kind, external_id))
            .await
    }
}
