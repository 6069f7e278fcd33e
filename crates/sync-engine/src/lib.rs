// crates/sync-engine/src/lib.rs
//! Bidirectional synchronization between the local store and the fleet
//! backend services
//!
//! Inbound, the [`Reconciler`] runs per-entity fetch / diff / apply /
//! sweep passes in dependency order. Outbound, the [`Gateway`] mirrors
//! user writes as POST/PUT/DELETE calls. Both sit on the [`RemoteApi`]
//! seam so tests can substitute an in-memory service.

pub mod codec;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod reconciler;
pub mod remote_api;
pub mod resolver;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use gateway::Gateway;
pub use reconciler::Reconciler;
pub use remote_api::{HttpRemote, RemoteApi};
pub use types::{EntitySummary, SweepPolicy, SyncCounts, SyncOptions, SyncReport};
