// crates/remote/src/lib.rs
//! REST client for the fleet backend services
//!
//! Wraps `reqwest` with the failure policy the sync engine relies on:
//! - outbound writes retry transient failures up to a bounded number of
//!   attempts and never retry an explicit 4xx rejection
//! - collection fetches are single-shot with a larger timeout budget
//! - create responses are parsed for the remote-assigned id whether the
//!   body is JSON or a free-text sentence

mod client;
mod endpoints;
mod error;
mod response;

pub use client::{ApiClient, ClientConfig, DeleteOutcome};
pub use endpoints::Endpoints;
pub use error::{RemoteError, RemoteResult};
pub use response::parse_created_id;
