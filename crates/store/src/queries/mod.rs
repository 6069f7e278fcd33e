//! Query modules, one per entity
//!
//! Every function takes a `&mut SqliteConnection` so callers decide the
//! transaction boundary: the gateway wraps a local write plus the remote
//! call's id bookkeeping in one transaction, the reconciler wraps each
//! record apply.

pub mod line_stations;
pub mod lines;
pub mod profiles;
pub mod rides;
pub mod stations;
pub mod vehicles;
pub mod watermarks;
