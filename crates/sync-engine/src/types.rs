//! Sync reports and pass options

use fleetsync_core::EntityKind;
use serde::{Deserialize, Serialize};

/// Per-entity outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    /// Records created, updated, or swept
    pub synced: u64,
    /// Records left untouched (unchanged fingerprint or filtered out)
    pub skipped: u64,
}

/// Summary of one entity pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySummary {
    pub kind: EntityKind,
    pub counts: SyncCounts,
}

/// Outcome of a full reconciliation run
///
/// A failed pass still contributes its partial counts; `failed` marks
/// that at least one pass aborted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub entities: Vec<EntitySummary>,
    pub messages: Vec<String>,
    pub failed: bool,
}

impl SyncReport {
    pub fn record(&mut self, kind: EntityKind, counts: SyncCounts) {
        log::info!(
            "{} sync completed: {} synced, {} skipped",
            kind.label(),
            counts.synced,
            counts.skipped
        );
        self.messages.push(format!(
            "{} sync completed: {} synced, {} skipped",
            kind.label(),
            counts.synced,
            counts.skipped
        ));
        self.entities.push(EntitySummary { kind, counts });
    }

    pub fn record_failure(&mut self, kind: EntityKind, counts: SyncCounts, error: &str) {
        log::error!("{} sync failed: {}", kind.label(), error);
        self.messages
            .push(format!("{} sync failed: {error}", kind.label()));
        self.entities.push(EntitySummary { kind, counts });
        self.failed = true;
    }

    pub fn counts_for(&self, kind: EntityKind) -> SyncCounts {
        self.entities
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.counts)
            .unwrap_or_default()
    }
}

/// Which entity kinds a tombstone sweep may delete from
///
/// Sweeping is only sound for kinds whose collection is fetched in full,
/// so the switch is per kind rather than global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    pub stations: bool,
    pub lines: bool,
    pub line_stations: bool,
    pub vehicles: bool,
    pub profiles: bool,
    pub rides: bool,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            stations: false,
            lines: true,
            line_stations: true,
            vehicles: false,
            profiles: false,
            rides: false,
        }
    }
}

impl SweepPolicy {
    /// Sweep nothing, whatever the entity kind
    pub fn none() -> Self {
        Self {
            stations: false,
            lines: false,
            line_stations: false,
            vehicles: false,
            profiles: false,
            rides: false,
        }
    }

    pub fn allows(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Station => self.stations,
            EntityKind::Line => self.lines,
            EntityKind::LineStation => self.line_stations,
            EntityKind::Vehicle => self.vehicles,
            EntityKind::Driver | EntityKind::Passenger => self.profiles,
            EntityKind::Ride => self.rides,
        }
    }
}

/// Options for a reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub sweep: SweepPolicy,
    /// Send the stored watermark as an `updatedSince` filter. A pass that
    /// fetched incrementally never sweeps, whatever `sweep` says.
    pub incremental_fetch: bool,
}
