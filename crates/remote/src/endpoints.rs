// crates/remote/src/endpoints.rs
//! Collection URL mapping
//!
//! The fleet backend is split across three services: infrastructure
//! (stations, lines, line stations), dynamics (rides, vehicles) and
//! profiles (drivers, passengers). Each entity kind maps to one collection
//! URL on one of those hosts.

use fleetsync_core::EntityKind;

/// Base URLs of the three remote services
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub infra_base: String,
    pub dynamics_base: String,
    pub profiles_base: String,
}

impl Endpoints {
    pub fn new(
        infra_base: impl Into<String>,
        dynamics_base: impl Into<String>,
        profiles_base: impl Into<String>,
    ) -> Self {
        Self {
            infra_base: trim_slash(infra_base.into()),
            dynamics_base: trim_slash(dynamics_base.into()),
            profiles_base: trim_slash(profiles_base.into()),
        }
    }

    /// URL of the collection for an entity kind
    pub fn collection_url(&self, kind: EntityKind) -> String {
        match kind {
            EntityKind::Station => format!("{}/infra/station", self.infra_base),
            EntityKind::Line => format!("{}/infra/line", self.infra_base),
            EntityKind::LineStation => format!("{}/infra/linestation", self.infra_base),
            EntityKind::Ride => format!("{}/ride", self.dynamics_base),
            EntityKind::Vehicle => format!("{}/vehicle", self.dynamics_base),
            EntityKind::Driver => format!("{}/api/v1/profile/driver", self.profiles_base),
            EntityKind::Passenger => format!("{}/api/v1/profile/passenger", self.profiles_base),
        }
    }

    /// URL of a single record
    pub fn record_url(&self, kind: EntityKind, external_id: i64) -> String {
        format!("{}/{external_id}", self.collection_url(kind))
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
