//! Domain models for the transit fleet

pub mod common;
pub mod line;
pub mod line_station;
pub mod profile;
pub mod ride;
pub mod station;
pub mod vehicle;

pub use common::{
    validate_coordinates, validate_hex_color, validate_json_array, validate_json_object,
    Direction, EntityKind, LineType, LocationType, RideStatus, SyncOrigin,
};
pub use line::{Line, LineFields};
pub use line_station::{LineStation, LineStationFields};
pub use profile::{Profile, ProfileFields, ProfileKind};
pub use ride::{Ride, RideFields};
pub use station::{Station, StationFields};
pub use vehicle::{Vehicle, VehicleFields};
