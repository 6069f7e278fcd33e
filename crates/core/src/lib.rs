pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, Result};
pub use types::{
    Direction, EntityKind, Line, LineFields, LineStation, LineStationFields, LineType,
    LocationType, Profile, ProfileFields, ProfileKind, Ride, RideFields, RideStatus, Station,
    StationFields, SyncOrigin, Vehicle, VehicleFields,
};
