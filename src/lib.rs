// Pet Flights - Core Library
// Exposes the record store, its CSV persistence and the HTTP API
// for use by the admin CLI, the server binary, and tests.

pub mod config;
pub mod csv_store;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod store;
pub mod validate;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use csv_store::{
    load_flights, load_pets, load_users, save_flights, save_pets, save_users,
    LoadReport, RecordKind, RowDiagnostic,
};
pub use error::{StoreError, StoreResult};
pub use lifecycle::{ensure_files, init, teardown, DataFiles, LoadSummary};
pub use models::{Flight, FlightKey, Pet, User};
pub use store::RecordStore;
pub use validate::ValidationError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
