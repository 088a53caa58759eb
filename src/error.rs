//! Error types for the record store.
//!
//! Store failures are synchronous and caller-caused: an add that collides with
//! an existing identity, or an update/delete/reference that names an absent
//! one. Lookups never fail; they return `Option`.

use thiserror::Error;

/// Result alias for record store mutations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by [`crate::store::RecordStore`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An add targets a pet id or player id that is already present.
    #[error("{0} already exists")]
    DuplicateId(String),

    /// An add targets a `(flight_id, date)` pair that is already present.
    #[error("flight {flight_id} on {date} already exists")]
    DuplicateKey {
        /// Numeric flight id.
        flight_id: i64,
        /// Flight date.
        date: String,
    },

    /// An update or delete targets an absent record.
    #[error("{0} not found")]
    NotFound(String),

    /// A pet references a user that does not exist.
    #[error("owner {0} not found")]
    ReferenceNotFound(String),

    /// No id is left above the current maximum for this record kind.
    #[error("no {0} ids left")]
    IdExhausted(String),
}

impl StoreError {
    pub(crate) fn pet_not_found(id: i64) -> Self {
        StoreError::NotFound(format!("pet {id}"))
    }

    pub(crate) fn user_not_found(player_id: &str) -> Self {
        StoreError::NotFound(format!("user {player_id}"))
    }

    pub(crate) fn flight_not_found(flight_id: i64, date: &str) -> Self {
        StoreError::NotFound(format!("flight {flight_id} on {date}"))
    }
}
