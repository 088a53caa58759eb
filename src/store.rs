// Record Store - authoritative in-memory state
//
// Holds pets, flights and users for the lifetime of the process.
// CSV files are only snapshots taken at load and save time (see csv_store).
//
// Lookups return Option (absence is a valid answer).
// Mutations return StoreResult (absence is a caller error).

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::{Flight, FlightKey, Pet, User};

/// In-memory record store.
///
/// The store is not internally synchronized. A multi-worker server must wrap
/// the whole store in one lock so every method runs as a single critical section.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pets: BTreeMap<i64, Pet>,
    flights: BTreeMap<FlightKey, Flight>,
    users: BTreeMap<String, User>,

    /// Next auto-assigned pet id (seeded at 1, always past every id seen)
    next_pet_id: i64,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        RecordStore {
            pets: BTreeMap::new(),
            flights: BTreeMap::new(),
            users: BTreeMap::new(),
            next_pet_id: 1,
        }
    }

    // ========================================================================
    // ID GENERATION
    // ========================================================================

    /// Take the next pet id from the monotonic counter
    fn take_pet_id(&mut self) -> StoreResult<i64> {
        let id = self.next_pet_id;
        self.next_pet_id = id
            .checked_add(1)
            .ok_or_else(|| StoreError::IdExhausted("pet".to_string()))?;
        Ok(id)
    }

    /// Peek the id the next auto-assigned pet would get
    pub fn next_pet_id(&self) -> i64 {
        self.next_pet_id
    }

    /// `max(flight_id) + 1` over the current flights, or 1 when there are none.
    ///
    /// Flights are ordered by `(flight_id, date)`, so the maximum is the last key.
    /// Fails with `IdExhausted` when that maximum is `i64::MAX`.
    pub fn next_flight_id(&self) -> StoreResult<i64> {
        match self.flights.keys().next_back() {
            None => Ok(1),
            Some((flight_id, _)) => flight_id
                .checked_add(1)
                .ok_or_else(|| StoreError::IdExhausted("flight".to_string())),
        }
    }

    // ========================================================================
    // PETS
    // ========================================================================

    /// Add a pet, assigning an id when `pet.id` is non-positive.
    ///
    /// Fails with `DuplicateId` for an explicit id already present and with
    /// `ReferenceNotFound` when the owner is not a known user. An explicit
    /// `i64::MAX` is refused with `IdExhausted`: the counter must stay past
    /// every stored id. Returns the id the pet was stored under.
    pub fn add_pet(&mut self, mut pet: Pet) -> StoreResult<i64> {
        if !pet.needs_id() && self.pets.contains_key(&pet.id) {
            return Err(StoreError::DuplicateId(format!("pet {}", pet.id)));
        }

        if !self.users.contains_key(&pet.owner) {
            return Err(StoreError::ReferenceNotFound(pet.owner));
        }

        if pet.needs_id() {
            pet.id = self.take_pet_id()?;
        } else {
            let past = pet
                .id
                .checked_add(1)
                .ok_or_else(|| StoreError::IdExhausted("pet".to_string()))?;
            self.next_pet_id = self.next_pet_id.max(past);
        }

        let id = pet.id;
        debug!(pet_id = id, owner = %pet.owner, "pet added");
        self.pets.insert(id, pet);
        Ok(id)
    }

    pub fn get_pet(&self, id: i64) -> Option<&Pet> {
        self.pets.get(&id)
    }

    /// All pets, ordered by id
    pub fn get_all_pets(&self) -> Vec<&Pet> {
        self.pets.values().collect()
    }

    /// All pets owned by `player_id`
    pub fn get_pets_for_user(&self, player_id: &str) -> Vec<&Pet> {
        self.pets
            .values()
            .filter(|pet| pet.owner == player_id)
            .collect()
    }

    /// Rebook a pet: only the flight reference changes.
    pub fn update_pet(&mut self, id: i64, flight_id: Option<i64>) -> StoreResult<()> {
        let pet = self
            .pets
            .get_mut(&id)
            .ok_or_else(|| StoreError::pet_not_found(id))?;

        pet.flight_id = flight_id;
        debug!(pet_id = id, ?flight_id, "pet flight updated");
        Ok(())
    }

    pub fn delete_pet(&mut self, id: i64) -> StoreResult<Pet> {
        let pet = self
            .pets
            .remove(&id)
            .ok_or_else(|| StoreError::pet_not_found(id))?;

        debug!(pet_id = id, "pet deleted");
        Ok(pet)
    }

    // ========================================================================
    // FLIGHTS
    // ========================================================================

    /// Add a flight keyed by `(flight_id, date)`.
    ///
    /// A non-positive `flight_id` is replaced by [`Self::next_flight_id`].
    /// Only the exact pair must be unique; the same id on another date is a
    /// distinct flight.
    pub fn add_flight(&mut self, mut flight: Flight) -> StoreResult<FlightKey> {
        if flight.flight_id <= 0 {
            flight.flight_id = self.next_flight_id()?;
        }

        let key = flight.key();
        if self.flights.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                flight_id: key.0,
                date: key.1,
            });
        }

        debug!(flight_id = key.0, date = %key.1, "flight added");
        self.flights.insert(key.clone(), flight);
        Ok(key)
    }

    pub fn get_flight(&self, flight_id: i64, date: &str) -> Option<&Flight> {
        self.flights.get(&(flight_id, date.to_string()))
    }

    /// All flights, ordered by `(flight_id, date)`
    pub fn get_all_flights(&self) -> Vec<&Flight> {
        self.flights.values().collect()
    }

    /// Every dated instance of one flight id
    pub fn get_flights_by_id(&self, flight_id: i64) -> Vec<&Flight> {
        self.flights
            .range((flight_id, String::new())..)
            .take_while(|((id, _), _)| *id == flight_id)
            .map(|(_, flight)| flight)
            .collect()
    }

    /// Overwrite price and/or airline. Omitted fields are left untouched.
    pub fn update_flight(
        &mut self,
        flight_id: i64,
        date: &str,
        new_price: Option<i64>,
        new_airline: Option<String>,
    ) -> StoreResult<()> {
        let flight = self
            .flights
            .get_mut(&(flight_id, date.to_string()))
            .ok_or_else(|| StoreError::flight_not_found(flight_id, date))?;

        if let Some(price) = new_price {
            flight.price = price;
        }
        if let Some(airline) = new_airline {
            flight.airline = airline;
        }

        debug!(flight_id, date, "flight updated");
        Ok(())
    }

    pub fn delete_flight(&mut self, flight_id: i64, date: &str) -> StoreResult<Flight> {
        let flight = self
            .flights
            .remove(&(flight_id, date.to_string()))
            .ok_or_else(|| StoreError::flight_not_found(flight_id, date))?;

        debug!(flight_id, date, "flight deleted");
        Ok(flight)
    }

    // ========================================================================
    // USERS
    // ========================================================================

    pub fn add_user(&mut self, user: User) -> StoreResult<()> {
        if self.users.contains_key(&user.player_id) {
            return Err(StoreError::DuplicateId(format!("user {}", user.player_id)));
        }

        debug!(player_id = %user.player_id, "user added");
        self.users.insert(user.player_id.clone(), user);
        Ok(())
    }

    pub fn get_user(&self, player_id: &str) -> Option<&User> {
        self.users.get(player_id)
    }

    /// All users, ordered by player id
    pub fn get_all_users(&self) -> Vec<&User> {
        self.users.values().collect()
    }

    /// Rename a user. `None` leaves the name as it is.
    pub fn update_user_name(&mut self, player_id: &str, new_name: Option<String>) -> StoreResult<()> {
        let user = self
            .users
            .get_mut(player_id)
            .ok_or_else(|| StoreError::user_not_found(player_id))?;

        if let Some(name) = new_name {
            user.name = name;
        }
        Ok(())
    }

    /// Delete a user together with every pet it owns.
    ///
    /// Nothing is removed when the user is absent. Returns how many pets were
    /// removed by the cascade.
    pub fn delete_user(&mut self, player_id: &str) -> StoreResult<usize> {
        if !self.users.contains_key(player_id) {
            return Err(StoreError::user_not_found(player_id));
        }

        let before = self.pets.len();
        self.pets.retain(|_, pet| pet.owner != player_id);
        let cascaded = before - self.pets.len();

        self.users.remove(player_id);
        debug!(player_id, cascaded, "user deleted");
        Ok(cascaded)
    }

    // ========================================================================
    // COUNTS
    // ========================================================================

    pub fn pet_count(&self) -> usize {
        self.pets.len()
    }

    pub fn flight_count(&self) -> usize {
        self.flights.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pets.is_empty() && self.flights.is_empty() && self.users.is_empty()
    }
}
