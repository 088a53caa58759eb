// Record Models - Pets, Users, Flights
//
// Each struct is both the in-memory value held by the store and the row
// shape of its CSV file. Serde renames carry the column headers, so the
// csv reader/writer and the JSON API share one definition.

use serde::{Deserialize, Serialize};

// ============================================================================
// PET
// ============================================================================

/// A booking subject. Identity is `id`; `owner` must reference an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Positive id. Zero (or negative) means "assign one for me".
    #[serde(rename = "Id")]
    pub id: i64,

    #[serde(rename = "Nombre")]
    pub name: String,

    /// Free-form age, kept as written ("3", "3 meses", ...)
    #[serde(rename = "Edad")]
    pub age: String,

    #[serde(rename = "Telefono")]
    pub phone: i64,

    #[serde(rename = "Años")]
    pub years: String,

    #[serde(rename = "Tipo")]
    pub kind: String,

    /// Owning user (`User::player_id`)
    #[serde(rename = "player_id")]
    pub owner: String,

    /// Flight this pet is booked on, if any
    #[serde(rename = "Id_vuelo", default)]
    pub flight_id: Option<i64>,
}

impl Pet {
    /// Create a pet with no id (the store assigns one) and no flight.
    pub fn new(
        name: impl Into<String>,
        age: impl Into<String>,
        phone: i64,
        years: impl Into<String>,
        kind: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Pet {
            id: 0,
            name: name.into(),
            age: age.into(),
            phone,
            years: years.into(),
            kind: kind.into(),
            owner: owner.into(),
            flight_id: None,
        }
    }

    /// Builder-style explicit id
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_flight(mut self, flight_id: i64) -> Self {
        self.flight_id = Some(flight_id);
        self
    }

    /// True when the store must assign an id on insert
    pub fn needs_id(&self) -> bool {
        self.id <= 0
    }
}

// ============================================================================
// USER
// ============================================================================

/// The owner/customer entity referenced by pets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "player_id")]
    pub player_id: String,

    #[serde(rename = "Nombre_U")]
    pub name: String,

    #[serde(rename = "Telefono")]
    pub phone: String,

    #[serde(rename = "Edad")]
    pub age: String,
}

impl User {
    pub fn new(
        player_id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        age: impl Into<String>,
    ) -> Self {
        User {
            player_id: player_id.into(),
            name: name.into(),
            phone: phone.into(),
            age: age.into(),
        }
    }
}

// ============================================================================
// FLIGHT
// ============================================================================

/// Composite flight identity: the same numeric id recurs on different dates.
pub type FlightKey = (i64, String);

/// A schedule entry keyed by `(flight_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(rename = "id_vuelo")]
    pub flight_id: i64,

    #[serde(rename = "Aerolinea")]
    pub airline: String,

    #[serde(rename = "precio")]
    pub price: i64,

    #[serde(rename = "fecha")]
    pub date: String,

    #[serde(rename = "origen", default)]
    pub origin: Option<String>,

    #[serde(rename = "destino", default)]
    pub destination: Option<String>,
}

impl Flight {
    pub fn new(flight_id: i64, airline: impl Into<String>, price: i64, date: impl Into<String>) -> Self {
        Flight {
            flight_id,
            airline: airline.into(),
            price,
            date: date.into(),
            origin: None,
            destination: None,
        }
    }

    /// Set origin and destination together
    pub fn with_route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self.destination = Some(destination.into());
        self
    }

    pub fn key(&self) -> FlightKey {
        (self.flight_id, self.date.clone())
    }
}
