// CSV Codec - flat-file snapshots of the record store
//
// One file per record kind, UTF-8, header row, fixed column order.
// Load is tolerant: a missing file or a bad row is reported, never fatal.
// Save is a full rewrite: header first, then one row per record.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::{Flight, Pet, User};
use crate::store::RecordStore;

pub const PETS_HEADER: [&str; 8] = [
    "Id", "Nombre", "Edad", "Telefono", "Años", "Tipo", "player_id", "Id_vuelo",
];
pub const FLIGHTS_HEADER: [&str; 6] = [
    "id_vuelo", "Aerolinea", "precio", "fecha", "origen", "destino",
];
pub const USERS_HEADER: [&str; 4] = ["player_id", "Nombre_U", "Telefono", "Edad"];

// ============================================================================
// RECORD KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Pets,
    Flights,
    Users,
}

impl RecordKind {
    /// File name inside the data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKind::Pets => "Mascotas.csv",
            RecordKind::Flights => "Vuelos.csv",
            RecordKind::Users => "Usuarios.csv",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Pets => &PETS_HEADER,
            RecordKind::Flights => &FLIGHTS_HEADER,
            RecordKind::Users => &USERS_HEADER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Pets => "pets",
            RecordKind::Flights => "flights",
            RecordKind::Users => "users",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LOAD REPORT
// ============================================================================

/// A row that was skipped during load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// 1-based line number in the file (0 when unknown)
    pub line: u64,
    pub message: String,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Outcome of loading one CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub kind: RecordKind,
    pub path: PathBuf,
    /// The file did not exist; the store was left untouched
    pub missing: bool,
    pub loaded: usize,
    pub skipped: Vec<RowDiagnostic>,
}

impl LoadReport {
    fn new(kind: RecordKind, path: &Path) -> Self {
        LoadReport {
            kind,
            path: path.to_path_buf(),
            missing: false,
            loaded: 0,
            skipped: Vec::new(),
        }
    }

    /// True when the file existed and every row loaded
    pub fn is_clean(&self) -> bool {
        !self.missing && self.skipped.is_empty()
    }
}

// ============================================================================
// LOAD
// ============================================================================

/// Read `path` row by row, handing each typed row to `insert`.
///
/// Rows that fail to parse, or that `insert` rejects, are recorded in the
/// report and skipped. Only failing to open or read the file is an error.
fn load_rows<T, F, E>(kind: RecordKind, path: &Path, mut insert: F) -> Result<LoadReport>
where
    T: DeserializeOwned,
    F: FnMut(T) -> std::result::Result<(), E>,
    E: fmt::Display,
{
    let mut report = LoadReport::new(kind, path);

    if !path.exists() {
        warn!(kind = %kind, path = %path.display(), "data file not found, starting empty");
        report.missing = true;
        return Ok(report);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    debug!(kind = %kind, ?headers, "reading csv");

    let mut record = csv::StringRecord::new();
    loop {
        match rdr.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                let outcome = record
                    .deserialize::<T>(Some(&headers))
                    .map_err(|e| e.to_string())
                    .and_then(|row| insert(row).map_err(|e| e.to_string()));

                match outcome {
                    Ok(()) => report.loaded += 1,
                    Err(message) => {
                        warn!(kind = %kind, line, %message, "skipping row");
                        report.skipped.push(RowDiagnostic { line, message });
                    }
                }
            }
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                let message = e.to_string();
                warn!(kind = %kind, line, %message, "skipping malformed row");
                report.skipped.push(RowDiagnostic { line, message });
            }
        }
    }

    info!(
        kind = %kind,
        loaded = report.loaded,
        skipped = report.skipped.len(),
        "loaded {}",
        path.display()
    );
    Ok(report)
}

pub fn load_users(store: &mut RecordStore, path: &Path) -> Result<LoadReport> {
    load_rows(RecordKind::Users, path, |user: User| store.add_user(user))
}

/// Stored rows always carry their id; only live adds may ask for one.
fn stored_id(field: &str, id: i64) -> std::result::Result<(), String> {
    if id <= 0 {
        return Err(format!("{field} {id} is not a positive id"));
    }
    Ok(())
}

pub fn load_flights(store: &mut RecordStore, path: &Path) -> Result<LoadReport> {
    load_rows(RecordKind::Flights, path, |flight: Flight| {
        stored_id("id_vuelo", flight.flight_id)?;
        store.add_flight(flight).map(|_| ()).map_err(|e| e.to_string())
    })
}

/// Load pets. Users must already be loaded: a pet whose owner is unknown is
/// skipped like any other rejected row.
pub fn load_pets(store: &mut RecordStore, path: &Path) -> Result<LoadReport> {
    load_rows(RecordKind::Pets, path, |pet: Pet| {
        stored_id("Id", pet.id)?;
        store.add_pet(pet).map(|_| ()).map_err(|e| e.to_string())
    })
}

// ============================================================================
// SAVE
// ============================================================================

/// Overwrite `path` with `header` followed by one row per record.
///
/// An empty iterator still produces a header-only file.
fn save_rows<'a, T, I>(path: &Path, header: &[&str], rows: I) -> Result<usize>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Headers are written by hand so an empty mapping still gets one
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record(header)?;

    let mut written = 0;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
        written += 1;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(written)
}

pub fn save_pets(store: &RecordStore, path: &Path) -> Result<usize> {
    let written = save_rows(path, &PETS_HEADER, store.get_all_pets())?;
    info!(kind = "pets", written, "saved {}", path.display());
    Ok(written)
}

pub fn save_flights(store: &RecordStore, path: &Path) -> Result<usize> {
    let written = save_rows(path, &FLIGHTS_HEADER, store.get_all_flights())?;
    info!(kind = "flights", written, "saved {}", path.display());
    Ok(written)
}

pub fn save_users(store: &RecordStore, path: &Path) -> Result<usize> {
    let written = save_rows(path, &USERS_HEADER, store.get_all_users())?;
    info!(kind = "users", written, "saved {}", path.display());
    Ok(written)
}
