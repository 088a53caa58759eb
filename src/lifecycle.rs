// Process Lifecycle - init (load) and teardown (save)
//
// init     -> build a RecordStore from the data directory (or start empty)
// serve    -> owned by the caller (bin/server.rs)
// teardown -> write every mapping back, fully overwriting the files

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::csv_store::{self, LoadReport, RecordKind};
use crate::store::RecordStore;

/// The three CSV files inside one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub dir: PathBuf,
    pub pets: PathBuf,
    pub flights: PathBuf,
    pub users: PathBuf,
}

impl DataFiles {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        DataFiles {
            pets: dir.join(RecordKind::Pets.file_name()),
            flights: dir.join(RecordKind::Flights.file_name()),
            users: dir.join(RecordKind::Users.file_name()),
            dir,
        }
    }

    pub fn path(&self, kind: RecordKind) -> &Path {
        match kind {
            RecordKind::Pets => &self.pets,
            RecordKind::Flights => &self.flights,
            RecordKind::Users => &self.users,
        }
    }
}

/// What happened while loading a data directory
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub reports: Vec<LoadReport>,
    /// Files that existed but could not be read at all
    pub failures: Vec<(RecordKind, String)>,
}

impl LoadSummary {
    pub fn loaded(&self) -> usize {
        self.reports.iter().map(|r| r.loaded).sum()
    }

    pub fn skipped(&self) -> usize {
        self.reports.iter().map(|r| r.skipped.len()).sum()
    }

    pub fn missing(&self) -> Vec<RecordKind> {
        self.reports
            .iter()
            .filter(|r| r.missing)
            .map(|r| r.kind)
            .collect()
    }

    pub fn report(&self, kind: RecordKind) -> Option<&LoadReport> {
        self.reports.iter().find(|r| r.kind == kind)
    }

    /// True when every file existed and every row loaded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.reports.iter().all(LoadReport::is_clean)
    }

    /// One line naming skipped rows, missing files and unreadable files,
    /// or `None` when the load was clean.
    pub fn problems(&self) -> Option<String> {
        if self.is_clean() {
            return None;
        }

        let kinds = |kinds: Vec<RecordKind>| {
            kinds.iter().map(RecordKind::as_str).collect::<Vec<_>>().join(", ")
        };

        let mut parts = Vec::new();
        if self.skipped() > 0 {
            parts.push(format!("{} rows skipped", self.skipped()));
        }
        let missing = self.missing();
        if !missing.is_empty() {
            parts.push(format!("missing files: {}", kinds(missing)));
        }
        if !self.failures.is_empty() {
            let failed = self.failures.iter().map(|(kind, _)| *kind).collect();
            parts.push(format!("unreadable files: {}", kinds(failed)));
        }

        Some(parts.join("; "))
    }
}

/// Load the store from `files`.
///
/// Never fails: missing files, unreadable files and bad rows are reported in
/// the summary and logged, and the store holds whatever did load. Users load
/// first so pet owners can be checked.
pub fn init(files: &DataFiles) -> (RecordStore, LoadSummary) {
    let mut store = RecordStore::new();
    let mut summary = LoadSummary::default();

    let loaders: [(RecordKind, fn(&mut RecordStore, &Path) -> Result<LoadReport>); 3] = [
        (RecordKind::Users, csv_store::load_users),
        (RecordKind::Flights, csv_store::load_flights),
        (RecordKind::Pets, csv_store::load_pets),
    ];

    for (kind, load) in loaders {
        match load(&mut store, files.path(kind)) {
            Ok(report) => summary.reports.push(report),
            Err(e) => {
                error!(kind = %kind, "failed to load: {:#}", e);
                summary.failures.push((kind, format!("{:#}", e)));
            }
        }
    }

    if !summary.is_clean() {
        warn!(
            skipped = summary.skipped(),
            missing = summary.missing().len(),
            failures = summary.failures.len(),
            "data directory loaded with diagnostics"
        );
    }

    info!(
        pets = store.pet_count(),
        users = store.user_count(),
        flights = store.flight_count(),
        "record store ready"
    );

    (store, summary)
}

/// Save every mapping to `files`, overwriting what was there.
pub fn teardown(store: &RecordStore, files: &DataFiles) -> Result<()> {
    info!(dir = %files.dir.display(), "saving record store");

    csv_store::save_pets(store, &files.pets).context("Failed to save pets")?;
    csv_store::save_flights(store, &files.flights).context("Failed to save flights")?;
    csv_store::save_users(store, &files.users).context("Failed to save users")?;

    info!("record store saved");
    Ok(())
}

/// Write header-only files for any kind that has no file yet.
/// Returns the kinds that were created.
pub fn ensure_files(files: &DataFiles) -> Result<Vec<RecordKind>> {
    let empty = RecordStore::new();
    let mut created = Vec::new();

    for kind in [RecordKind::Users, RecordKind::Flights, RecordKind::Pets] {
        let path = files.path(kind);
        if path.exists() {
            continue;
        }
        match kind {
            RecordKind::Pets => csv_store::save_pets(&empty, path)?,
            RecordKind::Flights => csv_store::save_flights(&empty, path)?,
            RecordKind::Users => csv_store::save_users(&empty, path)?,
        };
        created.push(kind);
    }

    Ok(created)
}
