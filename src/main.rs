use anyhow::Result;
use clap::Parser;

use pet_flights::config::{CliConfig, Command};
use pet_flights::logging::init_logging;
use pet_flights::{ensure_files, init, DataFiles, RecordKind};

fn main() -> Result<()> {
    let config = CliConfig::parse();
    init_logging(config.common.verbosity());

    let files = config.common.data_files();

    match config.command {
        Command::Init => run_init(&files)?,
        Command::Check => {
            if !run_check(&files) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn run_init(files: &DataFiles) -> Result<()> {
    println!("🗂️  Preparing data directory {}", files.dir.display());

    let created = ensure_files(files)?;
    if created.is_empty() {
        println!("✓ All data files already exist");
    }
    for kind in created {
        println!("✓ Created {}", files.path(kind).display());
    }

    Ok(())
}

/// Load every file and print what happened. Returns false when anything was
/// skipped, missing or unreadable.
fn run_check(files: &DataFiles) -> bool {
    println!("🔍 Checking data directory {}", files.dir.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (store, summary) = init(files);

    for kind in [RecordKind::Users, RecordKind::Flights, RecordKind::Pets] {
        let path = files.path(kind).display();

        if let Some((_, message)) = summary.failures.iter().find(|(k, _)| *k == kind) {
            println!("❌ {kind}: {message}");
            continue;
        }

        match summary.report(kind) {
            Some(report) if report.missing => println!("⚠️  {kind}: {path} not found"),
            Some(report) => {
                println!("✓ {kind}: {} rows loaded from {path}", report.loaded);
                for diagnostic in &report.skipped {
                    println!("   ✗ skipped {diagnostic}");
                }
            }
            None => {}
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let next_flight_id = match store.next_flight_id() {
        Ok(id) => id.to_string(),
        Err(e) => e.to_string(),
    };
    println!(
        "📊 {} users, {} flights, {} pets (next pet id {}, next flight id {})",
        store.user_count(),
        store.flight_count(),
        store.pet_count(),
        store.next_pet_id(),
        next_flight_id
    );

    match summary.problems() {
        None => {
            println!("✅ All rows loaded");
            true
        }
        Some(problems) => {
            println!("⚠️  {problems}");
            false
        }
    }
}
