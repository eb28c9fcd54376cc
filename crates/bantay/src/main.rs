//! `bantay` - CLI for the resident status aggregation engine
//!
//! This binary inspects the offline fallback cache: population counts,
//! evacuation center capacities, the covered areas, and cache freshness.
//! Everything it shows is degraded-mode data; live aggregation belongs to
//! the applications that embed the library with their backend stores.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use bantay::cli::{AreasCommand, CacheCommand, Cli, Command, ConfigCommand, DashboardCommand};
use bantay::model::{AreaFilter, EvacuationCenter};
use bantay::snapshot::{degraded_snapshot, Snapshot};
use bantay::{init_logging, AreaIndex, Config, FallbackCache};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Dashboard(cmd) => handle_dashboard(&config, &cmd),
        Command::Cache(cmd) => handle_cache(&config, &cmd),
        Command::Areas(cmd) => handle_areas(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_cache(config: &Config) -> Result<FallbackCache> {
    FallbackCache::open(config.cache_path()).with_context(|| {
        format!(
            "failed to open fallback cache at {}",
            config.cache_path().display()
        )
    })
}

/// Merge command-line filter flags over the configured defaults.
fn effective_filter(config: &Config, cmd: &DashboardCommand) -> AreaFilter {
    let defaults = config.default_filter();
    AreaFilter {
        municipality: cmd.municipality.clone().or(defaults.municipality),
        barangay: cmd.barangay.clone().or(defaults.barangay),
    }
}

/// The dashboard's JSON payload: the degraded snapshot plus the cached
/// center capacities as a separate key. Occupancy stays empty; the cache
/// holds no statuses, so there is nothing truthful to report per center.
fn dashboard_payload(snapshot: &Snapshot, centers: &[EvacuationCenter]) -> serde_json::Value {
    let capacities: Vec<serde_json::Value> = centers
        .iter()
        .map(|c| json!({ "name": c.name, "barangay": c.barangay, "capacity": c.capacity }))
        .collect();
    json!({
        "snapshot": snapshot,
        "centers": capacities,
    })
}

fn handle_dashboard(config: &Config, cmd: &DashboardCommand) -> Result<()> {
    let cache = open_cache(config)?;
    let filter = effective_filter(config, cmd);

    let locations = cache.read_locations()?;
    let index = AreaIndex::from_locations(&locations);
    if let Some(barangay) = &filter.barangay {
        if !index.is_empty() && !index.contains_barangay(barangay) {
            eprintln!("Warning: barangay \"{barangay}\" is not in the cached location table.");
        }
    }

    let residents = cache.read_residents()?;
    let centers = cache.read_centers()?;
    let snapshot = degraded_snapshot(&residents, &filter);

    if cmd.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&dashboard_payload(&snapshot, &centers))?
        );
        return Ok(());
    }

    println!("bantay dashboard (cached snapshot, statuses unavailable offline)");
    println!("----------------------------------------------------------------");
    match (&filter.municipality, &filter.barangay) {
        (None, None) => println!("Scope:          all areas"),
        (m, b) => println!(
            "Scope:          {}{}",
            m.as_deref().unwrap_or("all municipalities"),
            b.as_ref().map(|b| format!(" / {b}")).unwrap_or_default()
        ),
    }
    println!("Total affected: {}", snapshot.total_affected);
    println!();
    println!("Status counts");
    println!("  Safe:       {}", snapshot.counts.safe);
    println!("  Evacuated:  {}", snapshot.counts.evacuated);
    println!("  Injured:    {}", snapshot.counts.injured);
    println!("  Missing:    {}", snapshot.counts.missing);
    println!("  Deceased:   {}", snapshot.counts.deceased);
    println!("  Unknown:    {}", snapshot.counts.unknown);
    println!();
    if centers.is_empty() {
        println!("No evacuation centers in the cache.");
    } else {
        println!("Evacuation center capacities (occupancy unavailable offline)");
        for center in &centers {
            println!("  {:<30} capacity {:>5}", center.name, center.capacity);
        }
    }
    Ok(())
}

fn handle_cache(config: &Config, cmd: &CacheCommand) -> Result<()> {
    match cmd {
        CacheCommand::Status { json } => {
            let cache = open_cache(config)?;
            let stats = cache.stats()?;

            if *json {
                let status = json!({
                    "path": cache.path(),
                    "residents": stats.resident_rows,
                    "centers": stats.center_rows,
                    "locations": stats.location_rows,
                    "residents_refreshed_at": stats.residents_refreshed_at
                        .map(|t| t.to_rfc3339()),
                    "centers_refreshed_at": stats.centers_refreshed_at
                        .map(|t| t.to_rfc3339()),
                    "db_size_bytes": stats.db_size_bytes,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("bantay cache status");
                println!("-------------------");
                println!("Path:       {}", cache.path().display());
                println!("Residents:  {}", stats.resident_rows);
                println!("Centers:    {}", stats.center_rows);
                println!("Locations:  {}", stats.location_rows);
                println!(
                    "Refreshed:  {}",
                    stats
                        .residents_refreshed_at
                        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
                );
                println!("Size:       {} bytes", stats.db_size_bytes);
            }
        }
    }
    Ok(())
}

fn handle_areas(config: &Config, cmd: &AreasCommand) -> Result<()> {
    let cache = open_cache(config)?;
    let locations = cache.read_locations()?;
    let index = AreaIndex::from_locations(&locations);

    if let Some(municipality) = &cmd.municipality {
        let barangays = index.barangays_of(municipality);
        if cmd.json {
            println!("{}", serde_json::to_string_pretty(&barangays)?);
        } else if barangays.is_empty() {
            println!("No cached barangays for \"{municipality}\".");
        } else {
            for barangay in barangays {
                println!("{barangay}");
            }
        }
    } else {
        let municipalities = index.municipalities();
        if cmd.json {
            println!("{}", serde_json::to_string_pretty(&municipalities)?);
        } else if municipalities.is_empty() {
            println!("The location cache is empty.");
        } else {
            for municipality in municipalities {
                println!(
                    "{municipality} ({} barangays)",
                    index.barangays_of(municipality).len()
                );
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Cache]");
                println!("  Database path: {}", config.cache_path().display());
                println!();
                println!("[Snapshot]");
                println!(
                    "  Municipality:  {}",
                    config.snapshot.municipality.as_deref().unwrap_or("(all)")
                );
                println!(
                    "  Barangay:      {}",
                    config.snapshot.barangay.as_deref().unwrap_or("(all)")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
