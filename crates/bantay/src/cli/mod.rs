//! Command-line interface for the aggregation engine.
//!
//! This module provides the CLI structure and command handlers for the
//! `bantay` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{AreasCommand, CacheCommand, ConfigCommand, DashboardCommand};

/// bantay - Resident status dashboard for disaster response
///
/// Aggregates resident statuses, population counts, and evacuation center
/// occupancy for the active disaster event, with an offline fallback cache
/// for degraded connectivity in the field.
#[derive(Debug, Parser)]
#[command(name = "bantay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show population counts and center occupancy from the cached snapshot
    Dashboard(DashboardCommand),

    /// Inspect the offline fallback cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// List the municipalities and barangays of the covered region
    Areas(AreasCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
