//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Restrict counts to one municipality
    #[arg(short, long)]
    pub municipality: Option<String>,

    /// Restrict counts to one barangay
    #[arg(short, long)]
    pub barangay: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Fallback cache commands.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show cache contents and freshness
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Areas command arguments.
#[derive(Debug, Args)]
pub struct AreasCommand {
    /// List the barangays of one municipality instead of all municipalities
    #[arg(short, long)]
    pub municipality: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
