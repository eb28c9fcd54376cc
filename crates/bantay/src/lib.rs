//! `bantay` - Resident status aggregation for disaster response
//!
//! This library resolves resident statuses from an append-only log, tallies
//! population counts and evacuation center occupancy for the active disaster
//! event, and keeps a local fallback cache for offline operation.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod snapshot;
pub mod store;

pub use aggregate::{CenterOccupancy, StatusCounts};
pub use cache::{CacheStats, FallbackCache};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{AreaFilter, AreaIndex, ResidentStatus, ResolvedStatus};
pub use snapshot::{Snapshot, SnapshotEngine, SnapshotOutcome};
pub use store::{ConnectivitySignal, RegistryStore, SharedConnectivity, StatusLogStore};
