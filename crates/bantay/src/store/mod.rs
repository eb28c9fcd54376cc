//! Store seams for the aggregation engine.
//!
//! The registry and the status log live in a hosted backend; the engine only
//! ever reads them, through these traits. Injecting the traits (rather than
//! sharing one global client) lets the engine run against the in-memory
//! implementations in [`memory`] for tests and demos.

pub mod memory;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AreaFilter, DisasterEvent, EvacuationCenter, Location, Resident, StatusLogEntry};

/// Read access to the resident registry, evacuation centers, events, and the
/// location lookup table.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// The single active event, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a fetch failure if the store is unreachable or errors.
    async fn active_event(&self) -> Result<Option<DisasterEvent>>;

    /// Residents matching the given area filter.
    ///
    /// # Errors
    ///
    /// Returns a fetch failure if the store is unreachable or errors.
    async fn residents(&self, filter: &AreaFilter) -> Result<Vec<Resident>>;

    /// All evacuation centers, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns a fetch failure if the store is unreachable or errors.
    async fn evacuation_centers(&self) -> Result<Vec<EvacuationCenter>>;

    /// The (municipality, barangay) lookup table.
    ///
    /// # Errors
    ///
    /// Returns a fetch failure if the store is unreachable or errors.
    async fn locations(&self) -> Result<Vec<Location>>;
}

/// Read access to the append-only status log.
#[async_trait]
pub trait StatusLogStore: Send + Sync {
    /// All log rows for the given event restricted to the given residents.
    ///
    /// One bulk fetch; implementations must not degenerate into one query
    /// per resident.
    ///
    /// # Errors
    ///
    /// Returns a fetch failure if the store is unreachable or errors.
    async fn entries_for(
        &self,
        event_id: &str,
        resident_ids: &HashSet<String>,
    ) -> Result<Vec<StatusLogEntry>>;
}

/// Connectivity signal, externally driven and polled at call time.
///
/// The engine does not own network probing; whoever constructs it decides
/// what "online" means.
pub trait ConnectivitySignal: Send + Sync {
    /// Whether the hosted backend is currently reachable.
    fn is_online(&self) -> bool;
}

/// A cloneable connectivity flag backed by an atomic.
///
/// Useful when one part of the application observes network state and
/// another computes snapshots.
#[derive(Debug, Clone)]
pub struct SharedConnectivity {
    online: Arc<AtomicBool>,
}

impl SharedConnectivity {
    /// Create a signal with the given initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Flip the signal.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivitySignal for SharedConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
