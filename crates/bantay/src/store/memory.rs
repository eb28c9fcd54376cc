//! In-memory store implementations.
//!
//! These back the engine in tests and demos. They honor the same contracts
//! as a hosted backend, including the ability to simulate fetch failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{
    AreaFilter, DisasterEvent, EvacuationCenter, EventStatus, Location, Resident, StatusLogEntry,
};
use crate::store::{RegistryStore, StatusLogStore};

/// In-memory registry store.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    events: RwLock<Vec<DisasterEvent>>,
    residents: RwLock<Vec<Resident>>,
    centers: RwLock<Vec<EvacuationCenter>>,
    locations: RwLock<Vec<Location>>,
    failing: AtomicBool,
}

impl MemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event.
    pub fn push_event(&self, event: DisasterEvent) {
        self.events.write().expect("lock poisoned").push(event);
    }

    /// Add a resident.
    pub fn push_resident(&self, resident: Resident) {
        self.residents.write().expect("lock poisoned").push(resident);
    }

    /// Add an evacuation center.
    pub fn push_center(&self, center: EvacuationCenter) {
        self.centers.write().expect("lock poisoned").push(center);
    }

    /// Add a location record.
    pub fn push_location(&self, location: Location) {
        self.locations.write().expect("lock poisoned").push(location);
    }

    /// Make every subsequent fetch fail, or stop doing so.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::registry_fetch("simulated registry outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistry {
    async fn active_event(&self) -> Result<Option<DisasterEvent>> {
        self.check()?;
        let events = self.events.read().expect("lock poisoned");
        Ok(events
            .iter()
            .find(|e| e.status == EventStatus::Active)
            .cloned())
    }

    async fn residents(&self, filter: &AreaFilter) -> Result<Vec<Resident>> {
        self.check()?;
        let residents = self.residents.read().expect("lock poisoned");
        Ok(residents
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn evacuation_centers(&self) -> Result<Vec<EvacuationCenter>> {
        self.check()?;
        Ok(self.centers.read().expect("lock poisoned").clone())
    }

    async fn locations(&self) -> Result<Vec<Location>> {
        self.check()?;
        Ok(self.locations.read().expect("lock poisoned").clone())
    }
}

/// In-memory append-only status log.
#[derive(Debug, Default)]
pub struct MemoryStatusLog {
    entries: RwLock<Vec<StatusLogEntry>>,
    next_sequence: RwLock<i64>,
    failing: AtomicBool,
}

impl MemoryStatusLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, assigning the next sequence id. Returns the id.
    pub fn append(
        &self,
        resident_id: &str,
        event_id: &str,
        status: crate::model::ResidentStatus,
        timestamp: &str,
        evac_center_id: Option<&str>,
    ) -> i64 {
        let mut next = self.next_sequence.write().expect("lock poisoned");
        *next += 1;
        let sequence = *next;
        self.entries
            .write()
            .expect("lock poisoned")
            .push(StatusLogEntry {
                sequence,
                resident_id: resident_id.to_string(),
                event_id: event_id.to_string(),
                status,
                timestamp: timestamp.to_string(),
                evac_center_id: evac_center_id.map(ToString::to_string),
            });
        sequence
    }

    /// Append a pre-built entry verbatim, keeping its sequence id.
    pub fn append_raw(&self, entry: StatusLogEntry) {
        self.entries.write().expect("lock poisoned").push(entry);
    }

    /// Make every subsequent fetch fail, or stop doing so.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusLogStore for MemoryStatusLog {
    async fn entries_for(
        &self,
        event_id: &str,
        resident_ids: &HashSet<String>,
    ) -> Result<Vec<StatusLogEntry>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::log_fetch("simulated log store outage"));
        }
        let entries = self.entries.read().expect("lock poisoned");
        Ok(entries
            .iter()
            .filter(|e| e.event_id == event_id && resident_ids.contains(&e.resident_id))
            .cloned()
            .collect())
    }
}
