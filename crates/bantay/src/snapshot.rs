//! The aggregation facade.
//!
//! [`SnapshotEngine`] is the one entry point callers use: it scopes to the
//! active event, resolves latest statuses, tallies population counts and
//! occupancy, and falls back to the local cache when offline. Callers never
//! assemble those steps themselves.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{self, CenterOccupancy, StatusCounts};
use crate::cache::FallbackCache;
use crate::error::Result;
use crate::model::{AreaFilter, DisasterEvent, EvacuationCenter, Resident};
use crate::resolver;
use crate::store::{ConnectivitySignal, RegistryStore, StatusLogStore};

/// One aggregated view of the filtered resident population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Number of residents in the filtered set.
    pub total_affected: u64,
    /// Per-status counts. Always sums to `total_affected`.
    pub counts: StatusCounts,
    /// Occupancy rows for evacuation centers worth showing.
    pub occupancy: Vec<CenterOccupancy>,
    /// True when this snapshot was served from the offline cache. Degraded
    /// snapshots place every resident in Unknown.
    pub degraded: bool,
}

/// Result of asking the engine for a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// A snapshot was produced.
    Ready {
        /// The active event the snapshot is scoped to. `None` in degraded
        /// mode, where the event cannot be fetched.
        event: Option<DisasterEvent>,
        /// The aggregated view.
        snapshot: Snapshot,
    },
    /// Online, reachable, but no event is currently active. There is nothing
    /// to aggregate.
    NoActiveEvent,
}

/// Build the degraded snapshot for a cached resident set.
///
/// With no reachable status log, every filtered resident is Unknown and the
/// occupancy report carries no evacuees. Exposed so the CLI can aggregate
/// straight off the cache without constructing an engine.
#[must_use]
pub fn degraded_snapshot(residents: &[Resident], filter: &AreaFilter) -> Snapshot {
    let total = residents.iter().filter(|r| filter.matches(r)).count() as u64;
    Snapshot {
        total_affected: total,
        counts: StatusCounts::all_unknown(total),
        occupancy: Vec::new(),
        degraded: true,
    }
}

/// The aggregation engine.
///
/// Owns read-only handles to the registry and status log, a connectivity
/// signal, and the fallback cache. Stateless between calls: every
/// [`snapshot`](Self::snapshot) re-reads its sources, so repeated calls over
/// unchanged data yield identical results.
#[derive(Debug)]
pub struct SnapshotEngine<R, L, C> {
    registry: R,
    log: L,
    connectivity: C,
    cache: FallbackCache,
}

impl<R, L, C> SnapshotEngine<R, L, C>
where
    R: RegistryStore,
    L: StatusLogStore,
    C: ConnectivitySignal,
{
    /// Assemble an engine from its four collaborators.
    #[must_use]
    pub fn new(registry: R, log: L, connectivity: C, cache: FallbackCache) -> Self {
        Self {
            registry,
            log,
            connectivity,
            cache,
        }
    }

    /// The fallback cache this engine reads and refreshes.
    #[must_use]
    pub fn cache(&self) -> &FallbackCache {
        &self.cache
    }

    /// Compute a snapshot for the given area filter.
    ///
    /// Online: fetches the active event, the filtered residents, and the
    /// center list, resolves statuses from the log, and refreshes the cache
    /// as a side effect. Offline: serves a degraded snapshot from the cache.
    ///
    /// # Errors
    ///
    /// Online fetch or resolution failures are returned as-is; they are not
    /// silently downgraded to a cached snapshot, because a stale answer
    /// presented as live would be worse than an error. Offline, only a cache
    /// read failure errors.
    pub async fn snapshot(&self, filter: &AreaFilter) -> Result<SnapshotOutcome> {
        if !self.connectivity.is_online() {
            return self.snapshot_from_cache(filter);
        }
        self.snapshot_online(filter).await
    }

    async fn snapshot_online(&self, filter: &AreaFilter) -> Result<SnapshotOutcome> {
        let Some(event) = self.registry.active_event().await? else {
            info!("no active event; nothing to aggregate");
            return Ok(SnapshotOutcome::NoActiveEvent);
        };

        // Residents and centers are independent reads; the log fetch needs
        // the resident id set, so it waits for both.
        let (residents, centers) = tokio::try_join!(
            self.registry.residents(filter),
            self.registry.evacuation_centers(),
        )?;

        let resident_ids: HashSet<String> = residents.iter().map(|r| r.id.clone()).collect();
        let resolved = resolver::resolve(&self.log, &resident_ids, &event.id).await?;

        let counts = StatusCounts::tally(&resident_ids, &resolved);
        let occupancy = aggregate::occupancy_report(&resolved, &centers);

        debug!(
            event = event.id.as_str(),
            affected = resident_ids.len(),
            resolved = resolved.len(),
            "snapshot computed"
        );

        self.refresh_cache(filter, &residents, &centers).await;

        Ok(SnapshotOutcome::Ready {
            event: Some(event),
            snapshot: Snapshot {
                total_affected: resident_ids.len() as u64,
                counts,
                occupancy,
                degraded: false,
            },
        })
    }

    fn snapshot_from_cache(&self, filter: &AreaFilter) -> Result<SnapshotOutcome> {
        let residents = self.cache.read_residents()?;
        info!(
            cached = residents.len(),
            "offline; serving degraded snapshot from cache"
        );
        Ok(SnapshotOutcome::Ready {
            event: None,
            snapshot: degraded_snapshot(&residents, filter),
        })
    }

    /// Refresh the cache from data already fetched. Best-effort: a refresh
    /// failure is logged, never surfaced, since the live snapshot already
    /// succeeded.
    ///
    /// The resident snapshot is only replaced on an unfiltered fetch; a
    /// filtered subset must not clobber the full cached population.
    async fn refresh_cache(
        &self,
        filter: &AreaFilter,
        residents: &[Resident],
        centers: &[EvacuationCenter],
    ) {
        if filter.is_unfiltered() {
            if let Err(e) = self.cache.replace_residents(residents) {
                warn!("resident cache refresh failed: {e}");
            }
        }
        if let Err(e) = self.cache.replace_centers(centers) {
            warn!("center cache refresh failed: {e}");
        }
        match self.registry.locations().await {
            Ok(locations) => {
                if let Err(e) = self.cache.replace_locations(&locations) {
                    warn!("location cache refresh failed: {e}");
                }
            }
            Err(e) => warn!("location fetch for cache refresh failed: {e}"),
        }
    }
}
