//! Latest-status resolution.
//!
//! Reduces the append-only status log to one current status per resident:
//! the entry with the greatest timestamp wins; equal timestamps fall back to
//! the higher sequence id, so the result never depends on the order the
//! store returned the rows in.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{ResolvedStatus, StatusLogEntry};
use crate::store::StatusLogStore;

/// Resolve the current status of each resident in `resident_ids` for the
/// given event.
///
/// Issues a single bulk fetch against the log store. Residents with no log
/// rows are absent from the output; callers interpret absence as Unknown.
/// An empty id set short-circuits without touching the store.
///
/// # Errors
///
/// Returns a fetch failure if the log store errors, or
/// [`Error::InvalidTimestamp`] if any row carries a timestamp that does not
/// parse (the whole batch fails closed).
pub async fn resolve<L: StatusLogStore + ?Sized>(
    log: &L,
    resident_ids: &HashSet<String>,
    event_id: &str,
) -> Result<HashMap<String, ResolvedStatus>> {
    if resident_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let entries = log.entries_for(event_id, resident_ids).await?;
    debug!(
        rows = entries.len(),
        residents = resident_ids.len(),
        event = event_id,
        "reducing status log batch"
    );
    reduce_latest(&entries)
}

/// Pure reduction: latest timestamp per resident, ties broken by sequence id.
///
/// Deterministic for any input ordering of `entries`.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] on the first row whose timestamp does
/// not parse as RFC 3339.
pub fn reduce_latest(entries: &[StatusLogEntry]) -> Result<HashMap<String, ResolvedStatus>> {
    let mut resolved: HashMap<String, ResolvedStatus> = HashMap::new();

    for entry in entries {
        let timestamp = parse_timestamp(entry)?;
        let candidate = ResolvedStatus {
            status: entry.status,
            timestamp,
            sequence: entry.sequence,
            evac_center_id: entry.evac_center_id.clone(),
        };

        match resolved.get_mut(&entry.resident_id) {
            Some(current) => {
                if (candidate.timestamp, candidate.sequence)
                    > (current.timestamp, current.sequence)
                {
                    *current = candidate;
                }
            }
            None => {
                resolved.insert(entry.resident_id.clone(), candidate);
            }
        }
    }

    Ok(resolved)
}

fn parse_timestamp(entry: &StatusLogEntry) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp {
            resident_id: entry.resident_id.clone(),
            value: entry.timestamp.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResidentStatus;
    use crate::store::memory::MemoryStatusLog;

    fn entry(
        sequence: i64,
        resident_id: &str,
        status: ResidentStatus,
        timestamp: &str,
    ) -> StatusLogEntry {
        StatusLogEntry {
            sequence,
            resident_id: resident_id.to_string(),
            event_id: "e1".to_string(),
            status,
            timestamp: timestamp.to_string(),
            evac_center_id: None,
        }
    }

    fn ids(names: &[&str]) -> HashSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_reduce_empty() {
        let resolved = reduce_latest(&[]).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_reduce_latest_wins() {
        let entries = vec![
            entry(1, "r1", ResidentStatus::Safe, "2024-10-24T08:00:00Z"),
            entry(2, "r1", ResidentStatus::Evacuated, "2024-10-24T09:00:00Z"),
        ];
        let resolved = reduce_latest(&entries).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["r1"].status, ResidentStatus::Evacuated);
    }

    #[test]
    fn test_reduce_independent_of_input_order() {
        let a = entry(1, "r1", ResidentStatus::Safe, "2024-10-24T08:00:00Z");
        let b = entry(2, "r1", ResidentStatus::Injured, "2024-10-24T10:00:00Z");
        let c = entry(3, "r1", ResidentStatus::Evacuated, "2024-10-24T09:00:00Z");

        let forward = reduce_latest(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = reduce_latest(&[c, b, a]).unwrap();

        assert_eq!(forward["r1"].status, ResidentStatus::Injured);
        assert_eq!(forward["r1"], backward["r1"]);
    }

    #[test]
    fn test_reduce_tie_broken_by_sequence() {
        let ts = "2024-10-24T08:00:00Z";
        let entries = vec![
            entry(5, "r1", ResidentStatus::Missing, ts),
            entry(4, "r1", ResidentStatus::Safe, ts),
        ];
        let resolved = reduce_latest(&entries).unwrap();
        // Same timestamp: the higher sequence id (later append) wins.
        assert_eq!(resolved["r1"].status, ResidentStatus::Missing);

        let reversed = reduce_latest(&[
            entry(4, "r1", ResidentStatus::Safe, ts),
            entry(5, "r1", ResidentStatus::Missing, ts),
        ])
        .unwrap();
        assert_eq!(reversed["r1"].status, ResidentStatus::Missing);
    }

    #[test]
    fn test_reduce_handles_offset_timestamps() {
        // +08:00 is the local offset the field teams report in.
        let entries = vec![
            entry(1, "r1", ResidentStatus::Safe, "2024-10-24T16:00:00+08:00"),
            entry(2, "r1", ResidentStatus::Evacuated, "2024-10-24T08:30:00Z"),
        ];
        let resolved = reduce_latest(&entries).unwrap();
        // 16:00+08:00 is 08:00 UTC, before 08:30 UTC.
        assert_eq!(resolved["r1"].status, ResidentStatus::Evacuated);
    }

    #[test]
    fn test_reduce_malformed_timestamp_fails_whole_batch() {
        let entries = vec![
            entry(1, "r1", ResidentStatus::Safe, "2024-10-24T08:00:00Z"),
            entry(2, "r2", ResidentStatus::Safe, "yesterday"),
        ];
        let err = reduce_latest(&entries).unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn test_reduce_multiple_residents() {
        let entries = vec![
            entry(1, "r1", ResidentStatus::Safe, "2024-10-24T08:00:00Z"),
            entry(2, "r2", ResidentStatus::Missing, "2024-10-24T08:05:00Z"),
            entry(3, "r2", ResidentStatus::Safe, "2024-10-24T11:00:00Z"),
        ];
        let resolved = reduce_latest(&entries).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["r1"].status, ResidentStatus::Safe);
        assert_eq!(resolved["r2"].status, ResidentStatus::Safe);
    }

    #[test]
    fn test_reduce_carries_center_reference() {
        let mut e = entry(1, "r1", ResidentStatus::Evacuated, "2024-10-24T08:00:00Z");
        e.evac_center_id = Some("c1".to_string());
        let resolved = reduce_latest(&[e]).unwrap();
        assert_eq!(resolved["r1"].evac_center_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_resolve_empty_ids_skips_fetch() {
        let log = MemoryStatusLog::new();
        log.set_failing(true); // would error if the store were touched

        let resolved = resolve(&log, &HashSet::new(), "e1").await.unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_bulk() {
        let log = MemoryStatusLog::new();
        log.append("r1", "e1", ResidentStatus::Safe, "2024-10-24T08:00:00Z", None);
        log.append(
            "r1",
            "e1",
            ResidentStatus::Evacuated,
            "2024-10-24T09:00:00Z",
            Some("c1"),
        );
        log.append("r2", "e1", ResidentStatus::Missing, "2024-10-24T08:30:00Z", None);
        log.append("r3", "e1", ResidentStatus::Safe, "2024-10-24T08:30:00Z", None);

        let resolved = resolve(&log, &ids(&["r1", "r2"]), "e1").await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["r1"].status, ResidentStatus::Evacuated);
        assert_eq!(resolved["r1"].evac_center_id.as_deref(), Some("c1"));
        assert_eq!(resolved["r2"].status, ResidentStatus::Missing);
        // r3 was outside the requested set.
        assert!(!resolved.contains_key("r3"));
    }

    #[tokio::test]
    async fn test_resolve_surfaces_store_failure() {
        let log = MemoryStatusLog::new();
        log.set_failing(true);

        let err = resolve(&log, &ids(&["r1"]), "e1").await.unwrap_err();
        assert!(matches!(err, Error::LogFetch { .. }));
    }

    #[tokio::test]
    async fn test_resolve_malformed_timestamp_fails_closed() {
        let log = MemoryStatusLog::new();
        log.append("r1", "e1", ResidentStatus::Safe, "not-a-time", None);

        let err = resolve(&log, &ids(&["r1"]), "e1").await.unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));
    }
}
