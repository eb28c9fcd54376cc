//! Population and occupancy aggregation.
//!
//! Pure functions over resolved statuses. Population counts always close to
//! the size of the input resident set (Unknown is the closing balance);
//! occupancy joins evacuee tallies onto the center list.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{EvacuationCenter, ResidentStatus, ResolvedStatus};

/// Per-status population counts for one filtered resident set.
///
/// Five stored statuses plus the derived Unknown bucket. The serialized form
/// uses the status names as keys, matching the caller-facing result shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Residents confirmed safe.
    #[serde(rename = "Safe")]
    pub safe: u64,
    /// Residents in an evacuation center.
    #[serde(rename = "Evacuated")]
    pub evacuated: u64,
    /// Residents injured.
    #[serde(rename = "Injured")]
    pub injured: u64,
    /// Residents unaccounted for.
    #[serde(rename = "Missing")]
    pub missing: u64,
    /// Residents confirmed deceased.
    #[serde(rename = "Deceased")]
    pub deceased: u64,
    /// Residents with no log entry in the scoped event.
    #[serde(rename = "Unknown")]
    pub unknown: u64,
}

impl StatusCounts {
    /// Tally one bucket per resident in `resident_ids`.
    ///
    /// Residents present in `resolved` land in their status bucket; the rest
    /// land in Unknown. Extraneous resolved entries (ids outside the set)
    /// are ignored, so `total()` always equals `resident_ids.len()`.
    #[must_use]
    pub fn tally(resident_ids: &HashSet<String>, resolved: &HashMap<String, ResolvedStatus>) -> Self {
        let mut counts = Self::default();
        for id in resident_ids {
            match resolved.get(id) {
                Some(r) => counts.bump(r.status),
                None => counts.unknown += 1,
            }
        }
        counts
    }

    /// A count set where every one of `total` residents is Unknown.
    ///
    /// This is the degraded-mode shape: the fallback cache never holds live
    /// status, so offline aggregation cannot place anyone elsewhere.
    #[must_use]
    pub fn all_unknown(total: u64) -> Self {
        Self {
            unknown: total,
            ..Self::default()
        }
    }

    /// Sum of all six buckets.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.safe + self.evacuated + self.injured + self.missing + self.deceased + self.unknown
    }

    fn bump(&mut self, status: ResidentStatus) {
        match status {
            ResidentStatus::Safe => self.safe += 1,
            ResidentStatus::Evacuated => self.evacuated += 1,
            ResidentStatus::Injured => self.injured += 1,
            ResidentStatus::Missing => self.missing += 1,
            ResidentStatus::Deceased => self.deceased += 1,
        }
    }
}

/// One row of the occupancy report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterOccupancy {
    /// Center identifier.
    pub center_id: String,
    /// Center name.
    pub center_name: String,
    /// Number of residents currently resolved as evacuated to this center.
    pub occupancy: u64,
    /// Rated capacity. Occupancy above capacity is a reportable fact, not
    /// an error.
    pub capacity: u32,
}

/// Build the occupancy report: evacuee tallies joined onto the center list.
///
/// Only residents whose resolved status is exactly `Evacuated` and who carry
/// a center reference count toward occupancy. Rows with zero occupancy and
/// zero capacity are dropped; everything else is retained so over-capacity
/// and data-entry oddities stay visible. Center references that don't match
/// the current center list are treated as stale and excluded.
#[must_use]
pub fn occupancy_report(
    resolved: &HashMap<String, ResolvedStatus>,
    centers: &[EvacuationCenter],
) -> Vec<CenterOccupancy> {
    let mut tally: HashMap<&str, u64> = HashMap::new();
    for (resident_id, status) in resolved {
        let Some(center_id) = status.evac_center_id.as_deref() else {
            continue;
        };
        if status.status == ResidentStatus::Evacuated {
            *tally.entry(center_id).or_insert(0) += 1;
        } else {
            debug!(
                resident = resident_id.as_str(),
                center = center_id,
                status = %status.status,
                "ignoring center reference on non-evacuated status"
            );
        }
    }

    let known: HashSet<&str> = centers.iter().map(|c| c.id.as_str()).collect();
    for center_id in tally.keys() {
        if !known.contains(center_id) {
            debug!(center = *center_id, "stale center reference excluded from occupancy");
        }
    }

    centers
        .iter()
        .map(|center| CenterOccupancy {
            center_id: center.id.clone(),
            center_name: center.name.clone(),
            occupancy: tally.get(center.id.as_str()).copied().unwrap_or(0),
            capacity: center.capacity,
        })
        .filter(|row| row.capacity > 0 || row.occupancy > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn resolved(status: ResidentStatus, center: Option<&str>) -> ResolvedStatus {
        ResolvedStatus {
            status,
            timestamp: Utc.with_ymd_and_hms(2024, 10, 24, 8, 0, 0).unwrap(),
            sequence: 1,
            evac_center_id: center.map(ToString::to_string),
        }
    }

    fn ids(names: &[&str]) -> HashSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn center(id: &str, name: &str, capacity: u32) -> EvacuationCenter {
        EvacuationCenter {
            id: id.to_string(),
            name: name.to_string(),
            barangay: "Baligang".to_string(),
            address: None,
            latitude: None,
            longitude: None,
            capacity,
        }
    }

    #[test]
    fn test_tally_empty_set() {
        let counts = StatusCounts::tally(&HashSet::new(), &HashMap::new());
        assert_eq!(counts, StatusCounts::default());
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_tally_all_unresolved_is_unknown() {
        let counts = StatusCounts::tally(&ids(&["r1", "r2", "r3"]), &HashMap::new());
        assert_eq!(counts.unknown, 3);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_tally_mixed_statuses() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert("r1".to_string(), resolved(ResidentStatus::Safe, None));
        resolved_map.insert(
            "r2".to_string(),
            resolved(ResidentStatus::Evacuated, Some("c1")),
        );
        resolved_map.insert("r3".to_string(), resolved(ResidentStatus::Deceased, None));

        let counts = StatusCounts::tally(&ids(&["r1", "r2", "r3", "r4", "r5"]), &resolved_map);
        assert_eq!(counts.safe, 1);
        assert_eq!(counts.evacuated, 1);
        assert_eq!(counts.deceased, 1);
        assert_eq!(counts.unknown, 2);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_tally_ignores_extraneous_resolved_entries() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert("ghost".to_string(), resolved(ResidentStatus::Safe, None));

        let counts = StatusCounts::tally(&ids(&["r1"]), &resolved_map);
        assert_eq!(counts.safe, 0);
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_tally_sum_invariant_holds_for_every_bucket() {
        let mut resolved_map = HashMap::new();
        for (i, status) in [
            ResidentStatus::Safe,
            ResidentStatus::Evacuated,
            ResidentStatus::Injured,
            ResidentStatus::Missing,
            ResidentStatus::Deceased,
        ]
        .iter()
        .enumerate()
        {
            resolved_map.insert(format!("r{i}"), resolved(*status, None));
        }
        let set = ids(&["r0", "r1", "r2", "r3", "r4", "r5"]);

        let counts = StatusCounts::tally(&set, &resolved_map);
        assert_eq!(counts.total() as usize, set.len());
        assert_eq!(counts.unknown, 1);
    }

    #[test]
    fn test_all_unknown() {
        let counts = StatusCounts::all_unknown(7);
        assert_eq!(counts.unknown, 7);
        assert_eq!(counts.total(), 7);
    }

    #[test]
    fn test_counts_serialize_with_status_keys() {
        let counts = StatusCounts::all_unknown(2);
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["Unknown"], 2);
        assert_eq!(json["Safe"], 0);
        assert_eq!(json["Deceased"], 0);
    }

    #[test]
    fn test_occupancy_counts_evacuated_with_center() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert(
            "r1".to_string(),
            resolved(ResidentStatus::Evacuated, Some("c1")),
        );
        resolved_map.insert(
            "r2".to_string(),
            resolved(ResidentStatus::Evacuated, Some("c1")),
        );

        let rows = occupancy_report(&resolved_map, &[center("c1", "Camalig NHS", 10)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].occupancy, 2);
        assert_eq!(rows[0].capacity, 10);
    }

    #[test]
    fn test_occupancy_skips_evacuated_without_center() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert("r1".to_string(), resolved(ResidentStatus::Evacuated, None));

        let rows = occupancy_report(&resolved_map, &[center("c1", "Camalig NHS", 10)]);
        assert_eq!(rows[0].occupancy, 0);
    }

    #[test]
    fn test_occupancy_ignores_center_ref_on_non_evacuated() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert("r1".to_string(), resolved(ResidentStatus::Safe, Some("c1")));

        let rows = occupancy_report(&resolved_map, &[center("c1", "Camalig NHS", 10)]);
        assert_eq!(rows[0].occupancy, 0);
    }

    #[test]
    fn test_occupancy_drops_zero_zero_rows() {
        let rows = occupancy_report(
            &HashMap::new(),
            &[
                center("c1", "Unstocked Hall", 0),
                center("c2", "Camalig NHS", 25),
            ],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].center_id, "c2");
    }

    #[test]
    fn test_occupancy_keeps_zero_capacity_with_occupants() {
        // Capacity 0 is usually a data-entry gap; occupants there must not
        // vanish from the report.
        let mut resolved_map = HashMap::new();
        resolved_map.insert(
            "r1".to_string(),
            resolved(ResidentStatus::Evacuated, Some("c1")),
        );

        let rows = occupancy_report(&resolved_map, &[center("c1", "Unstocked Hall", 0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].occupancy, 1);
        assert_eq!(rows[0].capacity, 0);
    }

    #[test]
    fn test_occupancy_over_capacity_is_reported() {
        let mut resolved_map = HashMap::new();
        for i in 0..3 {
            resolved_map.insert(
                format!("r{i}"),
                resolved(ResidentStatus::Evacuated, Some("c1")),
            );
        }

        let rows = occupancy_report(&resolved_map, &[center("c1", "Small Chapel", 2)]);
        assert_eq!(rows[0].occupancy, 3);
        assert_eq!(rows[0].capacity, 2);
    }

    #[test]
    fn test_occupancy_excludes_stale_center_references() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert(
            "r1".to_string(),
            resolved(ResidentStatus::Evacuated, Some("deleted-center")),
        );

        let rows = occupancy_report(&resolved_map, &[center("c1", "Camalig NHS", 10)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].center_id, "c1");
        assert_eq!(rows[0].occupancy, 0);
    }

    #[test]
    fn test_occupancy_preserves_center_list_order() {
        let mut resolved_map = HashMap::new();
        resolved_map.insert(
            "r1".to_string(),
            resolved(ResidentStatus::Evacuated, Some("c2")),
        );

        let rows = occupancy_report(
            &resolved_map,
            &[center("c1", "First", 5), center("c2", "Second", 5)],
        );
        assert_eq!(rows[0].center_id, "c1");
        assert_eq!(rows[1].center_id, "c2");
    }

    #[test]
    fn test_occupancy_row_serializes_camel_case() {
        let row = CenterOccupancy {
            center_id: "c1".to_string(),
            center_name: "Camalig NHS".to_string(),
            occupancy: 3,
            capacity: 10,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["centerName"], "Camalig NHS");
        assert_eq!(json["centerId"], "c1");
        assert_eq!(json["occupancy"], 3);
    }
}
