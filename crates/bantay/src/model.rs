//! Core domain types for the aggregation engine.
//!
//! These mirror the registry and status-log records owned by the hosted
//! backend. The engine never mutates them; it only reads and reduces.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resident's reported status within a disaster event.
///
/// These are the five values that can appear in the status log. The derived
/// "Unknown" bucket (no log entry at all) is intentionally not part of this
/// enum; it exists only in [`crate::aggregate::StatusCounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResidentStatus {
    /// Confirmed safe at their residence.
    Safe,
    /// Relocated to an evacuation center.
    Evacuated,
    /// Injured and receiving (or needing) care.
    Injured,
    /// Unaccounted for.
    Missing,
    /// Confirmed deceased.
    Deceased,
}

impl std::fmt::Display for ResidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Evacuated => write!(f, "Evacuated"),
            Self::Injured => write!(f, "Injured"),
            Self::Missing => write!(f, "Missing"),
            Self::Deceased => write!(f, "Deceased"),
        }
    }
}

/// Biological sex as recorded in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    /// Male.
    #[serde(rename = "M")]
    Male,
    /// Female.
    #[serde(rename = "F")]
    Female,
    /// Other / not disclosed.
    #[serde(rename = "O")]
    Other,
}

/// A registered resident.
///
/// Owned by the registry store; immutable from the engine's perspective.
/// Live status is deliberately absent here: it is derived from the status
/// log, never carried on the registry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    /// Opaque identifier assigned by the registry.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    /// Age in years, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Sex, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Municipality of residence.
    pub municipality: String,
    /// Barangay of residence.
    pub barangay: String,
    /// Purok (sub-barangay zone), if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purok: Option<String>,
    /// Street address, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    /// Person-with-disability flag.
    #[serde(default)]
    pub is_pwd: bool,
    /// Whether this resident heads their family unit.
    #[serde(default)]
    pub is_head_of_family: bool,
    /// Name of the family head, for members of a family unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_of_family_name: Option<String>,
}

impl Resident {
    /// Full display name, family name last.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lifecycle status of a disaster event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Currently accepting status updates and incident reports.
    Active,
    /// Being watched but not yet (or no longer) active.
    Monitoring,
    /// Closed out.
    Resolved,
}

/// Category of disaster event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Tropical storm or typhoon.
    Storm,
    /// Fire.
    Fire,
    /// Landslide.
    Landslide,
    /// Earthquake.
    Earthquake,
    /// Flood.
    Flood,
    /// Anything else.
    Other,
}

/// The administrative areas an event affects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedArea {
    /// Affected municipalities.
    pub municipalities: Vec<String>,
    /// Affected barangays.
    pub barangays: Vec<String>,
}

/// A disaster event. At most one event is [`EventStatus::Active`] at a time,
/// and every aggregation is scoped to that one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterEvent {
    /// Opaque identifier.
    pub id: String,
    /// Human-readable name, e.g. "Typhoon Kristine".
    pub name: String,
    /// Category of the event.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Area scope of the event.
    #[serde(default)]
    pub affected_area: AffectedArea,
}

/// An evacuation center record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationCenter {
    /// Opaque identifier.
    pub id: String,
    /// Center name.
    pub name: String,
    /// Barangay the center is located in.
    pub barangay: String,
    /// Street address, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Latitude, if geotagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude, if geotagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Rated capacity in persons. Occupancy above this is reportable, not
    /// an error.
    pub capacity: u32,
}

/// One row of the append-only status log, as returned by the log store.
///
/// The timestamp is kept in its RFC 3339 wire form; parsing happens in the
/// resolver so that a malformed value fails the whole batch instead of being
/// silently mis-ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    /// Monotonic sequence id assigned at append time. Breaks timestamp ties.
    pub sequence: i64,
    /// The resident this entry is about.
    pub resident_id: String,
    /// The event this entry is scoped to.
    pub event_id: String,
    /// Reported status.
    pub status: ResidentStatus,
    /// When the status was reported, RFC 3339.
    pub timestamp: String,
    /// Evacuation center, for `Evacuated` entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evac_center_id: Option<String>,
}

/// A resident's current truth, derived by the resolver.
///
/// Exactly one of these exists per resident with at least one log row in the
/// scoped event; residents with no rows have no entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStatus {
    /// The winning status.
    pub status: ResidentStatus,
    /// Timestamp of the winning entry.
    pub timestamp: DateTime<Utc>,
    /// Sequence id of the winning entry.
    pub sequence: i64,
    /// Evacuation center carried by the winning entry, if any.
    pub evac_center_id: Option<String>,
}

/// A (municipality, barangay) pair from the location lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Municipality name.
    pub municipality: String,
    /// Barangay name. Unique across the table.
    pub barangay: String,
}

/// Administrative-area scoping applied to the resident set before
/// aggregation. Both fields are exact-match and optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaFilter {
    /// Restrict to one municipality.
    pub municipality: Option<String>,
    /// Restrict to one barangay.
    pub barangay: Option<String>,
}

impl AreaFilter {
    /// A filter that matches every resident.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether this filter matches every resident.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.municipality.is_none() && self.barangay.is_none()
    }

    /// Whether the given resident falls inside this filter.
    #[must_use]
    pub fn matches(&self, resident: &Resident) -> bool {
        if let Some(m) = &self.municipality {
            if &resident.municipality != m {
                return false;
            }
        }
        if let Some(b) = &self.barangay {
            if &resident.barangay != b {
                return false;
            }
        }
        true
    }
}

/// Lookup table over the (municipality, barangay) pairs of the covered
/// region. A barangay name uniquely determines its municipality.
#[derive(Debug, Clone, Default)]
pub struct AreaIndex {
    by_barangay: HashMap<String, String>,
    by_municipality: BTreeMap<String, BTreeSet<String>>,
}

impl AreaIndex {
    /// Build an index from location records. Duplicate pairs are collapsed.
    #[must_use]
    pub fn from_locations(locations: &[Location]) -> Self {
        let mut index = Self::default();
        for loc in locations {
            index
                .by_barangay
                .insert(loc.barangay.clone(), loc.municipality.clone());
            index
                .by_municipality
                .entry(loc.municipality.clone())
                .or_default()
                .insert(loc.barangay.clone());
        }
        index
    }

    /// The municipality a barangay belongs to, if known.
    #[must_use]
    pub fn municipality_of(&self, barangay: &str) -> Option<&str> {
        self.by_barangay.get(barangay).map(String::as_str)
    }

    /// Whether the barangay appears in the table.
    #[must_use]
    pub fn contains_barangay(&self, barangay: &str) -> bool {
        self.by_barangay.contains_key(barangay)
    }

    /// All municipalities, sorted.
    #[must_use]
    pub fn municipalities(&self) -> Vec<&str> {
        self.by_municipality.keys().map(String::as_str).collect()
    }

    /// The barangays of a municipality, sorted. Empty if unknown.
    #[must_use]
    pub fn barangays_of(&self, municipality: &str) -> Vec<&str> {
        self.by_municipality
            .get(municipality)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of barangays in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_barangay.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_barangay.is_empty()
    }
}
