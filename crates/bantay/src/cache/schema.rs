//! `SQLite` schema definitions for the fallback cache.
//!
//! SQL statements for creating and managing the snapshot tables.

/// SQL statement to create the resident snapshot table.
pub const CREATE_RESIDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS residents_snapshot (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    dob TEXT,
    age INTEGER,
    sex TEXT,
    municipality TEXT NOT NULL,
    barangay TEXT NOT NULL,
    purok TEXT,
    street TEXT,
    is_pwd INTEGER NOT NULL DEFAULT 0,
    is_head_of_family INTEGER NOT NULL DEFAULT 0,
    head_of_family_name TEXT
)
";

/// SQL statement to create an index on municipality for area filtering.
pub const CREATE_MUNICIPALITY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_residents_municipality ON residents_snapshot(municipality)
";

/// SQL statement to create an index on barangay for area filtering.
pub const CREATE_BARANGAY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_residents_barangay ON residents_snapshot(barangay)
";

/// SQL statement to create the evacuation center snapshot table.
pub const CREATE_CENTERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS centers_snapshot (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    barangay TEXT NOT NULL,
    address TEXT,
    latitude REAL,
    longitude REAL,
    capacity INTEGER NOT NULL
)
";

/// SQL statement to create the location lookup snapshot table.
///
/// Barangay is the primary key: a barangay name uniquely determines its
/// municipality.
pub const CREATE_LOCATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS locations_snapshot (
    barangay TEXT PRIMARY KEY,
    municipality TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RESIDENTS_TABLE,
    CREATE_MUNICIPALITY_INDEX,
    CREATE_BARANGAY_INDEX,
    CREATE_CENTERS_TABLE,
    CREATE_LOCATIONS_TABLE,
    CREATE_METADATA_TABLE,
];
