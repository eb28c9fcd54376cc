//! Offline fallback cache.
//!
//! A local `SQLite` snapshot of the registry (residents, evacuation centers,
//! location table), consulted when connectivity is unavailable. Each snapshot
//! is replaced wholesale on a successful online fetch; there is no
//! incremental merge and no expiry. Live status is never cached; the log is
//! the only system of record for status, so offline reads always surface
//! residents with no status at all.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{EvacuationCenter, Location, Resident, Sex};

/// Metadata key recording when the resident snapshot was last replaced.
const RESIDENTS_REFRESHED_KEY: &str = "residents_refreshed_at";

/// Metadata key recording when the center snapshot was last replaced.
const CENTERS_REFRESHED_KEY: &str = "centers_refreshed_at";

/// The local fallback snapshot store.
///
/// Single writer (the engine's online path), multiple readers. Replacement
/// runs inside one transaction, so a concurrent reader observes either the
/// old snapshot or the new one, never a mix.
#[derive(Debug)]
pub struct FallbackCache {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection, serialized behind a mutex.
    conn: Mutex<Connection>,
}

impl FallbackCache {
    /// Open or create a fallback cache at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening fallback cache at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::CacheOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps readers unblocked while a snapshot is being replaced
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Fallback cache opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::CacheOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("fallback cache lock poisoned"))
    }

    /// Replace the resident snapshot wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; the previous snapshot is
    /// left intact in that case.
    pub fn replace_residents(&self, residents: &[Resident]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM residents_snapshot", [])?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO residents_snapshot
                    (id, first_name, last_name, dob, age, sex, municipality, barangay,
                     purok, street, is_pwd, is_head_of_family, head_of_family_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ",
            )?;
            for r in residents {
                stmt.execute(params![
                    r.id,
                    r.first_name,
                    r.last_name,
                    r.dob,
                    r.age,
                    r.sex.map(sex_to_str),
                    r.municipality,
                    r.barangay,
                    r.purok,
                    r.street,
                    r.is_pwd,
                    r.is_head_of_family,
                    r.head_of_family_name,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![RESIDENTS_REFRESHED_KEY, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        info!("Replaced resident snapshot with {} records", residents.len());
        Ok(())
    }

    /// Replace the evacuation center snapshot wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn replace_centers(&self, centers: &[EvacuationCenter]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM centers_snapshot", [])?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO centers_snapshot
                    (id, name, barangay, address, latitude, longitude, capacity)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )?;
            for c in centers {
                stmt.execute(params![
                    c.id,
                    c.name,
                    c.barangay,
                    c.address,
                    c.latitude,
                    c.longitude,
                    c.capacity,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![CENTERS_REFRESHED_KEY, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        info!("Replaced center snapshot with {} records", centers.len());
        Ok(())
    }

    /// Replace the location lookup snapshot wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn replace_locations(&self, locations: &[Location]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM locations_snapshot", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO locations_snapshot (barangay, municipality) VALUES (?1, ?2)",
            )?;
            for loc in locations {
                stmt.execute(params![loc.barangay, loc.municipality])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Read the cached resident snapshot, ordered by family name.
    ///
    /// The returned records carry registry fields only; status is not part
    /// of the snapshot and must be presented as Unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn read_residents(&self) -> Result<Vec<Resident>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, first_name, last_name, dob, age, sex, municipality, barangay,
                   purok, street, is_pwd, is_head_of_family, head_of_family_name
            FROM residents_snapshot ORDER BY last_name, first_name
            ",
        )?;

        let residents = stmt
            .query_map([], Self::row_to_resident)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(residents)
    }

    /// Read the cached evacuation center snapshot, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn read_centers(&self) -> Result<Vec<EvacuationCenter>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, name, barangay, address, latitude, longitude, capacity
            FROM centers_snapshot ORDER BY name
            ",
        )?;

        let centers = stmt
            .query_map([], Self::row_to_center)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(centers)
    }

    /// Read the cached location lookup table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn read_locations(&self) -> Result<Vec<Location>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT municipality, barangay FROM locations_snapshot ORDER BY municipality, barangay",
        )?;

        let locations = stmt
            .query_map([], |row| {
                Ok(Location {
                    municipality: row.get(0)?,
                    barangay: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    /// Get cache statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.lock()?;

        let resident_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM residents_snapshot", [], |row| row.get(0))?;
        let center_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM centers_snapshot", [], |row| row.get(0))?;
        let location_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM locations_snapshot", [], |row| row.get(0))?;

        let residents_refreshed_at = Self::read_refreshed_at(&conn, RESIDENTS_REFRESHED_KEY)?;
        let centers_refreshed_at = Self::read_refreshed_at(&conn, CENTERS_REFRESHED_KEY)?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(CacheStats {
            resident_rows,
            center_rows,
            location_rows,
            residents_refreshed_at,
            centers_refreshed_at,
            db_size_bytes,
        })
    }

    fn read_refreshed_at(conn: &Connection, key: &str) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(value
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Convert a database row to a Resident.
    fn row_to_resident(row: &rusqlite::Row) -> rusqlite::Result<Resident> {
        let sex_str: Option<String> = row.get(5)?;
        let sex = sex_str.as_deref().and_then(|s| match s {
            "M" => Some(Sex::Male),
            "F" => Some(Sex::Female),
            "O" => Some(Sex::Other),
            other => {
                warn!("Unknown sex code in cache: {}", other);
                None
            }
        });

        Ok(Resident {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            dob: row.get(3)?,
            age: row.get(4)?,
            sex,
            municipality: row.get(6)?,
            barangay: row.get(7)?,
            purok: row.get(8)?,
            street: row.get(9)?,
            is_pwd: row.get(10)?,
            is_head_of_family: row.get(11)?,
            head_of_family_name: row.get(12)?,
        })
    }

    /// Convert a database row to an `EvacuationCenter`.
    fn row_to_center(row: &rusqlite::Row) -> rusqlite::Result<EvacuationCenter> {
        Ok(EvacuationCenter {
            id: row.get(0)?,
            name: row.get(1)?,
            barangay: row.get(2)?,
            address: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            capacity: row.get(6)?,
        })
    }
}

fn sex_to_str(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => "M",
        Sex::Female => "F",
        Sex::Other => "O",
    }
}

/// Statistics about the fallback cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of residents in the snapshot.
    pub resident_rows: i64,
    /// Number of evacuation centers in the snapshot.
    pub center_rows: i64,
    /// Number of location records in the snapshot.
    pub location_rows: i64,
    /// When the resident snapshot was last replaced.
    pub residents_refreshed_at: Option<DateTime<Utc>>,
    /// When the center snapshot was last replaced.
    pub centers_refreshed_at: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
