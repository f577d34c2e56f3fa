//! SQLite storage for saved cities.
//!
//! Default location: ~/.weather-dashboard/saved_cities.db.
//! City names are unique regardless of case.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::geo::{Coordinate, InvalidCoordinate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("City already saved: {0}")]
    AlreadySaved(String),
    #[error("Saved city not found with id: {0}")]
    NotFound(i64),
    #[error("City name must not be empty")]
    EmptyName,
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),
}

/// A persisted city.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCity {
    pub id: i64,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl SavedCity {
    pub fn coordinate(&self) -> Result<Coordinate, InvalidCoordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

pub struct SavedCityStore {
    conn: Mutex<Connection>,
}

impl SavedCityStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".weather-dashboard")
            .join("saved_cities.db")
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS saved_cities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written in SQLite.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, name: &str, coord: Coordinate) -> Result<SavedCity, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.find_by_name(name)?.is_some() {
            return Err(StoreError::AlreadySaved(name.to_string()));
        }

        let created_at = Utc::now();
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT INTO saved_cities (city_name, latitude, longitude, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, coord.lat(), coord.lon(), created_at.to_rfc3339()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::AlreadySaved(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(SavedCity {
            id: conn.last_insert_rowid(),
            city_name: name.to_string(),
            latitude: coord.lat(),
            longitude: coord.lon(),
            created_at,
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<SavedCity>, StoreError> {
        let city = self
            .conn()
            .query_row(
                "SELECT id, city_name, latitude, longitude, created_at
                 FROM saved_cities WHERE city_name = ?1 COLLATE NOCASE",
                params![name.trim()],
                row_to_city,
            )
            .optional()?;
        Ok(city)
    }

    pub fn list(&self) -> Result<Vec<SavedCity>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, city_name, latitude, longitude, created_at
             FROM saved_cities ORDER BY id",
        )?;
        let cities = stmt
            .query_map([], row_to_city)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cities)
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM saved_cities WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

fn row_to_city(row: &rusqlite::Row) -> rusqlite::Result<SavedCity> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(SavedCity {
        id: row.get(0)?,
        city_name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_insert_and_list() {
        let store = SavedCityStore::in_memory().unwrap();
        let a = store.insert("Austin", coord(30.2672, -97.7431)).unwrap();
        let b = store.insert("  Oslo ", coord(59.9139, 10.7522)).unwrap();
        assert_eq!(b.city_name, "Oslo");
        assert!(b.id > a.id);

        let all = store.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].city_name, "Austin");
        assert_eq!(all[0].latitude, 30.2672);
        assert_eq!(all[1].city_name, "Oslo");
    }

    #[test]
    fn test_duplicate_name_any_case_rejected() {
        let store = SavedCityStore::in_memory().unwrap();
        store.insert("Paris", coord(48.8566, 2.3522)).unwrap();
        let err = store.insert("PARIS", coord(33.6609, -95.5555)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadySaved(ref n) if n == "PARIS"));
        assert_eq!(err.to_string(), "City already saved: PARIS");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = SavedCityStore::in_memory().unwrap();
        assert!(matches!(
            store.insert("   ", coord(0.0, 0.0)),
            Err(StoreError::EmptyName)
        ));
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let store = SavedCityStore::in_memory().unwrap();
        store.insert("Tromsø", coord(69.6492, 18.9553)).unwrap();
        store.insert("Cairo", coord(30.0444, 31.2357)).unwrap();
        let found = store.find_by_name("cairo").unwrap().unwrap();
        assert_eq!(found.city_name, "Cairo");
        assert!(store.find_by_name("Lima").unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let store = SavedCityStore::in_memory().unwrap();
        let city = store.insert("Lima", coord(-12.0464, -77.0428)).unwrap();
        store.delete(city.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.delete(city.id), Err(StoreError::NotFound(id)) if id == city.id));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("saved.db");
        {
            let store = SavedCityStore::open(&path).unwrap();
            store.insert("Stockholm", coord(59.3293, 18.0686)).unwrap();
        }
        let store = SavedCityStore::open(&path).unwrap();
        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].city_name, "Stockholm");
        assert_eq!(all[0].coordinate().unwrap(), coord(59.3293, 18.0686));
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let store = SavedCityStore::in_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO saved_cities (city_name, latitude, longitude, created_at)
                 VALUES ('Quito', -0.1807, -78.4678, 'yesterday')",
                [],
            )
            .unwrap();
        let err = store.list().unwrap_err();
        assert!(matches!(
            err,
            StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(4, _, _))
        ));
        assert!(matches!(store.find_by_name("quito"), Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn test_serializes_camel_case() {
        let store = SavedCityStore::in_memory().unwrap();
        let city = store.insert("Austin", coord(30.2672, -97.7431)).unwrap();
        let json = serde_json::to_value(&city).unwrap();
        assert_eq!(json["cityName"], "Austin");
        assert_eq!(json["latitude"], 30.2672);
        assert!(json.get("createdAt").is_some());
    }
}
