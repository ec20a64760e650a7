//! Durable key/value cache for the assistant
//!
//! Holds the current user's display name and this device's identifier so
//! both survive restarts.

use crate::db::DbPool;
use crate::{Error, Result};

/// Cache key for the user's display name
pub const USERNAME_KEY: &str = "username";

/// Cache key for the generated device identifier
pub const DEVICE_ID_KEY: &str = "device_id";

/// `SQLite`-backed key/value cache
#[derive(Clone)]
pub struct LocalCache {
    db: DbPool,
}

impl LocalCache {
    /// Create a cache backed by the given pool
    #[must_use]
    pub const fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Read a value, or `None` if the key is absent
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.get().map_err(|e| Error::Database(e.to_string()))?;
        let result = conn.query_row(
            "SELECT value FROM kv_cache WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    /// Insert or replace a value
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.get().map_err(|e| Error::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO kv_cache (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a value; removing an absent key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.db.get().map_err(|e| Error::Database(e.to_string()))?;
        conn.execute("DELETE FROM kv_cache WHERE key = ?1", rusqlite::params![key])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Cached user name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn user_name(&self) -> Result<Option<String>> {
        self.get(USERNAME_KEY)
    }

    /// Store the user name
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn set_user_name(&self, name: &str) -> Result<()> {
        self.set(USERNAME_KEY, name)
    }

    /// Forget the user name
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn clear_user_name(&self) -> Result<()> {
        self.remove(USERNAME_KEY)
    }

    /// This device's identifier, generated on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or write fails.
    pub fn device_id(&self) -> Result<String> {
        if let Some(id) = self.get(DEVICE_ID_KEY)? {
            return Ok(id);
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.set(DEVICE_ID_KEY, &id)?;
        tracing::info!(device_id = %id, "generated device id");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn setup() -> LocalCache {
        LocalCache::new(init_memory().unwrap())
    }

    #[test]
    fn test_user_name_lifecycle() {
        let cache = setup();
        assert!(cache.user_name().unwrap().is_none());

        cache.set_user_name("Alex").unwrap();
        assert_eq!(cache.user_name().unwrap().as_deref(), Some("Alex"));

        cache.set_user_name("Sam").unwrap();
        assert_eq!(cache.user_name().unwrap().as_deref(), Some("Sam"));

        cache.clear_user_name().unwrap();
        assert!(cache.user_name().unwrap().is_none());

        // Clearing twice is fine
        cache.clear_user_name().unwrap();
    }

    #[test]
    fn test_device_id_is_stable() {
        let cache = setup();
        let first = cache.device_id().unwrap();
        let second = cache.device_id().unwrap();
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assistant.db");

        LocalCache::new(crate::db::init(&path).unwrap())
            .set_user_name("Priya")
            .unwrap();

        let reopened = LocalCache::new(crate::db::init(&path).unwrap());
        assert_eq!(reopened.user_name().unwrap().as_deref(), Some("Priya"));
    }
}
