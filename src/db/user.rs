//! User repository: names and spoken commands keyed by device

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::DbPool;
use crate::{Error, Result};

/// A user and the commands they have spoken
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub device_id: String,
    pub name: String,
    pub last_command: Option<String>,
    pub commands: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User repository
#[derive(Clone)]
pub struct UserRepo {
    pool: DbPool,
}

impl UserRepo {
    /// Create a new user repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the user for a device, or rename it if it exists
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn save(&self, device_id: &str, name: &str) -> Result<User> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (device_id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(device_id) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at",
            [device_id, name, &now],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        self.find(device_id)?
            .ok_or_else(|| Error::NotFound(format!("user {device_id}")))
    }

    /// Find a user by device ID (returns None if not found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, device_id: &str) -> Result<Option<User>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let row = conn.query_row(
            "SELECT device_id, name, last_command, created_at, updated_at
             FROM users WHERE device_id = ?1",
            [device_id],
            |row| {
                Ok(User {
                    device_id: row.get(0)?,
                    name: row.get(1)?,
                    last_command: row.get(2)?,
                    commands: Vec::new(),
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        );

        let mut user = match row {
            Ok(user) => user,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(Error::Database(e.to_string())),
        };

        let mut stmt = conn
            .prepare("SELECT command FROM user_commands WHERE device_id = ?1 ORDER BY seq")
            .map_err(|e| Error::Database(e.to_string()))?;

        user.commands = stmt
            .query_map([device_id], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(Some(user))
    }

    /// Append a command to a user's history and make it their last command
    ///
    /// Returns `false` if no user exists for the device.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn log_command(&self, device_id: &str, command: &str) -> Result<bool> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let updated = tx
            .execute(
                "UPDATE users SET last_command = ?1, updated_at = ?2 WHERE device_id = ?3",
                [command, &now, device_id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        if updated == 0 {
            return Ok(false);
        }

        let seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM user_commands WHERE device_id = ?1",
                [device_id],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO user_commands (id, device_id, command, seq, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![Uuid::new_v4().to_string(), device_id, command, seq, now],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        Ok(true)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
