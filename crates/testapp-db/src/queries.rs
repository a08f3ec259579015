use rusqlite::{Connection, OptionalExtension, ffi};
use sha2::{Digest, Sha256};
use testapp_types::{APP_VERSION, UserSummary};
use tracing::{info, warn};

use crate::migrations::VERSION_KEY;
use crate::models::UserRow;
use crate::{Database, Result, StoreError};

/// Hex-encoded SHA-256 of the plaintext password. Unsalted, single round.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl Database {
    // -- Users --

    /// Inserts a new account. Fails with [`StoreError::DuplicateUsername`] if
    /// the name is taken; the store is left unchanged on any failure.
    pub fn register(&self, username: &str, password: &str, email: &str) -> Result<()> {
        let password_hash = hash_password(password);

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO users (username, password_hash, email) VALUES (?1, ?2, ?3)",
                (username, &password_hash, email),
            )
            .map_err(|e| map_insert_error(e, username))?;
            tx.commit()?;
            Ok(())
        })?;

        info!("Registered user {}", username);
        Ok(())
    }

    /// All users, newest first.
    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        let users = self.with_conn(|conn| query_users(conn))?;
        info!("Retrieved {} users from database", users.len());
        Ok(users)
    }

    // -- Settings --

    /// The persisted app version, or the compiled-in one if the setting is
    /// missing or the file cannot be read.
    pub fn get_version(&self) -> String {
        match self.with_conn(|conn| query_setting(conn, VERSION_KEY)) {
            Ok(Some(version)) => version,
            Ok(None) => APP_VERSION.to_string(),
            Err(e) => {
                warn!("Could not read {}: {}", VERSION_KEY, e);
                APP_VERSION.to_string()
            }
        }
    }
}

fn map_insert_error(err: rusqlite::Error, username: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::DuplicateUsername(username.to_string())
        }
        _ => StoreError::Sqlite(err),
    }
}

fn query_users(conn: &Connection) -> Result<Vec<UserSummary>> {
    let mut stmt = conn.prepare(
        "SELECT username, email, created_at
         FROM users
         ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                email: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(UserSummary::from).collect())
}

fn query_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM app_settings WHERE key = ?1",
            [key],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?;

    Ok(value.flatten())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("users.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn duplicate_username_is_rejected_once_stored() {
        let (_dir, db) = open_temp();

        db.register("alice", "secret", "alice@example.com").unwrap();
        let err = db.register("alice", "other", "").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(ref name) if name == "alice"));
        assert_eq!(err.user_message(), "Username already exists!");

        let users = db.list_users().unwrap();
        assert_eq!(users.iter().filter(|u| u.username == "alice").count(), 1);
        assert_eq!(users[0].email, "alice@example.com");
    }

    #[test]
    fn stored_hash_matches_password_digest() {
        let (_dir, db) = open_temp();
        db.register("bob", "hunter2", "").unwrap();

        let stored: String = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT password_hash FROM users WHERE username = 'bob'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(stored, hash_password("hunter2"));
    }

    #[test]
    fn list_is_empty_then_newest_first() {
        let (_dir, db) = open_temp();
        assert!(db.list_users().unwrap().is_empty());

        db.register("u1", "pw", "").unwrap();
        db.register("u2", "pw", "").unwrap();

        let names: Vec<_> = db
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["u2", "u1"]);
    }

    #[test]
    fn null_email_lists_as_empty() {
        let (_dir, db) = open_temp();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES ('legacy', 'x')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let users = db.list_users().unwrap();
        assert_eq!(users[0].email, "");
        assert!(!users[0].created_at.is_empty());
    }

    #[test]
    fn version_defaults_to_compiled_constant() {
        let (_dir, db) = open_temp();
        assert_eq!(db.get_version(), APP_VERSION);
    }

    #[test]
    fn initialize_overwrites_stale_version() {
        let (_dir, db) = open_temp();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE app_settings SET value = '0.0.1' WHERE key = ?1",
                [VERSION_KEY],
            )?;
            Ok(())
        })
        .unwrap();
        assert_eq!(db.get_version(), "0.0.1");

        db.initialize().unwrap();
        assert_eq!(db.get_version(), APP_VERSION);
    }

    #[test]
    fn version_falls_back_when_setting_is_missing() {
        let (_dir, db) = open_temp();
        db.with_conn(|conn| {
            conn.execute("DELETE FROM app_settings", [])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.get_version(), APP_VERSION);
    }
}
