use rusqlite::Connection;
use testapp_types::APP_VERSION;
use tracing::debug;

use crate::Result;

pub const VERSION_KEY: &str = "app_version";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            email           TEXT,
            created_at      TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE TABLE IF NOT EXISTS app_settings (
            key     TEXT PRIMARY KEY,
            value   TEXT
        );
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO app_settings (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, APP_VERSION),
    )?;

    debug!("Schema ready, {} = {}", VERSION_KEY, APP_VERSION);
    Ok(())
}
