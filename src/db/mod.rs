use rusqlite::{params, Connection, Result};
use std::sync::Mutex;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_dir: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir).ok();
        let db_path = app_dir.join("pdf-chat.db");
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite half-written.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock();
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Returns whether a row was removed.
    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let conn = self.lock();
        let removed = conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    #[cfg(test)]
    pub(crate) fn drop_settings_table(&self) {
        self.lock().execute_batch("DROP TABLE settings").unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_roundtrip() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.get_setting("model").unwrap(), None);

        db.set_setting("model", "google/gemini-pro").unwrap();
        db.set_setting("model", "openai/gpt-4o-mini").unwrap();
        assert_eq!(
            db.get_setting("model").unwrap().as_deref(),
            Some("openai/gpt-4o-mini")
        );

        assert!(db.delete_setting("model").unwrap());
        assert!(!db.delete_setting("model").unwrap());
        assert_eq!(db.get_setting("model").unwrap(), None);
    }

    #[test]
    fn test_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::new(dir.path()).unwrap();
            db.set_setting("api_key", "sk-or-v1-abcdef123456").unwrap();
        }
        let db = Database::new(dir.path()).unwrap();
        assert_eq!(
            db.get_setting("api_key").unwrap().as_deref(),
            Some("sk-or-v1-abcdef123456")
        );
    }
}
