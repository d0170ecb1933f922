use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::debug;

use crate::config::{validate_identifier, Config};
use crate::error::{KioskError, KioskResult, StoreError};

/// Name of the SQL function registered on every connection.
pub(crate) const CASEFOLD_FN: &str = "casefold";

/// Handle on the persisted table. It only remembers where the database lives
/// and which table to use; every operation opens its own connection and
/// drops it before returning.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    table: String,
}

impl RecordStore {
    /// Validate the table identifier and make sure the database directory
    /// exists. No connection is opened here.
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> KioskResult<Self> {
        let path = path.into();
        let table = table.into();
        validate_identifier(&table)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                KioskError::Config(format!(
                    "failed to create data directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        Ok(Self { path, table })
    }

    pub fn from_config(config: &Config) -> KioskResult<Self> {
        Self::new(&config.db_path, &config.table_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Open a connection and lazily create the table so queries against a
    /// never-loaded store return nothing rather than "no such table".
    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        debug!(path = %self.path.display(), "opening store connection");
        let conn = Connection::open(&self.path)?;
        register_casefold(&conn)?;
        conn.execute(&self.create_table_sql(), [])?;
        Ok(conn)
    }

    /// Schema in field order. `id` is text so numeric and coded ids coexist.
    pub(crate) fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                address TEXT,
                town TEXT,
                postal_code TEXT,
                role TEXT,
                phone TEXT
            )",
            self.table
        )
    }
}

/// `casefold(text)`: Unicode lowercase, NULL stays NULL. SQLite's own `LIKE`
/// and `lower()` only fold ASCII, which misses names like "Dún Laoghaire".
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn casefold_lowers_beyond_ascii() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("kiosk.db"), "health_centres").unwrap();
        let conn = store.connect().unwrap();

        let folded: String = conn
            .query_row("SELECT casefold('DÚN LAOGHAIRE')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "dún laoghaire");

        let null: Option<String> = conn
            .query_row("SELECT casefold(NULL)", [], |row| row.get(0))
            .unwrap();
        assert!(null.is_none());
    }
}
