use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Params, Row};
use tracing::{debug, info};

use super::connection::RecordStore;
use crate::error::StoreError;
use crate::models::{Column, FieldValue, HealthCentre};

type StoreResult<T> = Result<T, StoreError>;

/// Column list shared by every SELECT so `row_to_centre` can index by
/// position.
const SELECT_COLUMNS: &str =
    "id, name, latitude, longitude, address, town, postal_code, role, phone";

/// A parameterized WHERE clause. Placeholders are positional (`?1`, `?2`, ...)
/// and every value is bound, never spliced into the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    clause: String,
    params: Vec<String>,
}

impl Predicate {
    pub fn new(clause: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }

    /// Matches every row.
    pub fn all() -> Self {
        Self::new("1 = 1", Vec::new())
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl RecordStore {
    /// Run a read-only filter. Rows come back in storage order; no match is
    /// an empty vector.
    pub fn query(&self, predicate: &Predicate) -> StoreResult<Vec<HealthCentre>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {} WHERE {}",
            self.table(),
            predicate.clause()
        );
        debug!(clause = predicate.clause(), "running query");

        let mut stmt = conn.prepare(&sql)?;
        let centres = stmt
            .query_map(rusqlite::params_from_iter(predicate.params()), row_to_centre)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(centres)
    }

    /// Execute one insert/update/delete and commit it. `{table}` in the
    /// statement is replaced with the validated table name. Returns the number
    /// of affected rows.
    pub(crate) fn mutate<P: Params>(&self, statement: &str, params: P) -> StoreResult<usize> {
        let conn = self.connect()?;
        let sql = statement.replace("{table}", self.table());
        let affected = conn.execute(&sql, params)?;
        Ok(affected)
    }

    /// Look up one row by primary key.
    pub fn fetch(&self, id: &str) -> StoreResult<Option<HealthCentre>> {
        let conn = self.connect()?;
        fetch_with(&conn, self.table(), id)
    }

    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Insert a new row. A duplicate id surfaces as `StoreError::Duplicate`.
    pub fn insert(&self, centre: &HealthCentre) -> StoreResult<()> {
        self.mutate(
            "INSERT INTO {table} (id, name, latitude, longitude, address, town, postal_code, role, phone)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                centre.id,
                centre.name,
                centre.latitude,
                centre.longitude,
                centre.address,
                centre.town,
                centre.postal_code,
                centre.role,
                centre.phone,
            ],
        )
        .map_err(|err| map_unique_constraint(err, &centre.id))?;

        info!(id = %centre.id, "health centre added");
        Ok(())
    }

    /// Set a single column on one row. The column comes from the allow-list,
    /// so only a known identifier reaches the statement text.
    pub fn update_column(&self, id: &str, column: Column, value: &FieldValue) -> StoreResult<()> {
        let statement = format!("UPDATE {{table}} SET {} = ?1 WHERE id = ?2", column.as_sql());
        let updated = self.mutate(&statement, params![value, id])?;

        if updated == 0 {
            Err(StoreError::NotFound(id.to_string()))
        } else {
            info!(id, column = column.as_sql(), "health centre updated");
            Ok(())
        }
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted = self.mutate("DELETE FROM {table} WHERE id = ?1", params![id])?;

        if deleted == 0 {
            Err(StoreError::NotFound(id.to_string()))
        } else {
            info!(id, "health centre deleted");
            Ok(())
        }
    }
}

fn fetch_with(
    conn: &Connection,
    table: &str,
    id: &str,
) -> StoreResult<Option<HealthCentre>> {
    let centre = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM {table} WHERE id = ?1"),
            params![id],
            row_to_centre,
        )
        .optional()?;
    Ok(centre)
}

fn row_to_centre(row: &Row<'_>) -> rusqlite::Result<HealthCentre> {
    Ok(HealthCentre {
        id: row.get(0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        address: row.get(4)?,
        town: row.get(5)?,
        postal_code: row.get(6)?,
        role: row.get(7)?,
        phone: row.get(8)?,
    })
}

/// Turn the primary-key violation into a readable message; anything else
/// stays a raw SQLite error.
fn map_unique_constraint(err: StoreError, id: &str) -> StoreError {
    match err {
        StoreError::Sqlite(ref sql_err) if is_constraint_violation(sql_err) => {
            StoreError::Duplicate(id.to_string())
        }
        other => other,
    }
}

fn is_constraint_violation(err: &SqlError) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    )
}
