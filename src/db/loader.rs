use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use rusqlite::params;
use tracing::{info, warn};

use super::connection::RecordStore;
use crate::error::{KioskError, KioskResult, StoreError};
use crate::models::{Column, FieldValue, HealthCentre};

impl RecordStore {
    /// Replace the whole table with the rows of a CSV dataset.
    ///
    /// The file is parsed and validated completely before the database is
    /// touched, so a malformed dataset leaves the previous contents intact.
    /// The drop, recreate and inserts then run in one transaction. Admin
    /// edits made since the last load are discarded.
    pub fn load(&self, source: &Path) -> KioskResult<usize> {
        let centres = read_dataset(source)?;

        self.replace_all(&centres)
            .map_err(|err| KioskError::load(source, err))?;

        info!(
            rows = centres.len(),
            source = %source.display(),
            table = self.table(),
            "dataset loaded"
        );
        Ok(centres.len())
    }

    fn replace_all(&self, centres: &[HealthCentre]) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(&format!("DROP TABLE IF EXISTS {}", self.table()), [])?;
        tx.execute(&self.create_table_sql(), [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (id, name, latitude, longitude, address, town, postal_code, role, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                self.table()
            ))?;
            for centre in centres {
                stmt.execute(params![
                    centre.id,
                    centre.name,
                    centre.latitude,
                    centre.longitude,
                    centre.address,
                    centre.town,
                    centre.postal_code,
                    centre.role,
                    centre.phone,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Parse a dataset into validated records without touching the store.
pub fn read_dataset(source: &Path) -> KioskResult<Vec<HealthCentre>> {
    let file = File::open(source).map_err(|err| KioskError::load(source, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|err| KioskError::load(source, err))?
        .clone();
    let positions = map_headers(&headers);

    for required in [Column::Id, Column::Name] {
        if !positions.contains_key(&required) {
            return Err(KioskError::load(
                source,
                format!("missing required column '{}'", required.as_sql()),
            ));
        }
    }

    let mut seen = HashSet::new();
    let mut centres = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = record.map_err(|err| KioskError::load(source, err))?;
        let centre = record_to_centre(&record, &positions)
            .map_err(|err| KioskError::load(source, format!("line {line}: {err}")))?;

        if !seen.insert(centre.id.clone()) {
            return Err(KioskError::load(
                source,
                format!("line {line}: duplicate id '{}'", centre.id),
            ));
        }
        centres.push(centre);
    }

    Ok(centres)
}

fn map_headers(headers: &StringRecord) -> HashMap<Column, usize> {
    let mut positions = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        match header.parse::<Column>() {
            Ok(column) => {
                positions.entry(column).or_insert(idx);
            }
            Err(_) => warn!(header, "ignoring unknown dataset column"),
        }
    }
    positions
}

fn record_to_centre(
    record: &StringRecord,
    positions: &HashMap<Column, usize>,
) -> KioskResult<HealthCentre> {
    let text = |column: Column| -> KioskResult<Option<String>> {
        match FieldValue::parse(column, field(record, positions, column))? {
            FieldValue::Text(value) => Ok(value),
            FieldValue::Number(value) => Ok(value.map(|n| n.to_string())),
        }
    };
    let number = |column: Column| -> KioskResult<Option<f64>> {
        match FieldValue::parse(column, field(record, positions, column))? {
            FieldValue::Number(value) => Ok(value),
            FieldValue::Text(_) => Ok(None),
        }
    };

    let centre = HealthCentre {
        id: field(record, positions, Column::Id).to_string(),
        name: field(record, positions, Column::Name).to_string(),
        latitude: number(Column::Latitude)?,
        longitude: number(Column::Longitude)?,
        address: text(Column::Address)?,
        town: text(Column::Town)?,
        postal_code: text(Column::PostalCode)?,
        role: text(Column::Role)?,
        phone: text(Column::Phone)?,
    };
    centre.validate()?;
    Ok(centre)
}

/// Raw cell for `column`, or an empty string when the dataset lacks it.
fn field<'r>(
    record: &'r StringRecord,
    positions: &HashMap<Column, usize>,
    column: Column,
) -> &'r str {
    positions
        .get(&column)
        .and_then(|&idx| record.get(idx))
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn dataset(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn legacy_headers_are_mapped() {
        let file = dataset(
            "ID,Hospital name,Latitude,Longitude,Address,Town,Eircode,Role,Phone\n\
             1,St. James's,53.34,-6.29,James St,Dublin,D08,ED,014103000\n",
        );
        let centres = read_dataset(file.path()).unwrap();
        assert_eq!(centres.len(), 1);
        assert_eq!(centres[0].name, "St. James's");
        assert_eq!(centres[0].postal_code.as_deref(), Some("D08"));
        assert_eq!(centres[0].latitude, Some(53.34));
        assert_eq!(centres[0].phone.as_deref(), Some("014103000"));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let file = dataset("id,name,latitude,town\n7,Clinic,,\n");
        let centres = read_dataset(file.path()).unwrap();
        assert_eq!(centres[0].latitude, None);
        assert_eq!(centres[0].town, None);
        assert_eq!(centres[0].role, None);
    }

    #[test]
    fn missing_required_column_is_a_load_error() {
        let file = dataset("id,town\n1,Dublin\n");
        let err = read_dataset(file.path()).unwrap_err();
        assert!(matches!(err, KioskError::Load { .. }));
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn bad_rows_are_rejected_with_line_numbers() {
        let file = dataset("id,name,latitude\n1,A,53.1\n2,B,north\n");
        let err = read_dataset(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 3"));

        let file = dataset("id,name\n1,A\n1,B\n");
        let err = read_dataset(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate id"));

        let file = dataset("id,name\n1,\n");
        assert!(read_dataset(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = read_dataset(Path::new("/nonexistent/centres.csv")).unwrap_err();
        assert!(matches!(err, KioskError::Load { .. }));
    }
}
