//! Domain models that mirror the SQLite schema and get passed between the
//! store, the query layer and the TUI. They stay plain data holders so the
//! other layers can focus on persistence and presentation.

use std::fmt;
use std::str::FromStr;

use crate::error::KioskError;

#[derive(Debug, Clone, PartialEq)]
/// One row of the directory. Optional columns map to SQL NULL.
pub struct HealthCentre {
    /// Primary key. Kept as text because datasets mix numeric and coded ids.
    pub id: String,
    /// Display name of the hospital or health centre.
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub town: Option<String>,
    /// Irish datasets call this the Eircode.
    pub postal_code: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
}

impl HealthCentre {
    /// Build a record with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
            address: None,
            town: None,
            postal_code: None,
            role: None,
            phone: None,
        }
    }

    /// Both coordinates, when the row has them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Check the constraints the table enforces before hitting SQLite, so the
    /// operator gets a readable message instead of a constraint error.
    pub fn validate(&self) -> Result<(), KioskError> {
        if self.id.trim().is_empty() {
            return Err(KioskError::input("ID is required."));
        }
        if self.name.trim().is_empty() {
            return Err(KioskError::input("Hospital name is required."));
        }
        Ok(())
    }
}

impl fmt::Display for HealthCentre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Allow-list of columns in schema order. Only these identifiers are ever
/// placed into statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Name,
    Latitude,
    Longitude,
    Address,
    Town,
    PostalCode,
    Role,
    Phone,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Id,
        Column::Name,
        Column::Latitude,
        Column::Longitude,
        Column::Address,
        Column::Town,
        Column::PostalCode,
        Column::Role,
        Column::Phone,
    ];

    /// SQL identifier used in the table schema.
    pub fn as_sql(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::Address => "address",
            Column::Town => "town",
            Column::PostalCode => "postal_code",
            Column::Role => "role",
            Column::Phone => "phone",
        }
    }

    /// Human-facing label for forms and result cards.
    pub fn label(self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Hospital Name",
            Column::Latitude => "Latitude",
            Column::Longitude => "Longitude",
            Column::Address => "Address",
            Column::Town => "Town",
            Column::PostalCode => "Eircode",
            Column::Role => "Role",
            Column::Phone => "Phone",
        }
    }

    /// Columns the admin edit flow may change. The id is immutable.
    pub fn editable() -> impl Iterator<Item = Column> {
        Column::ALL.into_iter().filter(|column| column.is_editable())
    }

    pub fn is_editable(self) -> bool {
        self != Column::Id
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Column::Latitude | Column::Longitude)
    }

    pub fn is_required(self) -> bool {
        matches!(self, Column::Id | Column::Name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Column {
    type Err = KioskError;

    /// Accepts schema names, display labels and the legacy dataset headers
    /// (`Hospital name`, `Eircode`), ignoring case and surrounding spaces.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        let column = match normalized.as_str() {
            "id" => Column::Id,
            "name" | "hospital_name" => Column::Name,
            "latitude" | "lat" => Column::Latitude,
            "longitude" | "lon" | "lng" | "long" => Column::Longitude,
            "address" => Column::Address,
            "town" => Column::Town,
            "postal_code" | "postcode" | "eircode" => Column::PostalCode,
            "role" => Column::Role,
            "phone" => Column::Phone,
            _ => {
                return Err(KioskError::input(format!(
                    "Unknown column '{}'.",
                    raw.trim()
                )))
            }
        };
        Ok(column)
    }
}

/// A typed value for a single column, produced from operator text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Number(Option<f64>),
}

impl FieldValue {
    /// Parse raw input for `column`. Blank optional fields become NULL;
    /// blank required fields and non-numeric coordinates are input errors.
    pub fn parse(column: Column, raw: &str) -> Result<Self, KioskError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if column.is_required() {
                return Err(KioskError::input(format!("{} is required.", column.label())));
            }
            return Ok(if column.is_numeric() {
                FieldValue::Number(None)
            } else {
                FieldValue::Text(None)
            });
        }

        if column.is_numeric() {
            let number = trimmed.parse::<f64>().map_err(|_| {
                KioskError::input(format!("{} must be a number.", column.label()))
            })?;
            Ok(FieldValue::Number(Some(number)))
        } else {
            Ok(FieldValue::Text(Some(trimmed.to_string())))
        }
    }
}

impl rusqlite::ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match self {
            FieldValue::Text(value) => value.to_sql(),
            FieldValue::Number(value) => value.to_sql(),
        }
    }
}
