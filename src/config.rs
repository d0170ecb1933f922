//! Runtime configuration loaded from a TOML file.
//!
//! ```toml
//! dataset_path = "ireland_health_centres.csv"
//! db_path = "/var/lib/health-kiosk/health_centres.db"
//! table_name = "health_centres"
//! inactivity_timeout_secs = 120
//!
//! [admin]
//! password_sha256 = "<output of `health-kiosk hash-password`>"
//! salt = "kiosk-7"
//!
//! [log]
//! level = "info"
//! file = "/var/log/health-kiosk/kiosk.log"
//! ```
//!
//! A missing file means "use the defaults". There is no default
//! admin credential: without `admin.password_sha256` admin mode stays locked.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{KioskError, KioskResult};

/// Default dataset file looked up relative to the working directory.
const DEFAULT_DATASET: &str = "health_centres.csv";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "health_centres.db";
const DEFAULT_TABLE: &str = "health_centres";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "kiosk.log";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV file replace-loaded into the store at startup.
    pub dataset_path: PathBuf,
    pub db_path: PathBuf,
    /// Interpolated into statement text, so it must be a plain identifier.
    pub table_name: String,
    /// Seconds without input before user mode drops back to the main menu.
    pub inactivity_timeout_secs: u64,
    pub admin: AdminConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Hex SHA-256 of `salt || password`.
    pub password_sha256: Option<String>,
    pub salt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    pub file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            db_path: data_dir().join(DB_FILE_NAME),
            table_name: DEFAULT_TABLE.to_string(),
            inactivity_timeout_secs: DEFAULT_TIMEOUT_SECS,
            admin: AdminConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: data_dir().join("logs").join(LOG_FILE_NAME),
        }
    }
}

impl Config {
    /// Read the configuration. An explicit path must exist; the default path
    /// is optional and falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> KioskResult<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw = fs::read_to_string(&path).map_err(|err| {
            KioskError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> KioskResult<Self> {
        let config: Config =
            toml::from_str(raw).map_err(|err| KioskError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KioskResult<()> {
        validate_identifier(&self.table_name)?;
        if self.inactivity_timeout_secs == 0 {
            return Err(KioskError::Config(
                "inactivity_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(hash) = &self.admin.password_sha256 {
            let hash = hash.trim();
            if hash.len() != 64 || !hash.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return Err(KioskError::Config(
                    "admin.password_sha256 must be 64 hex characters".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*`, the only shape we ever interpolate.
pub fn validate_identifier(name: &str) -> KioskResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(KioskError::Config(format!(
            "'{name}' is not a valid table name"
        )))
    }
}

/// `<config dir>/config.toml` for this application, if a home exists.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("ie", "hse", "health-kiosk")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.table_name, "health_centres");
        assert_eq!(config.inactivity_timeout(), Duration::from_secs(120));
        assert!(config.admin.password_sha256.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            dataset_path = "ireland.csv"
            table_name = "centres_v2"
            inactivity_timeout_secs = 30

            [admin]
            password_sha256 = "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
            salt = "pepper"
            "#,
        )
        .unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("ireland.csv"));
        assert_eq!(config.table_name, "centres_v2");
        assert_eq!(config.inactivity_timeout_secs, 30);
        assert_eq!(config.admin.salt, "pepper");
    }

    #[test]
    fn rejects_injectable_table_names() {
        assert!(Config::from_toml_str(r#"table_name = "centres; DROP TABLE x""#).is_err());
        assert!(Config::from_toml_str(r#"table_name = "1centres""#).is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("_centres_2").is_ok());
    }

    #[test]
    fn rejects_zero_timeout_and_bad_hash() {
        assert!(Config::from_toml_str("inactivity_timeout_secs = 0").is_err());
        assert!(Config::from_toml_str("[admin]\npassword_sha256 = \"admin123\"").is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/kiosk.toml"))).unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }
}
