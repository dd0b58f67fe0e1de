use std::path::PathBuf;
use std::time::Duration;

use benessere_core::catalog::Catalog;
use benessere_core::clock::DEFAULT_UTC_OFFSET_HOURS;
use benessere_core::photo::DEFAULT_VERIFY_TIMEOUT;

use crate::error::{KioskError, KioskResult};

/// Default location of the loyalty document.
pub const DEFAULT_DATA_PATH: &str = "data/loyalty.json";

/// Kiosk configuration loaded from environment variables.
///
/// All fields have defaults suitable for a single campus kiosk.
#[derive(Debug, Clone, PartialEq)]
pub struct KioskConfig {
    /// Record-store file (default: `data/loyalty.json`).
    pub data_path: PathBuf,
    /// Whole-hour UTC offset of the business day (default: `-4`).
    pub utc_offset_hours: i32,
    /// Overrides the catalog's check-in code when set.
    pub checkin_code: Option<String>,
    /// JSON catalog replacing the built-in one when set.
    pub catalog_path: Option<PathBuf>,
    /// Upper bound on one photo verification (default: 10s).
    pub photo_verify_timeout: Duration,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            checkin_code: None,
            catalog_path: None,
            photo_verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }
}

impl KioskConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default             |
    /// |------------------------------|---------------------|
    /// | `BENESSERE_DATA_PATH`        | `data/loyalty.json` |
    /// | `BENESSERE_UTC_OFFSET_HOURS` | `-4`                |
    /// | `BENESSERE_CHECKIN_CODE`     | catalog value       |
    /// | `BENESSERE_CATALOG_PATH`     | built-in catalog    |
    /// | `PHOTO_VERIFY_TIMEOUT_SECS`  | `10`                |
    pub fn from_env() -> KioskResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`KioskConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KioskResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let data_path = var("BENESSERE_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let utc_offset_hours = match var("BENESSERE_UTC_OFFSET_HOURS") {
            Some(raw) => raw.parse().map_err(|_| {
                KioskError::Config(format!("BENESSERE_UTC_OFFSET_HOURS must be an integer, got '{raw}'"))
            })?,
            None => defaults.utc_offset_hours,
        };

        let photo_verify_timeout = match var("PHOTO_VERIFY_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map(Duration::from_secs).map_err(|_| {
                KioskError::Config(format!("PHOTO_VERIFY_TIMEOUT_SECS must be a valid u64, got '{raw}'"))
            })?,
            None => defaults.photo_verify_timeout,
        };

        Ok(Self {
            data_path,
            utc_offset_hours,
            checkin_code: var("BENESSERE_CHECKIN_CODE"),
            catalog_path: var("BENESSERE_CATALOG_PATH").map(PathBuf::from),
            photo_verify_timeout,
        })
    }

    /// The catalog for this run: the override file or the built-in one, with
    /// the configured check-in code applied, validated.
    pub fn load_catalog(&self) -> KioskResult<Catalog> {
        let mut catalog = match &self.catalog_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| KioskError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Catalog::from_json(&raw)?
            }
            None => Catalog::default(),
        };

        if let Some(code) = &self.checkin_code {
            catalog.checkin_code = code.clone();
        }
        catalog.validate()?;
        Ok(catalog)
    }
}
