//! Run configuration: optional TOML settings plus store credentials from the
//! environment.
//!
//! Every setting has a default, so a run needs no config file at all. The
//! store credentials are the exception: they must come from `SUPABASE_URL`
//! and `SUPABASE_KEY` and the run refuses to start without them.

use sectormap_core::data::{CuratedColumns, RetryPolicy, DEFAULT_KRX_URL, DEFAULT_SPARK_URL};
use sectormap_core::domain::Segment;
use sectormap_core::fields::FieldAliases;
use sectormap_core::store::StoreCredentials;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sectormap.toml";

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// All run settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub curated: CuratedSettings,
    pub listing: ListingSettings,
    pub prices: PriceSettings,
    pub store: StoreSettings,
    pub run: RunSettings,
}

/// Where curated files live and how their columns are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratedSettings {
    pub dir: PathBuf,
    pub kospi200_file: String,
    pub kosdaq150_file: String,
    pub ticker_columns: Vec<String>,
    pub sector_columns: Vec<String>,
    /// Category published for tickers whose curated label is blank.
    pub fallback_category: String,
}

impl Default for CuratedSettings {
    fn default() -> Self {
        let columns = CuratedColumns::default();
        Self {
            dir: PathBuf::from("."),
            kospi200_file: Segment::Kospi200.curated_file_name().into(),
            kosdaq150_file: Segment::Kosdaq150.curated_file_name().into(),
            ticker_columns: columns.ticker,
            sector_columns: columns.sector,
            fallback_category: "기타".into(),
        }
    }
}

impl CuratedSettings {
    pub fn path_for(&self, segment: Segment) -> PathBuf {
        let file = match segment {
            Segment::Kospi200 => &self.kospi200_file,
            Segment::Kosdaq150 => &self.kosdaq150_file,
        };
        self.dir.join(file)
    }

    pub fn columns(&self) -> CuratedColumns {
        CuratedColumns {
            ticker: self.ticker_columns.clone(),
            sector: self.sector_columns.clone(),
        }
    }
}

/// Live listing provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSettings {
    pub url: String,
    /// How many calendar days to walk back looking for a trading day.
    pub lookback_days: u32,
    /// Capitalization field names, in priority order.
    pub cap_aliases: FieldAliases,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_KRX_URL.into(),
            lookback_days: 7,
            cap_aliases: FieldAliases::market_cap(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl ListingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}

/// Price history provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSettings {
    pub url: String,
    /// Trading days of closes requested per symbol.
    pub lookback_days: u32,
    /// Symbols per provider request.
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SPARK_URL.into(),
            lookback_days: 5,
            batch_size: 200,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl PriceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}

/// Remote row store settings. Credentials are not part of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub table: String,
    pub on_conflict: String,
    /// Rows per upsert call.
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            table: "stocks".into(),
            on_conflict: "code,market".into(),
            batch_size: 100,
            timeout_secs: 30,
        }
    }
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Run the segments on the rayon pool instead of one after another.
    pub parallel_segments: bool,
}

impl Settings {
    /// Load a settings file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load `path` if given, else `sectormap.toml` in the working directory
    /// if it exists, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.batch_size == 0 {
            return Err(ConfigError::Invalid("store.batch_size must be > 0".into()));
        }
        if self.prices.batch_size == 0 {
            return Err(ConfigError::Invalid("prices.batch_size must be > 0".into()));
        }
        if self.prices.lookback_days < 2 {
            return Err(ConfigError::Invalid(
                "prices.lookback_days must be at least 2 to compute a change".into(),
            ));
        }
        if self.listing.lookback_days == 0 {
            return Err(ConfigError::Invalid("listing.lookback_days must be > 0".into()));
        }
        if self.listing.cap_aliases.names().is_empty() {
            return Err(ConfigError::Invalid("listing.cap_aliases must not be empty".into()));
        }
        if self.curated.ticker_columns.is_empty() || self.curated.sector_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "curated column alias lists must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Read store credentials from the process environment.
pub fn credentials_from_env() -> Result<StoreCredentials, ConfigError> {
    credentials_from(|name| std::env::var(name).ok())
}

/// Read store credentials through `lookup`. Blank values count as unset.
pub fn credentials_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<StoreCredentials, ConfigError> {
    let get = |name: &'static str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(name))
    };
    Ok(StoreCredentials {
        url: get(URL_ENV)?,
        key: get(KEY_ENV)?,
    })
}
