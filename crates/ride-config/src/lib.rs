use ride_data::{DataSources, MalformedPolicy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TRIPS: &str = "citi_bike_2022_small_sample.csv";
pub const DEFAULT_DAILY: &str = "citi_bike_daily_summary_2022.csv";
pub const DEFAULT_ROUTES: &str = "citi_bike_top_1000_routes.csv";
pub const DEFAULT_MAP: &str = "nyc_top_1000_bike_routes.html";
pub const DEFAULT_TITLE: &str = "NYC Citi Bike Strategic Dashboard";
pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    pub trips: Option<PathBuf>,
    pub daily: Option<PathBuf>,
    pub routes: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub malformed: Option<MalformedPolicy>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DashboardConfig {
    pub title: Option<String>,
    pub top_n: Option<usize>,
    pub intro_image: Option<PathBuf>,
    pub recommendation_image: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HttpConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub data: Option<DataConfig>,
    pub dashboard: Option<DashboardConfig>,
    pub http: Option<HttpConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from RIDE_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("RIDE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| h.bind.clone())
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
    }

    /// Input file locations, defaulting to the working directory
    pub fn data_sources(&self) -> DataSources {
        let data = self.data.clone().unwrap_or_default();
        DataSources {
            trips: data.trips.unwrap_or_else(|| DEFAULT_TRIPS.into()),
            daily: data.daily.unwrap_or_else(|| DEFAULT_DAILY.into()),
            routes: data.routes.unwrap_or_else(|| DEFAULT_ROUTES.into()),
            map: data.map.unwrap_or_else(|| DEFAULT_MAP.into()),
        }
    }

    pub fn malformed_policy(&self) -> MalformedPolicy {
        self.data
            .as_ref()
            .and_then(|d| d.malformed)
            .unwrap_or_default()
    }

    pub fn title(&self) -> String {
        self.dashboard
            .as_ref()
            .and_then(|d| d.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    /// Number of stations shown in rankings (default 20, never 0)
    pub fn top_n(&self) -> usize {
        self.dashboard
            .as_ref()
            .and_then(|d| d.top_n)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_TOP_N)
    }

    pub fn intro_image(&self) -> PathBuf {
        self.dashboard
            .as_ref()
            .and_then(|d| d.intro_image.clone())
            .unwrap_or_else(|| "bike_image.jpg".into())
    }

    pub fn recommendation_image(&self) -> PathBuf {
        self.dashboard
            .as_ref()
            .and_then(|d| d.recommendation_image.clone())
            .unwrap_or_else(|| "bike_image_2.webp".into())
    }
}
