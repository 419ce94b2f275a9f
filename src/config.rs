//! Configuration types for radioquery

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration shared by every cutout query
///
/// All fields have defaults, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root under which each survey gets its own directory (default: "~/RQUERY")
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry policy for transient network failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Archive base URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// VLASS tile resolution settings
    #[serde(default)]
    pub vlass: VlassConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            endpoints: EndpointsConfig::default(),
            vlass: VlassConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON text and validate it
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&text)
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "at least one attempt is required",
                "retry.max_attempts",
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                format!(
                    "backoff multiplier must be a finite value >= 1.0, got {}",
                    self.retry.backoff_multiplier
                ),
                "retry.backoff_multiplier",
            ));
        }
        if !(self.vlass.max_separation_deg.is_finite() && self.vlass.max_separation_deg > 0.0) {
            return Err(Error::config(
                format!(
                    "maximum separation must be positive, got {}",
                    self.vlass.max_separation_deg
                ),
                "vlass.max_separation_deg",
            ));
        }
        for (key, value) in [
            ("endpoints.first_url", &self.endpoints.first_url),
            ("endpoints.nvss_url", &self.endpoints.nvss_url),
            ("endpoints.lotss_url", &self.endpoints.lotss_url),
            ("endpoints.vlass_tile_url", &self.endpoints.vlass_tile_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(format!("invalid URL '{value}': {e}"), key))?;
        }
        Ok(())
    }
}

/// HTTP client settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for a single cutout exchange (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for establishing a connection (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Timeout for a full VLASS tile transfer (default: 600 seconds)
    #[serde(default = "default_tile_timeout", with = "duration_serde")]
    pub tile_timeout: Duration,

    /// User-Agent header sent to the archives
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            tile_timeout: default_tile_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of exchanges attempted, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Archive base URLs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// FIRST cutout CGI
    #[serde(default = "default_first_url")]
    pub first_url: String,

    /// NVSS postage-stamp CGI
    #[serde(default = "default_nvss_url")]
    pub nvss_url: String,

    /// LoTSS DR2 cutout service
    #[serde(default = "default_lotss_url")]
    pub lotss_url: String,

    /// Directory holding the VLASS quicklook median-stack tiles
    #[serde(default = "default_vlass_tile_url")]
    pub vlass_tile_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            first_url: default_first_url(),
            nvss_url: default_nvss_url(),
            lotss_url: default_lotss_url(),
            vlass_tile_url: default_vlass_tile_url(),
        }
    }
}

/// Where the VLASS tile index comes from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "path")]
pub enum TileIndexSource {
    /// A listing file on disk (one tile per line, or a saved HTML listing)
    File(PathBuf),
    /// Fetch the directory listing at `endpoints.vlass_tile_url` (default)
    #[default]
    Remote,
}

/// VLASS tile resolution settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VlassConfig {
    /// Source of the tile index
    #[serde(default)]
    pub tile_index: TileIndexSource,

    /// Targets farther than this from every tile centre are not covered (default: 2.5 degrees)
    #[serde(default = "default_max_separation_deg")]
    pub max_separation_deg: f64,
}

impl Default for VlassConfig {
    fn default() -> Self {
        Self {
            tile_index: TileIndexSource::default(),
            max_separation_deg: default_max_separation_deg(),
        }
    }
}

fn default_output_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("RQUERY")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_tile_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_user_agent() -> String {
    format!("radioquery/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_first_url() -> String {
    "https://third.ucllnl.org/cgi-bin/firstcutout".to_string()
}

fn default_nvss_url() -> String {
    "https://www.cv.nrao.edu/cgi-bin/postage.pl".to_string()
}

fn default_lotss_url() -> String {
    "https://lofar-surveys.org/dr2-cutout.fits".to_string()
}

fn default_vlass_tile_url() -> String {
    "https://archive-new.nrao.edu/vlass/quicklook/ql_median_stack/".to_string()
}

fn default_max_separation_deg() -> f64 {
    2.5
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
