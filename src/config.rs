use crate::directions::DEFAULT_MAPS_BASE_URL;
use crate::location::IpService;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub registry: RegistryConfig,
    pub directions: DirectionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ip,
    Http,
    Manual,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub provider: Provider,
    pub ip: String,                // Address handed to the IP geolocation service
    pub service: IpService,
    pub http_endpoint: String,     // Used when provider = "http"
    pub manual_lat: Option<f64>,   // Used when provider = "manual"
    pub manual_lon: Option<f64>,
    pub timeout_seconds: u64,      // Give up on a lookup after this long
    pub cache_seconds: u64,        // Reuse a successful fix for this long
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: Option<PathBuf>,       // .csv or .toml; built-in branches when unset
    pub fallback_id: Option<String>, // Branch shown when location fails; first branch when unset
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DirectionsConfig {
    pub base_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ip,
            ip: "1.1.1.1".to_string(),
            service: IpService::IpApi,
            http_endpoint: "http://ip-api.com/json".to_string(),
            manual_lat: None,
            manual_lon: None,
            timeout_seconds: 10,
            cache_seconds: 300,
        }
    }
}

impl LocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.cache_seconds)
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MAPS_BASE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file: "branch-locator.log".to_string(),
        }
    }
}

impl Config {
    /// Loads the config file at `path`.
    /// If it doesn't exist, writes the defaults there for the user to edit.
    /// A file that fails to parse is left alone and the defaults are used.
    ///
    /// Runs before logging is set up, so anything worth a warning is
    /// returned alongside the config for the caller to report.
    pub fn load(path: &Path) -> (Self, Vec<String>) {
        let mut problems = Vec::new();
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(mut config) => {
                    config.check(&mut problems);
                    return (config, problems);
                }
                Err(e) => {
                    problems.push(format!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    ));
                    return (Config::default(), problems);
                }
            },
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                problems.push(format!(
                    "Could not read {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
                return (Config::default(), problems);
            }
            Err(_) => {}
        }

        let default_config = Config::default();
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    problems.push(format!("Could not write default {} to disk.", path.display()));
                }
            }
            Err(e) => problems.push(format!("Could not serialize default configuration: {}", e)),
        }

        (default_config, problems)
    }

    // Values that parse but cannot work are replaced, and noted.
    fn check(&mut self, problems: &mut Vec<String>) {
        if self.location.timeout_seconds == 0 {
            problems.push(
                "location.timeout_seconds = 0 would time out every lookup. Using 1.".to_string(),
            );
            self.location.timeout_seconds = 1;
        }
    }
}
