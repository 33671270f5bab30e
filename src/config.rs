use crate::core::schedule::RefreshSchedule;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: 3000 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub timeout_secs: u64,
    /// Explicit cache file location; defaults to the platform cache dir.
    pub cache_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            url: "https://www.cnb.cz/cs/financni_trhy/devizovy_trh/kurzy_devizoveho_trhu/denni_kurz.txt"
                .to_string(),
            timeout_secs: 30,
            cache_path: None,
        }
    }
}

impl FeedConfig {
    pub fn cache_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cache_path {
            return Ok(path.clone());
        }
        let proj_dirs = ProjectDirs::from("dev", "ratesd", "ratesd")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.cache_dir().join("daily_rates.txt"))
    }
}

/// Daily publication time of the upstream feed, as wall-clock time in the
/// publisher's timezone.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub timezone: String,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            timezone: "Europe/Prague".to_string(),
            hour: 14,
            minute: 30,
            second: 0,
        }
    }
}

impl ScheduleConfig {
    pub fn to_schedule(&self) -> Result<RefreshSchedule> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|_| anyhow!("Unknown timezone: {}", self.timezone))?;
        let publish_time = NaiveTime::from_hms_opt(self.hour, self.minute, self.second)
            .ok_or_else(|| {
                anyhow!(
                    "Invalid publication time: {:02}:{:02}:{:02}",
                    self.hour,
                    self.minute,
                    self.second
                )
            })?;
        Ok(RefreshSchedule::new(timezone, publish_time))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "ratesd", "ratesd")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
