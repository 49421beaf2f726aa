use crate::counter::DEFAULT_CAP;
use crate::errors::ConfigError;
use crate::watchdog::WatchdogConfig;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub daily_cap: u32,
    pub watchdog: WatchdogConfig,
    pub near_midnight: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/walks.json"),
            daily_cap: DEFAULT_CAP,
            watchdog: WatchdogConfig::default(),
            near_midnight: Duration::from_secs(120),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse(&lookup, "PORT")?.unwrap_or(defaults.port);
        let data_path = lookup("APP_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let daily_cap = positive(&lookup, "WALK_DAILY_CAP")?.unwrap_or(defaults.daily_cap);
        let coarse = positive(&lookup, "WALK_COARSE_CHECK_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.watchdog.coarse);
        let fine = positive(&lookup, "WALK_FINE_CHECK_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.watchdog.fine);
        let near_midnight = parse::<u64>(&lookup, "WALK_NEAR_MIDNIGHT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.near_midnight);

        Ok(Self {
            port,
            data_path,
            daily_cap,
            watchdog: WatchdogConfig { coarse, fine },
            near_midnight,
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| ConfigError::invalid(key, format!("{raw:?}: {err}"))),
    }
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    match parse::<T>(lookup, key)? {
        Some(value) if value == T::default() => {
            Err(ConfigError::invalid(key, "must be greater than zero"))
        }
        other => Ok(other),
    }
}
