use std::{error::Error, fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

fn default_slots() -> usize {
    3
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_message_len() -> usize {
    128
}

// asctime-like, matching the timestamps the printer shows
fn default_time_format() -> String {
    "%a %b %e %H:%M:%S %Y".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// how many alarms can run at once
    #[serde(default = "default_slots")]
    pub slots: usize,
    /// how often each worker re-checks its alarm; also bounds how late an
    /// alarm can ring or notice cancellation
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// alarm message length bound, in bytes
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            poll_interval_ms: default_poll_interval_ms(),
            max_message_len: default_max_message_len(),
            time_format: default_time_format(),
        }
    }
}

impl Config {
    /// Loads the config file, falling back to the defaults when there is no
    /// file yet.
    ///
    /// # Errors
    /// An unreadable or malformed file is an error; silently masking a typo
    /// in an existing config with defaults would be worse than refusing to
    /// start.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            log::info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = fs::read_to_string(path)?;
        Ok(toml::from_str(&config)?)
    }

    /// # Errors
    /// Fails when the file or its parent directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, config)?;
        Ok(())
    }

    /// # Panics
    /// Panics when the platform provides no home directory to put the config
    /// under; there is nowhere sensible to run from in that case.
    #[must_use]
    pub fn config_path() -> PathBuf {
        let mut path = directories::ProjectDirs::from("", "", "ringer")
            .expect("couldn't get config path")
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        path
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_sizing() {
        let config = Config::default();
        assert_eq!(config.slots, 3);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.max_message_len, 128);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn toml_round_trip() {
        let config = Config {
            slots: 5,
            poll_interval_ms: 250,
            max_message_len: 64,
            time_format: "%H:%M".to_string(),
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str("time_format = \"%H:%M\"\nslots = 7\n").unwrap();
        assert_eq!(config.slots, 7);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.time_format, "%H:%M");
    }
}
