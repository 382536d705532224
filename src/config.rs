use crate::habits::schedule::parse_weekday_token;
use anyhow::{Context, Result, anyhow, bail};
use chrono::Weekday;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::info;

const APP_DIR: &str = ".habitdesk";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_USER_ID: &str = "local";
const DEFAULT_WEEK_START: &str = "mon";
const MAX_UPCOMING_DAYS: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_port: u16,
    pub user_id: String,
    pub week_start: String,
    pub upcoming_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_root_dir().join("db").join("habitdesk.db"),
            api_port: 7891,
            user_id: DEFAULT_USER_ID.to_string(),
            week_start: DEFAULT_WEEK_START.to_string(),
            upcoming_days: 7,
        }
    }
}

impl Config {
    pub fn root_dir() -> Result<PathBuf> {
        Ok(default_root_dir())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    /// Loads the config, writing defaults only when no config file exists yet.
    /// An unreadable or malformed file is an error and is left untouched.
    pub fn load_or_init() -> Result<Self> {
        let config = Self::load_or_init_at(&Self::config_path()?)?;
        config.ensure_bootstrap_files()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_or_init_at(config_path: &Path) -> Result<Self> {
        match fs::read_to_string(config_path) {
            Ok(content) => parse_config(&content, config_path),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save_to(config_path)?;
                info!(path = %config_path.display(), "default config created");
                Ok(config)
            }
            Err(error) => Err(error).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            }),
        }
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir()?;
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        Ok(())
    }

    pub fn week_start_day(&self) -> Result<Weekday> {
        parse_week_start(&self.week_start)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                if value.trim().is_empty() {
                    bail!("db_path must not be empty");
                }
                self.db_path = expand_home(value.trim());
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "user_id" => {
                let user_id = value.trim();
                if user_id.is_empty() {
                    bail!("user_id must not be empty");
                }
                self.user_id = user_id.to_string();
            }
            "week_start" => {
                parse_week_start(value)?;
                self.week_start = value.trim().to_lowercase();
            }
            "upcoming_days" => {
                self.upcoming_days = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("upcoming_days must be a number"))?
                    .min(MAX_UPCOMING_DAYS);
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, api_port|api.port, user_id|user.id, week_start|calendar.week_start, upcoming_days|dashboard.upcoming_days"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "user_id" => Some(self.user_id.clone()),
            "week_start" => Some(self.week_start.clone()),
            "upcoming_days" => Some(self.upcoming_days.to_string()),
            _ => None,
        }
    }
}

fn parse_config(content: &str, config_path: &Path) -> Result<Config> {
    serde_json::from_str(content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "api_port" | "api.port" => "api_port",
        "user_id" | "user.id" => "user_id",
        "week_start" | "calendar.week_start" => "week_start",
        "upcoming_days" | "dashboard.upcoming_days" => "upcoming_days",
        _ => key,
    }
}

fn parse_week_start(value: &str) -> Result<Weekday> {
    match parse_weekday_token(value) {
        Some(day @ (Weekday::Mon | Weekday::Sun)) => Ok(day),
        _ => bail!("week_start must be mon or sun, got: {value}"),
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Config;
    use chrono::Weekday;
    use std::fs;

    #[test]
    fn dotted_aliases_map_to_fields() {
        let mut config = Config::default();
        config.set_value("api.port", "8088").expect("valid port");
        config.set_value("user.id", " alice ").expect("valid user");

        assert_eq!(config.api_port, 8088);
        assert_eq!(config.get_value("api_port").as_deref(), Some("8088"));
        assert_eq!(config.get_value("user.id").as_deref(), Some("alice"));
    }

    #[test]
    fn week_start_accepts_only_monday_or_sunday() {
        let mut config = Config::default();
        assert_eq!(config.week_start_day().expect("default"), Weekday::Mon);

        config.set_value("calendar.week_start", "Sunday").expect("sunday");
        assert_eq!(config.week_start_day().expect("sunday"), Weekday::Sun);
        assert!(config.set_value("week_start", "wed").is_err());
    }

    #[test]
    fn upcoming_days_is_capped() {
        let mut config = Config::default();
        config.set_value("upcoming_days", "365").expect("number");
        assert_eq!(config.upcoming_days, 60);
        assert!(config.set_value("upcoming_days", "soon").is_err());
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_or_init_at(&path).expect("defaults");
        assert_eq!(config.user_id, "local");
        assert!(path.exists());
        assert_eq!(Config::load_or_init_at(&path).expect("reload").api_port, config.api_port);
    }

    #[test]
    fn malformed_config_is_reported_and_kept() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        let broken = r#"{ "user_id": "alice", "api_port": 8088, }"#;
        fs::write(&path, broken).expect("write config");

        let error = Config::load_or_init_at(&path).expect_err("parse failure");
        assert!(format!("{error:#}").contains("Failed to parse config file"));
        assert_eq!(fs::read_to_string(&path).expect("read back"), broken);
    }

    #[test]
    fn existing_config_is_loaded_as_is() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "user_id": "alice" }"#).expect("write config");

        let config = Config::load_or_init_at(&path).expect("load");
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.upcoming_days, 7);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("theme", "dark").is_err());
        assert!(config.get_value("theme").is_none());
    }
}
