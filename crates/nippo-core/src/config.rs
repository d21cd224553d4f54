//! Config - TOML の設定ファイル
//!
//! ```toml
//! time_zone = "Asia/Tokyo"
//! data_dir = "/home/me/.local/share/nippo"   # 省略可
//!
//! [rounding]
//! interval_minutes = 15   # 0 = 丸めなし
//! mode = "nearest"        # floor | ceil | nearest
//! ```
//!
//! ファイルがなければ既定値を使います（勝手に作りはしません）。

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::context::{DEFAULT_TIME_ZONE, SchedulerConfig};
use crate::domain::rounding::RoundingConfig;
use crate::domain::time::MINUTES_PER_DAY;

const APP_DIR: &str = "nippo";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the {0} directory for this platform")]
    NoPlatformDir(&'static str),

    #[error("failed to read or write config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("rounding interval must be at most {max} minutes, got {got}")]
    RoundingInterval { got: u32, max: u32 },
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// IANA タイムゾーン名
    pub time_zone: String,

    /// 履歴ファイルの置き場所（省略時はプラットフォームのデータディレクトリ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    pub rounding: RoundingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.name().to_string(),
            data_dir: None,
            rounding: RoundingConfig::default(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/nippo/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoPlatformDir("config"))
    }

    /// `path`（省略時は既定の場所）から読む。ファイルがなければ既定値。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_from(path)?;
        config.validate()?;
        Ok(config)
    }

    /// 検証せずに読む。壊れた値を `config` サブコマンドで直すときに使う。
    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 検証してから書き込む（親ディレクトリは作る）
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = self.to_toml()?;
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        validate_rounding(&self.rounding)
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(self.time_zone.clone()))
    }

    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        validate_rounding(&self.rounding)?;
        Ok(SchedulerConfig {
            rounding: self.rounding,
            time_zone: self.tz()?,
        })
    }

    /// 設定値、なければ `<data_dir>/nippo`
    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoPlatformDir("data")),
        }
    }
}

pub fn validate_rounding(rounding: &RoundingConfig) -> Result<(), ConfigError> {
    if rounding.interval_minutes > MINUTES_PER_DAY {
        return Err(ConfigError::RoundingInterval {
            got: rounding.interval_minutes,
            max: MINUTES_PER_DAY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rounding::RoundingMode;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = AppConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg, parsed);
        assert_eq!(parsed.time_zone, "Asia/Tokyo");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rounding]\ninterval_minutes = 15\nmode = \"ceil\"\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.rounding, RoundingConfig::new(15, RoundingMode::Ceil));
        assert_eq!(cfg.time_zone, "Asia/Tokyo");

        let sched = cfg.scheduler_config().unwrap();
        assert_eq!(sched.time_zone, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = AppConfig {
            time_zone: "Europe/Berlin".into(),
            data_dir: Some(dir.path().join("data")),
            rounding: RoundingConfig::new(5, RoundingMode::Floor),
        };

        cfg.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), cfg);
        assert_eq!(cfg.resolved_data_dir().unwrap(), dir.path().join("data"));
    }

    #[test]
    fn rejects_unknown_zone_and_huge_interval() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "time_zone = \"Mars/Olympus\"\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::UnknownTimeZone(z)) if z == "Mars/Olympus"
        ));

        std::fs::write(&path, "[rounding]\ninterval_minutes = 2000\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::RoundingInterval { got: 2000, .. })
        ));
    }

    #[test]
    fn bad_zone_can_be_repaired() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "time_zone = \"Mars/Olympus\"\n").unwrap();

        let mut cfg = AppConfig::read_from(&path).unwrap();
        assert_eq!(cfg.time_zone, "Mars/Olympus");

        cfg.time_zone = "Asia/Tokyo".into();
        cfg.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().time_zone, "Asia/Tokyo");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "time_zone = [").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }
}
