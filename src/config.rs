//! Runtime configuration: where the remote list API lives, where the snapshot
//! cache is written, and the team color palette.
//!
//! Loaded from an optional TOML file, then overridden by `TEAMTASKS_BASE_URL` and
//! command-line flags. The palette is only ever read from here and handed to the
//! team normalizer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "TEAMTASKS_BASE_URL";
/// Color for teams that have no palette entry.
pub const DEFAULT_TEAM_COLOR: &str = "#3A4A63";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote list API; endpoints are joined as `{base_url}/{endpoint}`.
    pub base_url: String,
    /// Directory holding the task snapshot cache.
    pub cache_dir: PathBuf,
    /// Team whose employees are loaded (`employees/{team_id}/employees`).
    pub team_id: u64,
    /// Send `ngrok-skip-browser-warning` so tunnelled backends answer with JSON.
    pub skip_tunnel_warning: bool,
    /// Team display colors keyed by team name.
    pub palette: TeamPalette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            cache_dir: default_home_dir(),
            team_id: 1,
            skip_tunnel_warning: true,
            palette: TeamPalette::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path` if given, else from the default location
    /// when that file exists, else defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = default_home_dir().join("config.toml");
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Config::default()
                }
            }
        };
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// Team name to display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamPalette {
    pub colors: BTreeMap<String, String>,
    pub fallback: String,
}

impl Default for TeamPalette {
    fn default() -> Self {
        let colors = [
            ("team24", "#3357FF"),
            ("Backend", "#3A4A63"),
            ("DevOps", "#3357FF"),
            ("QA", "#7D3C98"),
            ("Design", "#2E86C1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            colors,
            fallback: DEFAULT_TEAM_COLOR.to_string(),
        }
    }
}

impl TeamPalette {
    pub fn color_for(&self, team_name: &str) -> &str {
        self.colors
            .get(team_name.trim())
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

/// `$HOME/.teamtasks`, or `./.teamtasks` when `HOME` is unset.
pub fn default_home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".teamtasks")
}
