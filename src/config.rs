//! User configuration loaded from `config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "cloudtune";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub startup: StartupConfig,
    #[serde(default)]
    pub main: MainConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Run the daily sign-in once per day when a user is known
    #[serde(default = "default_true")]
    pub sign_in: bool,
    #[serde(default = "default_true")]
    pub notify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// How long a transient notice stays on screen
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// NetEase-compatible API server
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mpv,
    Silent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_mpv_path")]
    pub mpv_path: String,
    #[serde(default = "default_volume")]
    pub default_volume: u8,
    /// Stream locator for a track; `{id}` is replaced by the track id
    #[serde(default = "default_stream_url_template")]
    pub stream_url_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Store records and logs live here
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            sign_in: default_true(),
            notify: default_true(),
        }
    }
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            tick_ms: default_tick_ms(),
            notice_secs: default_notice_secs(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            mpv_path: default_mpv_path(),
            default_volume: default_volume(),
            stream_url_template: default_stream_url_template(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    10
}

fn default_tick_ms() -> u64 {
    500
}

fn default_notice_secs() -> u64 {
    4
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_mpv_path() -> String {
    "mpv".to_string()
}

fn default_volume() -> u8 {
    50
}

fn default_stream_url_template() -> String {
    "https://music.163.com/song/media/outer/url?id={id}.mp3".to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    /// Load from `path`, writing a default file first when none exists
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.paths.data_dir.join("logs")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.paths.data_dir.join("db")
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.main.tick_ms.max(50))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs.max(1))
    }
}
