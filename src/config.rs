use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GuardianError, Result};
use crate::warning::DEFAULT_MESSAGES;

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".focus-guardian")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub attention: AttentionSettings,
    pub warnings: WarningSettings,
    pub countermeasure: CountermeasureSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionSettings {
    /// Seconds of continuous drift before focus counts as lost
    pub delay_secs: f64,
}

impl Default for AttentionSettings {
    fn default() -> Self {
        Self { delay_secs: 3.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningSettings {
    pub cooldown_secs: f64,
    pub messages: Vec<String>,
}

impl Default for WarningSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: 3.0,
            messages: DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountermeasureSettings {
    pub media_path: PathBuf,
    pub player: PathBuf,
    pub player_args: Vec<String>,
    /// Hand the media to the OS opener when the player cannot be spawned
    pub fallback_open: bool,
}

impl Default for CountermeasureSettings {
    fn default() -> Self {
        Self {
            media_path: PathBuf::from("rickroll.mp4"),
            player: default_player(),
            player_args: vec![
                "--loop".to_string(),
                "--no-video-title-show".to_string(),
                "--fullscreen".to_string(),
            ],
            fallback_open: true,
        }
    }
}

fn default_player() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\VideoLAN\VLC\vlc.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/VLC.app/Contents/MacOS/VLC")
    } else {
        PathBuf::from("vlc")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub fps: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

impl GuardianConfig {
    /// Loads from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.resolve_env_vars();

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| GuardianError::Parse(e.to_string()))
    }

    fn resolve_env_vars(&mut self) {
        fn resolve_path(path: &mut PathBuf) {
            if let Some(resolved) = path.to_str().and_then(resolve_env_ref) {
                *path = PathBuf::from(resolved);
            }
        }

        resolve_path(&mut self.countermeasure.media_path);
        resolve_path(&mut self.countermeasure.player);
    }

    pub fn validate(&self) -> Result<()> {
        check_secs("attention.delay_secs", self.attention.delay_secs)?;
        check_secs("warnings.cooldown_secs", self.warnings.cooldown_secs)?;

        if self.warnings.messages.is_empty() {
            return Err(GuardianError::Config(
                "warnings.messages must not be empty".into(),
            ));
        }
        if self.scheduler.fps == 0 {
            return Err(GuardianError::Config("scheduler.fps must be at least 1".into()));
        }
        Ok(())
    }

    pub fn delay(&self) -> Result<Duration> {
        check_secs("attention.delay_secs", self.attention.delay_secs)
    }

    pub fn cooldown(&self) -> Result<Duration> {
        check_secs("warnings.cooldown_secs", self.warnings.cooldown_secs)
    }
}

fn check_secs(key: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        GuardianError::Config(format!(
            "{} must be a non-negative number of seconds, got {} ({})",
            key, value, e
        ))
    })
}

/// Resolves a whole-string `$VAR` or `${VAR}` reference.
///
/// Returns `None` if the value is not a reference or the variable is unset.
fn resolve_env_ref(value: &str) -> Option<String> {
    let name = if let Some(inner) = value.strip_prefix("${") {
        inner.strip_suffix('}')?
    } else {
        value.strip_prefix('$')?
    };

    std::env::var(name).ok()
}
