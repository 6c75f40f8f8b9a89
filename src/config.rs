use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "/config/opsdash.yaml";

/// Top-level configuration for the dashboard client.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Actor recorded on acknowledgements.
    #[serde(default = "AppConfig::default_actor")]
    pub actor: String,
}

impl AppConfig {
    fn default_actor() -> String {
        "operator".to_string()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            refresh: RefreshConfig::default(),
            ui: UiConfig::default(),
            actor: Self::default_actor(),
        }
    }
}

/// Where the monitoring service lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:8000".to_string()
    }

    const fn default_timeout() -> Duration {
        Duration::from_secs(10)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout: Self::default_timeout(),
        }
    }
}

/// Auto-refresh schedule ("0s" disables it).
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "RefreshConfig::default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

impl RefreshConfig {
    const fn default_interval() -> Duration {
        Duration::from_secs(10)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Samples requested for focused metric history.
    #[serde(default = "UiConfig::default_history_points")]
    pub history_points: usize,
}

impl UiConfig {
    const fn default_history_points() -> usize {
        60
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            history_points: Self::default_history_points(),
        }
    }
}

/// Load configuration from a YAML file, falling back to defaults, then apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let target_path = if let Some(path) = path {
        path.to_path_buf()
    } else if let Ok(env_path) = env::var("OPSDASH_CONFIG") {
        PathBuf::from(env_path)
    } else {
        PathBuf::from(DEFAULT_CONFIG_PATH)
    };

    let mut config = match try_parse_file(&target_path)? {
        Some(cfg) => {
            info!(path = %target_path.display(), "loaded configuration");
            cfg
        }
        None => {
            warn!(path = %target_path.display(), "config file not found; using built-in defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn try_parse_file(path: &Path) -> Result<Option<AppConfig>> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let cfg = serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse YAML config at {}", path.display()))?;
            Ok(Some(cfg))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read config file at {}", path.display()))
        }
    }
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = env::var("OPSDASH_API_URL") {
        if !url.is_empty() {
            config.api.base_url = url;
        }
    }
    if let Ok(actor) = env::var("OPSDASH_ACTOR") {
        if !actor.is_empty() {
            config.actor = actor;
        }
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.api.base_url.trim().is_empty() {
        bail!("api.base_url must not be empty; set it in YAML or via OPSDASH_API_URL");
    }
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        bail!(
            "api.base_url must start with http:// or https:// (got {})",
            config.api.base_url
        );
    }
    Ok(())
}
