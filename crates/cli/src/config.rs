use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use coach::{CredentialStore, GeminiTransport, ProbePolicy};

const DEFAULT_PROBE_MAX_ATTEMPTS: u32 = 50;
const DEFAULT_PROBE_INTERVAL_MS: u64 = 100;
const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STARTING_POINTS: u32 = 1000;

fn default_probe_max_attempts() -> u32 {
    DEFAULT_PROBE_MAX_ATTEMPTS
}

fn default_probe_interval_ms() -> u64 {
    DEFAULT_PROBE_INTERVAL_MS
}

fn default_stream_idle_timeout_secs() -> u64 {
    DEFAULT_STREAM_IDLE_TIMEOUT_SECS
}

fn default_starting_points() -> u32 {
    DEFAULT_STARTING_POINTS
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// AI coach settings.
    #[serde(default)]
    pub coach: CoachConfig,

    /// Mini-game settings.
    #[serde(default)]
    pub game: GameConfig,

    /// Terminal UI settings.
    #[serde(default)]
    pub ui: UiConfig,
}

/// AI coach connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Pre-selected Gemini API key (env overrides applied at load time; see `Config::load`).
    #[serde(default)]
    pub api_key: String,
    /// Gemini endpoint override.
    pub base_url: Option<String>,
    /// Key service polls before giving up.
    #[serde(default = "default_probe_max_attempts")]
    pub probe_max_attempts: u32,
    /// Pause between key service polls.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Seconds a reply stream may stay silent.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            probe_max_attempts: default_probe_max_attempts(),
            probe_interval_ms: default_probe_interval_ms(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

impl CoachConfig {
    /// Polling budget for the key service.
    pub fn probe_policy(&self) -> ProbePolicy {
        ProbePolicy {
            max_attempts: self.probe_max_attempts,
            interval: Duration::from_millis(self.probe_interval_ms),
        }
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }

    /// Configured key, if any.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }

    /// Endpoint override, ignoring blank values.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Gemini transport reading its key from `store`.
    pub fn gemini_transport(&self, store: Arc<CredentialStore>) -> GeminiTransport {
        let transport = match self.effective_base_url() {
            Some(url) => GeminiTransport::with_base_url(store, url),
            None => GeminiTransport::new(store),
        };
        transport.with_idle_timeout(self.stream_idle_timeout())
    }
}

/// Mini-game settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Points balance at startup.
    #[serde(default = "default_starting_points")]
    pub starting_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_points: default_starting_points(),
        }
    }
}

/// Terminal UI settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Start with sound effects muted.
    #[serde(default)]
    pub muted: bool,
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Look in current dir, then home dir
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home = std::env::var("HOME").ok()?;
            let home_config = PathBuf::from(home)
                .join(".chance-champions")
                .join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        // Environment variable overrides (highest priority → lowest)
        if let Some(key) = env_non_empty("GEMINI_API_KEY").or_else(|| env_non_empty("GOOGLE_API_KEY"))
        {
            config.coach.api_key = key;
        }
        if let Some(url) = env_non_empty("CHANCE_CHAMPIONS_BASE_URL") {
            config.coach.base_url = Some(url);
        }

        config.validate()?;
        debug!(
            has_api_key = config.coach.api_key().is_some(),
            base_url = ?config.coach.effective_base_url(),
            starting_points = config.game.starting_points,
            muted = config.ui.muted,
            "Config loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.coach.probe_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "coach.probe_max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.coach.stream_idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "coach.stream_idle_timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(key) = self.coach.api_key()
            && let Err(reason) = coach::validate_api_key(key)
        {
            return Err(ConfigError::InvalidValue {
                field: "coach.api_key".to_string(),
                reason,
            });
        }
        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvSandbox;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write config");
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = Config::default();
        assert_eq!(cfg.coach.probe_max_attempts, 50);
        assert_eq!(cfg.coach.probe_interval_ms, 100);
        assert_eq!(cfg.coach.stream_idle_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.coach.api_key(), None);
        assert_eq!(cfg.game.starting_points, 1000);
        assert!(!cfg.ui.muted);
        assert_eq!(cfg.coach.probe_policy(), ProbePolicy::default());
    }

    #[test]
    fn load_reads_explicit_file_path() {
        let _env = EnvSandbox::acquire();
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_path = tmp.path().join("config.toml");
        write_file(
            &config_path,
            r#"
[coach]
api_key = "from_file"
base_url = "http://localhost:8080"
probe_max_attempts = 5
probe_interval_ms = 20

[game]
starting_points = 250

[ui]
muted = true
"#,
        );
        let cfg = Config::load(Some(&config_path)).expect("config should parse");
        assert_eq!(cfg.coach.api_key(), Some("from_file"));
        assert_eq!(cfg.coach.effective_base_url(), Some("http://localhost:8080"));
        assert_eq!(
            cfg.coach.probe_policy(),
            ProbePolicy {
                max_attempts: 5,
                interval: Duration::from_millis(20),
            }
        );
        assert_eq!(cfg.coach.stream_idle_timeout_secs, 60);
        assert_eq!(cfg.game.starting_points, 250);
        assert!(cfg.ui.muted);
    }

    #[test]
    fn load_falls_back_to_home_config() {
        let mut env = EnvSandbox::acquire();
        let tmp = tempfile::tempdir().expect("tempdir");
        let cwd = tmp.path().join("cwd");
        std::fs::create_dir_all(&cwd).expect("create cwd");
        write_file(
            &tmp.path().join(".chance-champions").join("config.toml"),
            "[game]\nstarting_points = 42\n",
        );
        env.set("HOME", tmp.path());
        env.chdir(&cwd);

        let cfg = Config::load(None).expect("config load");
        assert_eq!(cfg.game.starting_points, 42);
    }

    #[test]
    fn load_prefers_working_directory_config() {
        let mut env = EnvSandbox::acquire();
        let tmp = tempfile::tempdir().expect("tempdir");
        let cwd = tmp.path().join("cwd");
        write_file(&cwd.join("config.toml"), "[game]\nstarting_points = 7\n");
        write_file(
            &tmp.path().join(".chance-champions").join("config.toml"),
            "[game]\nstarting_points = 42\n",
        );
        env.set("HOME", tmp.path());
        env.chdir(&cwd);

        let cfg = Config::load(None).expect("config load");
        assert_eq!(cfg.game.starting_points, 7);
    }

    #[test]
    fn load_returns_toml_error_for_invalid_content() {
        let _env = EnvSandbox::acquire();
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_path = tmp.path().join("config.toml");
        write_file(&config_path, "[coach\napi_key = \"broken\"");
        let err = Config::load(Some(&config_path)).expect_err("invalid toml must fail");
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let _env = EnvSandbox::acquire();
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_path = tmp.path().join("config.toml");
        write_file(&config_path, "[coach]\nprobe_max_attempts = 0\n");
        let err = Config::load(Some(&config_path)).expect_err("zero attempts must fail");
        assert!(err.to_string().contains("coach.probe_max_attempts"));

        write_file(&config_path, "[coach]\napi_key = \"two words\"\n");
        let err = Config::load(Some(&config_path)).expect_err("spaced key must fail");
        assert!(err.to_string().contains("coach.api_key"));
    }

    #[test]
    fn load_applies_env_overrides() {
        let mut env = EnvSandbox::acquire();
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_path = tmp.path().join("config.toml");
        write_file(&config_path, "[coach]\napi_key = \"from_file\"\n");

        env.set("GOOGLE_API_KEY", "google-key");
        let cfg = Config::load(Some(&config_path)).expect("config load");
        assert_eq!(cfg.coach.api_key(), Some("google-key"));

        env.set("GEMINI_API_KEY", "gemini-key");
        env.set("CHANCE_CHAMPIONS_BASE_URL", "http://proxy:9000");
        let cfg = Config::load(Some(&config_path)).expect("config load");
        assert_eq!(cfg.coach.api_key(), Some("gemini-key"));
        assert_eq!(cfg.coach.effective_base_url(), Some("http://proxy:9000"));
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let mut coach = CoachConfig {
            api_key: "   ".to_string(),
            base_url: Some(" ".to_string()),
            ..CoachConfig::default()
        };
        assert_eq!(coach.api_key(), None);
        assert_eq!(coach.effective_base_url(), None);
        coach.api_key = " AIza ".to_string();
        assert_eq!(coach.api_key(), Some("AIza"));
    }
}
