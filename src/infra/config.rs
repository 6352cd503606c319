use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "agent.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Where a capability gets its data: a static in-process table or a remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    #[default]
    Offline,
    Live,
}

impl FromStr for BackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(BackendMode::Offline),
            "live" => Ok(BackendMode::Live),
            other => Err(ConfigError::Invalid(format!(
                "invalid backend mode '{other}', expected 'offline' or 'live'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(2),
            total: Duration::from_secs(6),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub mode: String, // "server" or "stdio"
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: "server".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub connect_timeout_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".into(),
            model: "openai/gpt-4o".into(),
            api_key: None,
            max_tokens: 1000,
            connect_timeout_ms: None,
            // model calls are slower than the data services
            timeout_ms: Some(30_000),
        }
    }
}

impl PlannerConfig {
    pub fn timeouts(&self) -> HttpTimeouts {
        timeouts_from(self.connect_timeout_ms, self.timeout_ms)
    }
}

/// Settings shared by the weather and exchange-rate capabilities.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub mode: BackendMode,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl ToolConfig {
    pub fn timeouts(&self) -> HttpTimeouts {
        timeouts_from(self.connect_timeout_ms, self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    pub path: PathBuf,
    pub llm_fallback: bool,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/kb.json"),
            llm_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub planner: PlannerConfig,
    pub weather: ToolConfig,
    pub fx: ToolConfig,
    pub kb: KbConfig,
}

impl AppConfig {
    /// Optional TOML file (`AGENT_CONFIG`, or `agent.toml` when present), then env overrides.
    pub fn from_env_and_toml() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("AGENT_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(path.trim()))?,
            _ if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            _ => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(mode) = env_nonempty("MODE") {
            self.server.mode = mode;
        }
        if let Some(port) = env_nonempty("PORT").and_then(|s| s.parse::<u16>().ok()) {
            self.server.port = port;
        }

        if let Some(key) = env_nonempty("OPENAI_API_KEY") {
            self.planner.api_key = Some(key);
        }
        if let Some(url) = env_nonempty("PLANNER_BASE_URL") {
            self.planner.base_url = url;
        }
        if let Some(model) = env_nonempty("PLANNER_MODEL") {
            self.planner.model = model;
        }

        apply_tool_env(&mut self.weather, "WEATHER")?;
        apply_tool_env(&mut self.fx, "FX")?;

        if let Some(path) = env_nonempty("KB_PATH") {
            self.kb.path = PathBuf::from(path);
        }
        if let Some(flag) = env_nonempty("KB_LLM_FALLBACK") {
            self.kb.llm_fallback = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Some(ms) = env_nonempty("UPSTREAM_TIMEOUT_MS").and_then(|s| s.parse::<u64>().ok()) {
            self.planner.timeout_ms = Some(ms);
            self.weather.timeout_ms = Some(ms);
            self.fx.timeout_ms = Some(ms);
        }
        Ok(())
    }

    /// Report everything that would make startup fail, without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.server.mode.as_str(), "server" | "stdio") {
            return Err(ConfigError::Invalid(format!(
                "Invalid MODE: {}. Must be 'server' or 'stdio'",
                self.server.mode
            )));
        }
        if self.server.mode == "server" && self.server.port == 0 {
            return Err(ConfigError::Invalid("PORT cannot be 0".into()));
        }
        if self.planner.api_key.is_none() {
            return Err(ConfigError::Invalid("OPENAI_API_KEY is not set".into()));
        }
        if self.weather.mode == BackendMode::Live && self.weather.api_key.is_none() {
            return Err(ConfigError::Invalid(
                "WEATHER_API_KEY is not set but weather mode is 'live'".into(),
            ));
        }
        if self.fx.mode == BackendMode::Live && self.fx.api_key.is_none() {
            return Err(ConfigError::Invalid(
                "FX_API_KEY is not set but fx mode is 'live'".into(),
            ));
        }
        Ok(())
    }
}

fn apply_tool_env(cfg: &mut ToolConfig, prefix: &str) -> Result<(), ConfigError> {
    if let Some(mode) = env_nonempty(&format!("{prefix}_MODE")) {
        cfg.mode = mode.parse()?;
    }
    if let Some(url) = env_nonempty(&format!("{prefix}_BASE_URL")) {
        cfg.base_url = Some(url);
    }
    if let Some(key) = env_nonempty(&format!("{prefix}_API_KEY")) {
        cfg.api_key = Some(key);
    }
    Ok(())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timeouts_from(connect_ms: Option<u64>, total_ms: Option<u64>) -> HttpTimeouts {
    let default = HttpTimeouts::default();
    HttpTimeouts {
        connect: connect_ms.map(Duration::from_millis).unwrap_or(default.connect),
        total: total_ms.map(Duration::from_millis).unwrap_or(default.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const VARS: &[&str] = &[
        "AGENT_CONFIG",
        "MODE",
        "PORT",
        "OPENAI_API_KEY",
        "PLANNER_BASE_URL",
        "PLANNER_MODEL",
        "WEATHER_MODE",
        "WEATHER_BASE_URL",
        "WEATHER_API_KEY",
        "FX_MODE",
        "FX_BASE_URL",
        "FX_API_KEY",
        "KB_PATH",
        "KB_LLM_FALLBACK",
        "UPSTREAM_TIMEOUT_MS",
    ];

    fn clear_env() {
        for v in VARS {
            std::env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn defaults_to_server_8080_and_offline_backends() {
        clear_env();
        let mut cfg = AppConfig::default();
        cfg.apply_env().unwrap();
        assert_eq!(cfg.server.mode, "server");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.weather.mode, BackendMode::Offline);
        assert_eq!(cfg.fx.mode, BackendMode::Offline);
        assert_eq!(cfg.kb.path, PathBuf::from("data/kb.json"));
        assert_eq!(cfg.planner.model, "openai/gpt-4o");
        assert!(!cfg.kb.llm_fallback);
    }

    #[test]
    #[serial]
    fn parses_env_overrides() {
        clear_env();
        std::env::set_var("MODE", "stdio");
        std::env::set_var("PORT", "9090");
        std::env::set_var("WEATHER_MODE", "LIVE");
        std::env::set_var("WEATHER_API_KEY", "wk");
        std::env::set_var("KB_LLM_FALLBACK", "true");
        std::env::set_var("UPSTREAM_TIMEOUT_MS", "1500");
        let mut cfg = AppConfig::default();
        cfg.apply_env().unwrap();
        assert_eq!(cfg.server.mode, "stdio");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.weather.mode, BackendMode::Live);
        assert_eq!(cfg.weather.api_key.as_deref(), Some("wk"));
        assert!(cfg.kb.llm_fallback);
        assert_eq!(cfg.fx.timeouts().total, Duration::from_millis(1500));
        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_unknown_backend_mode() {
        clear_env();
        std::env::set_var("FX_MODE", "sometimes");
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env().unwrap_err();
        assert!(err.to_string().contains("invalid backend mode"));
        clear_env();
    }

    #[test]
    #[serial]
    fn reads_toml_file_then_env_wins() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[planner]
model = "local/test"
api_key = "from-file"

[fx]
mode = "live"
base_url = "http://fx.local"
timeout_ms = 250

[kb]
path = "/tmp/kb.json"
"#
        )
        .unwrap();
        std::env::set_var("AGENT_CONFIG", file.path());
        std::env::set_var("OPENAI_API_KEY", "from-env");
        let cfg = AppConfig::from_env_and_toml().unwrap();
        assert_eq!(cfg.planner.model, "local/test");
        assert_eq!(cfg.planner.api_key.as_deref(), Some("from-env"));
        assert_eq!(cfg.fx.mode, BackendMode::Live);
        assert_eq!(cfg.fx.base_url.as_deref(), Some("http://fx.local"));
        assert_eq!(cfg.fx.timeouts().total, Duration::from_millis(250));
        assert_eq!(cfg.fx.timeouts().connect, Duration::from_secs(2));
        assert_eq!(cfg.kb.path, PathBuf::from("/tmp/kb.json"));
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_config_file_is_an_error() {
        clear_env();
        std::env::set_var("AGENT_CONFIG", "/definitely/not/here.toml");
        let err = AppConfig::from_env_and_toml().unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        clear_env();
    }

    #[test]
    fn validate_reports_missing_keys_and_bad_mode() {
        let mut cfg = AppConfig::default();
        assert!(cfg.validate().unwrap_err().to_string().contains("OPENAI_API_KEY"));

        cfg.planner.api_key = Some("k".into());
        assert!(cfg.validate().is_ok());

        cfg.weather.mode = BackendMode::Live;
        assert!(cfg.validate().unwrap_err().to_string().contains("WEATHER_API_KEY"));
        cfg.weather.api_key = Some("w".into());

        cfg.server.mode = "invalid".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("Invalid MODE"));

        cfg.server.mode = "server".into();
        cfg.server.port = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("PORT cannot be 0"));
    }
}
