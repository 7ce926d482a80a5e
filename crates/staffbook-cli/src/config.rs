// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use staffbook_app::AuthState;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:8089";
const DEFAULT_API_TIMEOUT: &str = "10s";
const DEFAULT_TOKEN_ENV: &str = "STAFFBOOK_TOKEN";
const DEFAULT_LOG_LEVEL: &str = "warn";
const CONFIG_PATH_ENV: &str = "STAFFBOOK_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            storage: Storage::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub token_env: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
            token_env: Some(DEFAULT_TOKEN_ENV.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub mobile: Option<bool>,
    pub rows: Option<i64>,
    pub window: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(staffbook_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Regenerate it with --print-example-config",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            staffbook_db::validate_db_path(db_path)?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!("api.base_url in {} must not be empty", path.display());
        }

        if let Some(token_env) = &self.api.token_env
            && token_env.trim().is_empty()
        {
            bail!(
                "api.token_env in {} must name an environment variable",
                path.display()
            );
        }

        for (name, value) in [("ui.rows", self.ui.rows), ("ui.window", self.ui.window)] {
            if let Some(value) = value
                && value < 1
            {
                bail!(
                    "{name} in {} must be at least 1, got {value}",
                    path.display()
                );
            }
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => staffbook_db::default_db_path(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn token_env(&self) -> &str {
        self.api.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }

    /// Signed out unless the configured variable holds a non-blank token.
    pub fn auth_state(&self) -> AuthState {
        match env::var(self.token_env()) {
            Ok(token) if !token.trim().is_empty() => AuthState::with_token(token.trim()),
            _ => AuthState::signed_out(),
        }
    }

    pub fn mobile(&self) -> bool {
        self.ui.mobile.unwrap_or(false)
    }

    pub fn rows(&self) -> Option<usize> {
        self.ui.rows.and_then(|rows| usize::try_from(rows).ok())
    }

    /// Terminal lines available to the employee table, header included.
    pub fn window(&self) -> Option<usize> {
        self.ui.window.and_then(|lines| usize::try_from(lines).ok())
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# staffbook config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n# Name of the environment variable holding the bearer token\ntoken_env = \"{}\"\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/staffbook/staffbook.db)\n# db_path = \"/absolute/path/to/staffbook.db\"\n\n[ui]\nmobile = false\n# Pin the page size; otherwise it follows `window` or the default of 8\n# rows = 8\n# window = 24\n\n[log]\n# Overridden by STAFFBOOK_LOG\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_API_TIMEOUT,
            DEFAULT_TOKEN_ENV,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.api_base_url(), "http://localhost:8089");
        assert_eq!(config.api_timeout()?, Duration::from_secs(10));
        assert_eq!(config.token_env(), "STAFFBOOK_TOKEN");
        assert_eq!(config.log_level(), "warn");
        assert!(!config.mobile());
        assert_eq!(config.rows(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url = \"http://x\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        assert!(error.to_string().contains("version = 1"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"https://staff.example/api//\"\ntimeout = \"1500ms\"\ntoken_env = \"HR_TOKEN\"\n[ui]\nmobile = true\nrows = 5\nwindow = 30\n[log]\nlevel = \"debug\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.api_base_url(), "https://staff.example/api");
        assert_eq!(config.api_timeout()?, Duration::from_millis(1500));
        assert_eq!(config.token_env(), "HR_TOKEN");
        assert!(config.mobile());
        assert_eq!(config.rows(), Some(5));
        assert_eq!(config.window(), Some(30));
        assert_eq!(config.log_level(), "debug");
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 3\n")?;
        let error = Config::load(&path).expect_err("v3 config should fail");
        assert!(error.to_string().contains("unsupported config version 3"));
        Ok(())
    }

    #[test]
    fn non_positive_ui_values_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nrows = 0\n")?;
        let error = Config::load(&path).expect_err("zero rows should fail");
        assert!(error.to_string().contains("ui.rows"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn db_path_rejects_uri_style_storage_value() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[storage]\ndb_path = \"https://evil.example/x.db\"\n")?;
        let error = Config::load(&path).expect_err("URI db_path should fail validation");
        assert!(error.to_string().contains("looks like a URI"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn db_path_uses_env_override_when_storage_db_path_missing() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(staffbook_db::DB_PATH_ENV, "/from/env-only.db");
        }
        let config = Config::load(&path)?;
        let resolved = config.db_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(staffbook_db::DB_PATH_ENV);
        }
        assert_eq!(resolved, PathBuf::from("/from/env-only.db"));
        Ok(())
    }

    #[test]
    fn auth_state_reads_the_configured_variable() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n[api]\ntoken_env = \"STAFFBOOK_TEST_TOKEN\"\n")?;
        let config = Config::load(&path)?;

        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("STAFFBOOK_TEST_TOKEN", " abc ");
        }
        let signed_in = config.auth_state();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("STAFFBOOK_TEST_TOKEN");
        }
        assert_eq!(signed_in.bearer(), Ok("abc"));
        assert!(!config.auth_state().is_authenticated);
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert!(parse_duration("soon").is_err());
        Ok(())
    }

    #[test]
    fn example_config_round_trips() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert_eq!(config.version, 1);
        assert_eq!(config.token_env(), "STAFFBOOK_TOKEN");
        Ok(())
    }
}
