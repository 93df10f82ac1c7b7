// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reportview_app::StalePolicy;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "reportview";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_COPIED_RESET: &str = "2s";
const DEFAULT_PRINT_COMMAND: &str = "lp";
const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_BASE_URL: &str = match option_env!("REPORTVIEW_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:8080/",
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub viewer: Viewer,
    #[serde(default)]
    pub host: Host,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            viewer: Viewer::default(),
            host: Host::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Viewer {
    pub discard_stale_responses: Option<bool>,
    pub copied_reset: Option<String>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            discard_stale_responses: Some(false),
            copied_reset: Some(DEFAULT_COPIED_RESET.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Host {
    pub clipboard_command: Option<String>,
    pub print_command: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("REPORTVIEW_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set REPORTVIEW_CONFIG_PATH to the config file"
            )
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
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
                    "config file {} has no version. Add `version = 1` and place values under [source], [viewer], [host], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
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
        if let Some(base_url) = &self.source.base_url {
            reportview_fetch::normalize_base_url(base_url)
                .with_context(|| format!("invalid [source] in {}", path.display()))?;
        }

        if let Some(timeout) = &self.source.timeout
            && parse_duration(timeout)? <= Duration::ZERO
        {
            bail!(
                "source.timeout in {} must be positive, got {}",
                path.display(),
                timeout
            );
        }

        if let Some(reset) = &self.viewer.copied_reset
            && parse_duration(reset)? <= Duration::ZERO
        {
            bail!(
                "viewer.copied_reset in {} must be positive, got {}",
                path.display(),
                reset
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "log.level {:?} in {} is not a valid filter ({error}); try info or debug",
                    level,
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn set_base_url_override(&mut self, base_url: &str) -> Result<()> {
        reportview_fetch::normalize_base_url(base_url).context("invalid --base-url")?;
        self.source.base_url = Some(base_url.to_owned());
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.source.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn stale_policy(&self) -> StalePolicy {
        StalePolicy::from_discard_flag(self.viewer.discard_stale_responses.unwrap_or(false))
    }

    pub fn copied_reset(&self) -> Result<Duration> {
        parse_duration(
            self.viewer
                .copied_reset
                .as_deref()
                .unwrap_or(DEFAULT_COPIED_RESET),
        )
    }

    /// `None` means the system clipboard.
    pub fn clipboard_command(&self) -> Option<&str> {
        self.host
            .clipboard_command
            .as_deref()
            .map(str::trim)
            .filter(|command| !command.is_empty())
    }

    pub fn print_command(&self) -> &str {
        self.host
            .print_command
            .as_deref()
            .map(str::trim)
            .filter(|command| !command.is_empty())
            .unwrap_or(DEFAULT_PRINT_COMMAND)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set [log].file in the config")
        })?;
        Ok(cache_root.join(APP_NAME).join("reportview.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# reportview config\n# Place this file at: {}\n\nversion = 1\n\n[source]\n# Deployment prefix that serves reports/index.json\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[viewer]\n# Drop report responses that arrive after a newer selection\ndiscard_stale_responses = false\ncopied_reset = \"{}\"\n\n[host]\n# Empty: system clipboard. Otherwise a helper fed on stdin, e.g. wl-copy\nclipboard_command = \"\"\nprint_command = \"{}\"\n\n[log]\nlevel = \"{}\"\n# file = \"/absolute/path/to/reportview.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_COPIED_RESET,
            DEFAULT_PRINT_COMMAND,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
