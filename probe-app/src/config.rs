//! llmprobe configuration loader.
//!
//! Precedence for every endpoint setting: CLI flag, then `[targets.*]` in the
//! config file, then the built-in preset.

use crate::targets::Target;
use probe_llm::EndpointConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Pause between sequential requests and between probes.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_pause_ms() -> u64 {
    1000
}

fn default_color() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            pause_ms: default_pause_ms(),
            color: default_color(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub deepseek: TargetOverrides,
    #[serde(default)]
    pub qwen: TargetOverrides,
    #[serde(default)]
    pub qwen_native: TargetOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetOverrides {
    pub api_base: Option<String>,
    pub api_version: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl TargetOverrides {
    pub fn apply(&self, mut endpoint: EndpointConfig) -> EndpointConfig {
        if let Some(v) = self.api_base.as_deref() {
            endpoint = endpoint.with_base_url(v);
        }
        if let Some(v) = self.api_version.as_deref() {
            endpoint = endpoint.with_api_version(v);
        }
        if let Some(v) = self.model.as_deref() {
            endpoint = endpoint.with_model(v);
        }
        if let Some(secs) = self.timeout_secs {
            endpoint = endpoint.with_completion_timeout(Duration::from_secs(secs));
        }
        endpoint
    }
}

impl ProbeConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit file is an error.
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load_from(&p, true).await,
            None => Self::load_from(&default_config_path(), false).await,
        }
    }

    async fn load_from(path: &Path, explicit: bool) -> anyhow::Result<Self> {
        let mut cfg = match tokio::fs::read_to_string(path).await {
            Ok(contents) => Self::parse(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_env_overrides(|name| std::env::var(name).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LLMPROBE_PAUSE_MS") {
            if !v.trim().is_empty() {
                self.general.pause_ms = v
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("LLMPROBE_PAUSE_MS={v:?}: {e}"))?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (key, overrides) in [
            ("deepseek", &self.targets.deepseek),
            ("qwen", &self.targets.qwen),
            ("qwen_native", &self.targets.qwen_native),
        ] {
            if overrides.api_base.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(anyhow::anyhow!("targets.{key}.api_base must not be empty"));
            }
            if overrides.model.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(anyhow::anyhow!("targets.{key}.model must not be empty"));
            }
            if overrides.timeout_secs == Some(0) {
                return Err(anyhow::anyhow!("targets.{key}.timeout_secs must be > 0"));
            }
        }
        Ok(())
    }

    pub fn overrides_for(&self, target: Target) -> &TargetOverrides {
        match target {
            Target::DeepSeek => &self.targets.deepseek,
            Target::Qwen => &self.targets.qwen,
            Target::QwenNative => &self.targets.qwen_native,
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.general.pause_ms)
    }
}

pub fn default_config_path() -> PathBuf {
    config_path_under(std::env::var("HOME").ok())
}

/// `~/.llmprobe/config.toml`, relative to the working directory when there is no home.
fn config_path_under(home: Option<String>) -> PathBuf {
    let home = home.unwrap_or_else(|| ".".to_string());
    Path::new(&home).join(".llmprobe").join("config.toml")
}
