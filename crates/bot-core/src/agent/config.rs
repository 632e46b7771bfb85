use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::auth::AuthState;

/// Runtime knobs for the action pipeline. Everything has a deployment default
/// so a missing config file is not fatal.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    /// Identity whose directives may toggle authorization state.
    pub trusted_principal: String,
    /// Per-step Euclidean distance bound for geometry-bound primitives.
    pub max_reach: f64,
    /// Step cap on the periodic planning path.
    pub plan_cap: usize,
    /// Step cap on the chat-triggered path.
    pub chat_action_cap: usize,
    /// Fixed inter-step delay, applied whether the step succeeded or failed.
    pub step_delay_ms: u64,
    /// Planning tick period.
    pub tick_seconds: u64,
    /// Deployment policy: elevated by default.
    pub elevated: bool,
    pub commands_enabled: bool,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    /// Full generate endpoint URL.
    pub endpoint: String,
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/api/generate".to_string(),
            model: "llama3".to_string(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trusted_principal: "admin".to_string(),
            max_reach: 10.0,
            plan_cap: 8,
            chat_action_cap: 10,
            step_delay_ms: 180,
            tick_seconds: 30,
            elevated: true,
            commands_enabled: false,
            llm: LlmSettings::default(),
        }
    }
}

impl BotConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }

    /// Initial authorization state under this config's deployment policy.
    pub fn auth_state(&self) -> AuthState {
        AuthState::new(
            self.trusted_principal.clone(),
            self.elevated,
            self.commands_enabled,
        )
    }
}

/// Minimal TOML config loader.
///
/// Search order:
/// 1) `CRAFTY_BOT_CONFIG_DIR/<relative_path>`
/// 2) `./<relative_path>`
/// 3) `<repo_root>/config/<relative_path>` (repo-local convenience)
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn parse_from_file<T: DeserializeOwned>(relative_path: &str) -> anyhow::Result<T> {
        let path = Self::resolve_path(relative_path)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse_from_string(text)
    }

    pub fn parse_from_string<T: DeserializeOwned>(text: String) -> anyhow::Result<T> {
        toml::from_str(&text).with_context(|| "Failed to parse TOML")
    }

    fn resolve_path(relative_path: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(relative_path);

        if let Some(root) = env::var_os("CRAFTY_BOT_CONFIG_DIR") {
            let candidate = PathBuf::from(root).join(rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        if let Ok(cwd) = env::current_dir() {
            let candidate = cwd.join(rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        // This crate typically lives at <repo_root>/crates/bot-core.
        let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .ancestors()
            .nth(2)
            .ok_or_else(|| anyhow::anyhow!("CARGO_MANIFEST_DIR has insufficient ancestors"))?
            .join("config")
            .join(rel);
        if candidate.is_file() {
            return Ok(candidate);
        }

        anyhow::bail!("Config file not found for {:?}", rel);
    }
}
