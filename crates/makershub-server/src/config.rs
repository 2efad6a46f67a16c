//! YAML server configuration with environment overrides for secrets.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Deterministic intent and slot-filling engine.
    #[default]
    Flow,
    /// LLM with tool calling.
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    #[serde(default)]
    pub service_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    makershub_agent::DEFAULT_MODEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub backend: Backend,
    /// Absent means in-memory storage, for local runs.
    #[serde(default)]
    pub supabase: Option<SupabaseConfig>,
    /// Required when `backend` is `agent`.
    #[serde(default)]
    pub anthropic: Option<AnthropicConfig>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    /// Secrets from the environment win over the file so keys can stay out
    /// of checked-in YAML.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("SUPABASE_SERVICE_KEY") {
            if let Some(supabase) = &mut self.supabase {
                supabase.service_key = key;
            }
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if let Some(anthropic) = &mut self.anthropic {
                anthropic.api_key = key;
            }
        }
    }
}
