//! Runtime settings: built-in defaults, then an optional `travel_crew.toml`,
//! then `TRAVEL_CREW__*` environment variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentModelConfig, LlmConfig};
use crate::llm::LlmError;
use crate::memory::MemoryConfig;
use crate::tools::KnowledgeBaseConfig;

pub const ENV_PREFIX: &str = "TRAVEL_CREW";
pub const DEFAULT_CONFIG_FILE: &str = "travel_crew";
pub const DEFAULT_MODEL: &str = "bedrock/anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// `vendor/model-id`
    pub model: String,
    pub region: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub max_iter: usize,
    pub verbose: bool,
    pub search: SearchSettings,
    #[serde(default)]
    pub knowledge_base: Option<KnowledgeBaseConfig>,
    #[serde(default)]
    pub memory: Option<MemoryConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub endpoint: String,
}

impl Settings {
    /// Load settings; an explicit `config_file` must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(config_file, environment())
    }

    fn from_sources(config_file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        let settings: Settings = Config::builder()
            .set_default("model", DEFAULT_MODEL)?
            .set_default("region", region)?
            .set_default("max_tokens", crate::agent::agent::DEFAULT_MAX_TOKENS as u64)?
            .set_default("max_iter", crate::agent::agent::DEFAULT_MAX_ITER as u64)?
            .set_default("verbose", false)?
            .set_default("search.endpoint", "https://api.duckduckgo.com/")?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        tracing::debug!(model = %settings.model, region = %settings.region, "settings loaded");
        Ok(settings)
    }

    pub fn llm_config(&self) -> Result<LlmConfig, LlmError> {
        LlmConfig::parse(&self.model, &self.region)
    }

    /// Model handle for agents, with provider credentials from the environment
    pub fn agent_model(&self) -> Result<AgentModelConfig, LlmError> {
        let llm = self.llm_config()?;
        let mut model = AgentModelConfig::new(llm.build_provider()?, llm.model_id.clone())
            .with_max_tokens(self.max_tokens);
        if let Some(temperature) = self.temperature {
            model = model.with_temperature(temperature);
        }
        Ok(model)
    }

    /// Knowledge-base settings with the region filled in
    pub fn knowledge_base_config(&self) -> Option<KnowledgeBaseConfig> {
        self.knowledge_base.clone().map(|mut kb| {
            if kb.region.trim().is_empty() {
                kb.region = self.region.clone();
            }
            kb
        })
    }

    /// Memory settings with the region filled in
    pub fn memory_config(&self) -> Option<MemoryConfig> {
        self.memory.clone().map(|mut memory| {
            if memory.region.is_none() {
                memory.region = Some(self.region.clone());
            }
            memory
        })
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
