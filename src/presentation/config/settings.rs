use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File};
use serde::Deserialize;
use thiserror::Error;

use super::Environment;

/// Flat variables honoured for compatibility with existing deployments.
const LEGACY_ENV_KEYS: [(&str, &str); 6] = [
    ("LLM_PROVIDER", "llm.provider"),
    ("OPENAI_API_KEY", "llm.openai_api_key"),
    ("OLLAMA_BASE_URL", "llm.ollama_base_url"),
    ("EMR_API_URL", "emr.api_url"),
    ("UPLOAD_DIR", "upload.upload_dir"),
    ("SERVER_PORT", "server.port"),
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Environment(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub emr: EmrSettings,
    pub upload: UploadSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub ollama_base_url: String,
    pub request_timeout_secs: u64,
    pub prompt_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmrSettings {
    pub api_url: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    pub upload_dir: String,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub enable_json: bool,
}

impl Settings {
    /// Loads `.env`, config files under `config/`, then environment variables.
    pub fn load() -> Result<(Self, Environment), SettingsError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env().map_err(SettingsError::Environment)?;

        let mut builder = Self::file_layers(environment, Path::new("config"))?.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        );

        for (var, key) in LEGACY_ENV_KEYS {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        let settings = builder.build()?.try_deserialize()?;
        Ok((settings, environment))
    }

    /// Defaults plus the optional `base` and per-environment files in `config_dir`.
    pub fn from_dir(environment: Environment, config_dir: &Path) -> Result<Self, SettingsError> {
        let settings = Self::file_layers(environment, config_dir)?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    fn file_layers(
        environment: Environment,
        config_dir: &Path,
    ) -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        let base = config_dir.join("base");
        let env_file = config_dir.join(environment.as_str());

        let builder = Self::defaults()?
            .add_source(File::with_name(&base.to_string_lossy()).required(false))
            .add_source(File::with_name(&env_file.to_string_lossy()).required(false));

        Ok(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000_i64)?
            .set_default("llm.provider", "openai")?
            .set_default("llm.ollama_base_url", "http://localhost:11434/v1")?
            .set_default("llm.request_timeout_secs", 60_i64)?
            .set_default("llm.prompt_path", "prompts/soap_note.txt")?
            .set_default("emr.request_timeout_secs", 60_i64)?
            .set_default("upload.upload_dir", "uploads")?
            .set_default("upload.max_file_size_mb", 200_i64)?
            .set_default("logging.enable_json", false)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.upload.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}
