use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use heron::providers::configs::{GroqProviderConfig, OpenAiProviderConfig, ProviderConfig};
use heron::providers::groq::GROQ_HOST;
use heron::providers::openai::OPENAI_HOST;
use heron::registry::ModelRegistry;
use heron::search::{SearchConfig, DEFAULT_MAX_RESULTS, TAVILY_HOST};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    Groq {
        #[serde(default = "default_groq_host")]
        host: String,
        api_key: String,
        #[serde(default = "default_models")]
        models: Vec<String>,
        #[serde(default = "default_temperature")]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        api_key: String,
        models: Vec<String>,
        #[serde(default = "default_temperature")]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    /// Build the model allow-list mapping resolved at configuration load
    pub fn into_registry(self) -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        match self {
            ProviderSettings::Groq {
                host,
                api_key,
                models,
                temperature,
                max_tokens,
            } => {
                for model in models {
                    registry.register(
                        model.clone(),
                        ProviderConfig::Groq(GroqProviderConfig {
                            host: host.clone(),
                            api_key: api_key.clone(),
                            model,
                            temperature,
                            max_tokens,
                        }),
                    );
                }
            }
            ProviderSettings::OpenAi {
                host,
                api_key,
                models,
                temperature,
                max_tokens,
            } => {
                for model in models {
                    registry.register(
                        model.clone(),
                        ProviderConfig::OpenAi(OpenAiProviderConfig {
                            host: host.clone(),
                            api_key: api_key.clone(),
                            model,
                            temperature,
                            max_tokens,
                        }),
                    );
                }
            }
        }
        registry
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl SearchSettings {
    pub fn into_config(self) -> SearchConfig {
        SearchConfig {
            host: self.host,
            api_key: self.api_key,
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub search: Option<SearchSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration, then layer on the environment
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .add_source(
                Environment::with_prefix("HERON")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("provider.models")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Surface missing fields as the environment variable to set
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9999
}

fn default_groq_host() -> String {
    GROQ_HOST.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_models() -> Vec<String> {
    vec![
        "llama-3.3-70b-versatile".to_string(),
        "llama-3.1-8b-instant".to_string(),
    ]
}

fn default_temperature() -> Option<f32> {
    Some(0.2)
}

fn default_search_host() -> String {
    TAVILY_HOST.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}
