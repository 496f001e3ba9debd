use secrecy::SecretString;

use crate::{Error, Result};

pub const AZURE_OPENAI_API_KEY_ENV_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_OPENAI_ENDPOINT_ENV_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_OPENAI_DEPLOYMENT_ENV_VAR: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const AZURE_OPENAI_API_VERSION_ENV_VAR: &str = "AZURE_OPENAI_API_VERSION";

pub const DEFAULT_API_VERSION: &str = "2024-07-01-preview";

/// Settings needed to reach one Azure OpenAI deployment. Read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: SecretString,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let require =
            |name: &str| get(name).ok_or_else(|| Error::MissingEnvVar(name.to_string()));

        Ok(Self {
            api_key: require(AZURE_OPENAI_API_KEY_ENV_VAR)?.into(),
            endpoint: require(AZURE_OPENAI_ENDPOINT_ENV_VAR)?,
            deployment: require(AZURE_OPENAI_DEPLOYMENT_ENV_VAR)?,
            api_version: get(AZURE_OPENAI_API_VERSION_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }
}
