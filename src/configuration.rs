use std::path::Path;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub api_keys: ApiKeys,
    pub geocoder: GeocoderSettings,
    pub search: SearchSettings,
    pub scraper: ScraperSettings,
    pub model: ModelSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct ApiKeys {
    pub gemini: String,
}

#[derive(Deserialize, Clone)]
pub struct GeocoderSettings {
    pub base_url: String,
    /// Nominatim rejects requests without an identifying agent.
    pub user_agent: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct SearchSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub num_results: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub captcha_retries: u8,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub proxies: Vec<String>,
}

#[derive(Deserialize, Clone)]
pub struct ScraperSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_page_chars: usize,
}

#[derive(Deserialize, Clone)]
pub struct ModelSettings {
    pub api_base: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    // The deployment this replaces kept its key under this name
    let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

    load_settings(
        &base_path.join("configuration"),
        environment,
        gemini_api_key,
    )
}

/// `base.yaml`, then the environment's file, then the model key override,
/// then `APP_*` variables.
pub fn load_settings(
    configuration_directory: &Path,
    environment: Environment,
    gemini_api_key: Option<String>,
) -> Result<Settings, config::ConfigError> {
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .set_override_option("api_keys.gemini", gemini_api_key)?
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
