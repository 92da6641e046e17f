use serde::{Deserialize, Serialize};

pub const GOOGLE_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GOOGLE_MODEL: &str = "gemini-flash-lite-latest";
pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProviderConfig {
    Google(GoogleProviderConfig),
    OpenAi(OpenAiProviderConfig),
}

impl ProviderConfig {
    /// The same configuration authenticated with a different key.
    ///
    /// Keys are supplied per conversation turn, so the configured value is
    /// only a fallback.
    pub fn with_api_key<S: Into<String>>(self, api_key: S) -> Self {
        match self {
            ProviderConfig::Google(config) => ProviderConfig::Google(GoogleProviderConfig {
                api_key: api_key.into(),
                ..config
            }),
            ProviderConfig::OpenAi(config) => ProviderConfig::OpenAi(OpenAiProviderConfig {
                api_key: api_key.into(),
                ..config
            }),
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            ProviderConfig::Google(config) => &config.api_key,
            ProviderConfig::OpenAi(config) => &config.api_key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl GoogleProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: GOOGLE_HOST.to_string(),
            api_key: api_key.into(),
            model: GOOGLE_MODEL.to_string(),
            temperature: Some(0.7),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_api_key_keeps_other_settings() {
        let config = ProviderConfig::Google(GoogleProviderConfig::new("")).with_api_key("turn-key");
        assert_eq!(config.api_key(), "turn-key");

        if let ProviderConfig::Google(config) = config {
            assert_eq!(config.host, GOOGLE_HOST);
            assert_eq!(config.model, GOOGLE_MODEL);
            assert_eq!(config.temperature, Some(0.7));
        } else {
            panic!("Expected Google config");
        }
    }
}
