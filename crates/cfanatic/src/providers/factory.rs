use super::{
    base::Provider, configs::ProviderConfig, google::GoogleProvider, openai::OpenAiProvider,
};
use anyhow::{bail, Result};

pub fn get_provider(config: ProviderConfig) -> Result<Box<dyn Provider>> {
    if config.api_key().trim().is_empty() {
        bail!("No API key provided for the model provider");
    }

    match config {
        ProviderConfig::Google(google_config) => Ok(Box::new(GoogleProvider::new(google_config)?)),
        ProviderConfig::OpenAi(openai_config) => Ok(Box::new(OpenAiProvider::new(openai_config)?)),
    }
}
