use std::sync::Arc;

use ai_client::{ChatModel, Ollama, OpenAi};
use persona_common::{Config, ModelProvider, PersonaError};
use tracing::info;

/// Build the configured model backend.
///
/// Provider credentials are checked here rather than at config load, so
/// commands that never talk to a model work without them.
pub fn chat_model(config: &Config) -> Result<Arc<dyn ChatModel>, PersonaError> {
    let model: Arc<dyn ChatModel> = match config.model_provider {
        ModelProvider::Ollama => {
            Arc::new(Ollama::new(&config.model_name).with_base_url(&config.ollama_base_url))
        }
        ModelProvider::OpenAi => {
            let mut client = OpenAi::new(config.require_openai_key()?, &config.model_name);
            if let Some(url) = &config.openai_base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
    };
    info!(model = model.model(), "Model client initialized");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key: &str| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn ollama_is_the_default_backend() {
        let model = chat_model(&config(&[])).unwrap();
        assert_eq!(model.model(), "mistral");
    }

    #[test]
    fn openai_without_key_fails_at_build_time() {
        let config = config(&[("MODEL_PROVIDER", "openai"), ("PERSONA_MODEL", "gpt-4o-mini")]);
        let err = chat_model(&config).err().unwrap();
        assert!(matches!(err, PersonaError::Config(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn openai_with_key_builds() {
        let config = config(&[
            ("MODEL_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PERSONA_MODEL", "gpt-4o-mini"),
        ]);
        assert_eq!(chat_model(&config).unwrap().model(), "gpt-4o-mini");
    }
}
