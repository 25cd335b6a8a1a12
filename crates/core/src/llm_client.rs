use crate::error::GenerationError;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// Gemini's OpenAI-compatible endpoint.
pub const GEMINI_OPENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Sampling parameters applied to every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            max_output_tokens: 200,
        }
    }
}

/// A configured handle to a text-generation endpoint. Text in, text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Sends one prompt and returns the generated text.
    async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Creates one model handle per session.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn create_model(&self) -> Result<Arc<dyn GenerationModel>, GenerationError>;
}

/// Runs a generation call with a bounded wait.
///
/// Expiry of `deadline` is reported as [`GenerationError::Timeout`]; the
/// underlying request future is dropped.
pub async fn generate_with_deadline(
    model: &dyn GenerationModel,
    prompt: &str,
    deadline: Duration,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(deadline, model.generate_content(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(deadline)),
    }
}

/// A [`ModelProvider`] for Gemini through its OpenAI-compatible API.
pub struct GeminiProvider {
    api_key: String,
    api_base: String,
    settings: GenerationSettings,
}

impl GeminiProvider {
    /// Creates a provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The Gemini API key.
    /// * `api_base` - Base URL of the OpenAI-compatible endpoint.
    /// * `settings` - Model id and sampling parameters for every call.
    pub fn new(api_key: String, api_base: String, settings: GenerationSettings) -> Self {
        Self {
            api_key,
            api_base,
            settings,
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn create_model(&self) -> Result<Arc<dyn GenerationModel>, GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::InvalidCredential(
                "GEMINI_API_KEY is empty".to_string(),
            ));
        }
        let config = OpenAIConfig::new()
            .with_api_key(&self.api_key)
            .with_api_base(&self.api_base);
        Ok(Arc::new(GeminiModel::new(config, self.settings.clone())))
    }
}

/// A per-session Gemini handle.
pub struct GeminiModel {
    client: Client<OpenAIConfig>,
    settings: GenerationSettings,
}

impl GeminiModel {
    pub fn new(config: OpenAIConfig, settings: GenerationSettings) -> Self {
        Self {
            client: Client::with_config(config),
            settings,
        }
    }
}

#[async_trait]
impl GenerationModel for GeminiModel {
    #[allow(deprecated)]
    async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .temperature(self.settings.temperature)
            .top_p(self.settings.top_p)
            .max_tokens(self.settings.max_output_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;
        debug!(model = %self.settings.model, choices = response.choices.len(), "Generation call returned");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.model, "gemini-1.5-flash");
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.top_p, 0.95);
        assert_eq!(settings.max_output_tokens, 200);
    }

    #[tokio::test]
    async fn test_provider_rejects_blank_key() {
        let provider = GeminiProvider::new(
            "   ".to_string(),
            GEMINI_OPENAI_API_BASE.to_string(),
            GenerationSettings::default(),
        );
        let err = provider.create_model().await.err().expect("blank key must fail");
        assert!(matches!(err, GenerationError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_provider_creates_model_without_network() {
        let provider = GeminiProvider::new(
            "test-gemini-key".to_string(),
            GEMINI_OPENAI_API_BASE.to_string(),
            GenerationSettings::default(),
        );
        assert!(provider.create_model().await.is_ok());
    }

    #[tokio::test]
    async fn test_deadline_passes_through_result() {
        let mut model = MockGenerationModel::new();
        model
            .expect_generate_content()
            .withf(|prompt| prompt.contains("hello"))
            .times(1)
            .returning(|_| Ok("Hi, I am Rev!".to_string()));

        let text = generate_with_deadline(&model, "hello", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(text, "Hi, I am Rev!");
    }

    #[tokio::test]
    async fn test_deadline_passes_through_error() {
        let mut model = MockGenerationModel::new();
        model
            .expect_generate_content()
            .returning(|_| Err(GenerationError::EmptyResponse));

        let err = generate_with_deadline(&model, "hello", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    struct StalledModel;

    #[async_trait]
    impl GenerationModel for StalledModel {
        async fn generate_content(&self, _prompt: &str) -> Result<String, GenerationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let deadline = Duration::from_millis(20);
        let err = generate_with_deadline(&StalledModel, "hello", deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(d) if d == deadline));
    }
}
