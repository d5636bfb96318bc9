//! Chat completion backends.

use crate::config::RagSettings;
use crate::error::{Result, VidqaError};
use crate::openai::{api_error, create_client};
use crate::retry::RetryPolicy;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A hosted language model that turns a prompt into text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a single-turn conversation.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// OpenAI chat completions.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAIChatModel {
    pub fn new(settings: &RagSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            retry: RetryPolicy {
                max_attempts: settings.max_retries + 1,
                ..RetryPolicy::default()
            },
        })
    }

    async fn complete_once(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| VidqaError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| VidqaError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidqaError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| api_error("Failed to generate response", e))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| VidqaError::Rag("Empty response from LLM".to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        debug!("Prompt is {} chars", system.len() + user.len());
        self.retry
            .run("Chat completion", || self.complete_once(system, user))
            .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
