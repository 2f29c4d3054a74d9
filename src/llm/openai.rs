//! OpenAI-compatible chat completions.

use super::{ChatMessage, LanguageModel, Role};
use crate::config::LlmSettings;
use crate::error::{AssistError, Result};
use crate::openai::OpenAIClient;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Language model backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIChatModel {
    client: OpenAIClient,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(client: OpenAIClient, settings: &LlmSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    fn build_messages(
        system: Option<&str>,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);

        if let Some(system) = system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.to_string())
                    .build()
                    .map_err(|e| AssistError::Llm(e.to_string()))?
                    .into(),
            );
        }

        for message in history {
            let built: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| AssistError::Llm(e.to_string()))?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| AssistError::Llm(e.to_string()))?
                    .into(),
            };
            messages.push(built);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| AssistError::Llm(e.to_string()))?
                .into(),
        );

        Ok(messages)
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, system, history, prompt), fields(model = %self.model, history = history.len()))]
    async fn complete(
        &self,
        system: Option<&str>,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<String> {
        let messages = Self::build_messages(system, history, prompt)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| AssistError::Llm(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            AssistError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(AssistError::Llm("Empty response from LLM".to_string()));
        }

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_orders_system_history_prompt() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let messages = OpenAIChatModel::build_messages(Some("be brief"), &history, "why?").unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_build_messages_without_system() {
        let messages = OpenAIChatModel::build_messages(None, &[], "summarize").unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_model_name_from_settings() {
        let settings = LlmSettings::default();
        let client = crate::openai::create_client(&settings).unwrap();
        let model = OpenAIChatModel::new(client, &settings);
        assert_eq!(model.model(), "gpt-4o-mini");
    }
}
