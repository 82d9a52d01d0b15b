use anyhow::{Context, Result, bail};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::{debug, warn};

/// A single-turn chat request: one system message followed by one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

/// Anything that can turn a [`ChatRequest`] into the text of the first
/// completion choice.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

#[async_trait]
impl ChatBackend for Client<OpenAIConfig> {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        request_single_text_response(self, &request).await
    }
}

pub async fn request_single_text_response(
    client: &Client<OpenAIConfig>,
    request: &ChatRequest,
) -> Result<String> {
    let messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_prompt.as_str())
            .build()?
            .into(),
    ];

    let chat_request = CreateChatCompletionRequestArgs::default()
        .model(request.model.as_str())
        .messages(messages)
        .temperature(request.temperature)
        .build()?;

    debug!(
        model = %request.model,
        temperature = request.temperature,
        prompt_len = request.user_prompt.len(),
        "sending chat completion request"
    );

    let response = client
        .chat()
        .create(chat_request)
        .await
        .with_context(|| "Failed to get response from LLM")?;

    let Some(choice) = response.choices.into_iter().next() else {
        warn!(model = %request.model, "chat completion returned no choices");
        bail!("No choices returned from model")
    };

    // Content is passed through untouched, whitespace included.
    match choice.message.content {
        Some(content) => Ok(content),
        None => {
            warn!(model = %request.model, "first choice carried no text content");
            bail!("No text output returned from model")
        }
    }
}
