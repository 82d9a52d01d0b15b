use std::future::Future;

use anyhow::{Context, Result};
use tracing::debug;

use super::client::{build_client, default_client};
use super::response::{ChatBackend, ChatRequest};
use crate::config::EndpointConfig;

pub const EDIT_MODEL: &str = "local-model";

pub const EDIT_TEMPERATURE: f32 = 0.1;

pub const EDIT_SYSTEM_PROMPT: &str =
    "You are an AI language model trained to make minor edits to text based on provided examples.";

/// Fills the edit template. Inputs are inserted as-is; braces or template-like
/// text inside them are never expanded.
pub fn build_edit_prompt(before: &str, after: &str, text: &str) -> String {
    format!(
        r#"
You are an AI language model trained to make minor edits to text based on provided examples. Your task is to analyze the given example edit and apply similar changes to a new text sample if possible.

Here is the example edit:
Old: {before}
New: {after}

Here is the new text sample to edit, it may have nothing to do with the example:
{text}

If you make any changes, please enclose the modified parts within ** to make them bold. Focus on finding similar words or patterns to what appeared in the 'old' sample and how they were changed in the 'new' sample.

Provide your response in the following JSON format:
{{
  "reason": "Your reasoning for making the edit or deciding not to edit",
  "edit": "The edited text with changes enclosed in *"
}}
BE CONCISE
Do not focus on the meaning of words, simply look for patterns.
Adhere strictly to the example.
Take a deep breath, you've got this, don't over think it because it's quite simple.
"#
    )
}

pub fn edit_chat_request(before: &str, after: &str, text: &str) -> ChatRequest {
    ChatRequest {
        model: EDIT_MODEL.to_string(),
        system_prompt: EDIT_SYSTEM_PROMPT.to_string(),
        user_prompt: build_edit_prompt(before, after, text),
        temperature: EDIT_TEMPERATURE,
    }
}

/// Asks the model to apply the `before` -> `after` edit to `text`.
///
/// The returned string is the model's reply exactly as received. It is
/// usually a JSON object with `reason` and `edit` keys, but nothing here
/// checks that; see [`super::suggestion::EditSuggestion`] for an opt-in reader.
pub async fn request_edit<B>(backend: &B, before: &str, after: &str, text: &str) -> Result<String>
where
    B: ChatBackend + ?Sized,
{
    let request = edit_chat_request(before, after, text);
    debug!(
        before_len = before.len(),
        after_len = after.len(),
        text_len = text.len(),
        "requesting analogous edit"
    );
    backend.complete(request).await
}

/// Blocking form of [`request_edit`] against the default local endpoint.
///
/// Must not be called from inside a tokio runtime; async callers should use
/// [`request_edit`] with [`super::default_client`] instead.
pub fn get_edit(before: &str, after: &str, text: &str) -> Result<String> {
    block_on(request_edit(default_client(), before, after, text))?
}

/// Blocking form of [`request_edit`] against an explicit endpoint.
pub fn get_edit_with(
    config: &EndpointConfig,
    before: &str,
    after: &str,
    text: &str,
) -> Result<String> {
    let client = build_client(config);
    block_on(request_edit(&client, before, after, text))?
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime for edit request")?;
    Ok(runtime.block_on(future))
}
