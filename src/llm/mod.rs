pub mod client;
pub mod edit;
pub mod response;
pub mod suggestion;

pub use client::{build_client, default_client, healthcheck_client};
pub use edit::{build_edit_prompt, edit_chat_request, get_edit, get_edit_with, request_edit};
pub use response::{ChatBackend, ChatRequest};
pub use suggestion::EditSuggestion;
