pub mod config;
pub mod llm;
pub mod logging;
pub mod palette;
pub mod utils;

pub use config::EndpointConfig;
pub use llm::{get_edit, get_edit_with, request_edit};
