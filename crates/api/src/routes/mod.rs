pub mod admin;
pub mod assistant;
pub mod common;
pub mod completions;

pub use admin::{ai_service_health, gateway_health, list_ai_providers};
pub use assistant::assistant_chat;
pub use completions::chat_completions;
