//! HTTP 请求处理器

pub mod chat;
pub mod health;

pub use chat::handle_chat;
pub use health::{handle_health, handle_root};
