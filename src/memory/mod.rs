//! 记忆层：会话对话记录

pub mod conversation;

pub use conversation::{Message, Role, Transcript};
