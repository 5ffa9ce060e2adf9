pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod prompts;

pub use dispatcher::{DeliveryDispatcher, DEFAULT_PACING};
pub use engine::ConversationEngine;
pub use error::EngineError;
