pub mod assistant_llm;
pub mod local_store;

pub use assistant_llm::{OpenAiAssistantAdapter, UnconfiguredAssistant};
pub use local_store::LocalStore;
