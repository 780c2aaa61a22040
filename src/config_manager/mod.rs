pub mod stateless_llm;
pub mod tts;
pub mod utils;

pub use stateless_llm::LlmConfig;
pub use tts::TTSConfig;
