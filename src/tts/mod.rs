pub mod factory;
pub mod google_tts;
pub mod interface;

pub use factory::TTSFactory;
pub use google_tts::GoogleTTS;
pub use interface::{save_and_read_back, TTSInterface, TtsError};
