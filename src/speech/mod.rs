pub mod stt;
pub mod tts;

pub use stt::SttClient;
pub use tts::TtsClient;
