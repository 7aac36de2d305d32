pub mod openai;
pub mod speech;

pub use openai::OpenAIClient;
pub use speech::SpeechClient;
