pub mod ai;
pub mod config;
pub mod error;
pub mod export;
pub mod log;
pub mod playback;
pub mod search;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{OpenAIClient, SpeechClient};
pub use config::{Config, DataPaths};
pub use error::{ChatError, ChatResult};
pub use playback::Playback;
pub use search::{SearchOutcome, SearchState};
pub use session::Session;
pub use state::{Message, Role};
