use thiserror::Error;

/// Failures surfaced to the user from a single chat action.
///
/// Every variant carries the display text of the underlying error so the
/// front end can show it verbatim in a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Missing or rejected API key.
    #[error("{0}")]
    Auth(String),

    /// Network or service error from a remote call.
    #[error("{0}")]
    Transport(String),

    /// Speech synthesis, audio file write, or player launch failed.
    #[error("{0}")]
    Playback(String),

    /// The transcript log could not be written or read.
    #[error("{0}")]
    Log(String),

    /// The HTML export could not be written or opened.
    #[error("{0}")]
    Export(String),
}

impl ChatError {
    /// Short title for the notice popup.
    pub fn title(&self) -> &'static str {
        match self {
            ChatError::Auth(_) => "Authentication Error",
            ChatError::Transport(_) => "Error",
            ChatError::Playback(_) => "Voice Error",
            ChatError::Log(_) => "Log Error",
            ChatError::Export(_) => "Export Error",
        }
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
