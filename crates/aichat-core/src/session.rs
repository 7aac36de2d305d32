//! Conversation session
//!
//! Owns the ordered transcript that is sent to the completion service on every
//! submit. The transcript starts with exactly one system message and is only
//! ever appended to.

use std::future::Future;

use crate::error::ChatResult;
use crate::state::{Message, Role};

#[derive(Debug, Clone)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    /// Start a session with the configured role as its system message.
    pub fn initialize(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Discard the transcript and start over with a new system message.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        *self = Self::initialize(system_prompt);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the user's turn and return the full payload to send.
    ///
    /// The user message stays in the transcript whatever the outcome of the
    /// call that follows.
    pub fn begin_turn(&mut self, user_text: impl Into<String>) -> Vec<Message> {
        self.messages.push(Message::user(user_text));
        self.messages.clone()
    }

    /// Record the outcome of the call started by [`Session::begin_turn`].
    ///
    /// Only a successful reply is appended; a failure is handed back unchanged
    /// and leaves the preceding user message without an answer.
    pub fn finish_turn(&mut self, reply: ChatResult<String>) -> ChatResult<String> {
        let text = reply?;
        self.messages.push(Message::assistant(text.clone()));
        Ok(text)
    }

    /// Run one request/response exchange through `complete`.
    pub async fn submit<F, Fut>(&mut self, user_text: impl Into<String>, complete: F) -> ChatResult<String>
    where
        F: FnOnce(Vec<Message>) -> Fut,
        Fut: Future<Output = ChatResult<String>>,
    {
        let payload = self.begin_turn(user_text);
        let reply = complete(payload).await;
        self.finish_turn(reply)
    }

    /// True when the last message is a user turn that never got a reply.
    pub fn has_unanswered_turn(&self) -> bool {
        self.messages.last().map(|m| m.role == Role::User).unwrap_or(false)
    }
}
