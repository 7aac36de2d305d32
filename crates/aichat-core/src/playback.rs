use std::future::Future;

use crate::error::ChatResult;

pub const ANNOUNCE_ON: &str = "Voice playback is now on.";
pub const ANNOUNCE_OFF: &str = "Voice playback is now off.";

/// Whether replies are spoken aloud after they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Playback {
    #[default]
    Off,
    On,
}

impl Playback {
    pub fn is_on(&self) -> bool {
        *self == Playback::On
    }

    pub fn flipped(&self) -> Self {
        match self {
            Playback::Off => Playback::On,
            Playback::On => Playback::Off,
        }
    }

    pub fn announcement(&self) -> &'static str {
        match self {
            Playback::On => ANNOUNCE_ON,
            Playback::Off => ANNOUNCE_OFF,
        }
    }

    /// Flip the state and announce it with one `speak` call.
    ///
    /// The new state sticks even if the announcement fails; the failure is
    /// returned so it can be shown.
    pub async fn toggle<F, Fut>(&mut self, voice: &str, speak: F) -> ChatResult<Playback>
    where
        F: FnOnce(String, String) -> Fut,
        Fut: Future<Output = ChatResult<()>>,
    {
        *self = self.flipped();
        tracing::info!(playback = ?self, "voice playback toggled");
        speak(voice.to_string(), self.announcement().to_string()).await?;
        Ok(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;

    #[tokio::test]
    async fn test_toggle_twice_announces_each_state() {
        let mut playback = Playback::default();
        let mut calls: Vec<(String, String)> = Vec::new();

        let state = playback
            .toggle("nova", |voice, text| {
                calls.push((voice, text));
                async { Ok(()) }
            })
            .await
            .unwrap();
        assert_eq!(state, Playback::On);

        let state = playback
            .toggle("nova", |voice, text| {
                calls.push((voice, text));
                async { Ok(()) }
            })
            .await
            .unwrap();
        assert_eq!(state, Playback::Off);
        assert_eq!(playback, Playback::Off);

        assert_eq!(
            calls,
            vec![
                ("nova".to_string(), "Voice playback is now on.".to_string()),
                ("nova".to_string(), "Voice playback is now off.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_announcement_still_toggles() {
        let mut playback = Playback::Off;
        let err = playback
            .toggle("echo", |_, _| async {
                Err(ChatError::Playback("no audio".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(err, ChatError::Playback("no audio".to_string()));
        assert!(playback.is_on());
    }
}
