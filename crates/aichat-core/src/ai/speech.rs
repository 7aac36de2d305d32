use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

use super::openai::{resolve_api_key, status_error, DEFAULT_BASE_URL};
use crate::error::{ChatError, ChatResult};

pub const TTS_MODEL: &str = "gpt-4o-mini-tts";
pub const TTS_FORMAT: &str = "mp3";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Text-to-speech via the OpenAI audio endpoint, played with a local player.
#[derive(Clone)]
pub struct SpeechClient {
    client: Client,
    base_url: String,
    api_key_env: String,
    player: Option<String>,
}

impl SpeechClient {
    pub fn new(api_key_env: &str, player: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key_env, player)
    }

    pub fn with_base_url(base_url: &str, api_key_env: &str, player: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key_env: api_key_env.to_string(),
            player,
        }
    }

    /// Synthesize `text`, write it to `output_path` and start playback.
    ///
    /// Any failure along the way comes back as [`ChatError::Playback`].
    pub async fn speak(&self, voice: &str, output_path: &Path, text: &str) -> ChatResult<()> {
        self.synthesize(voice, output_path, text)
            .await
            .map_err(|e| ChatError::Playback(e.to_string()))?;
        // Dropping the handle leaves the player running; it is still reaped
        let _reaper = play_detached(self.player.as_deref(), output_path)
            .map_err(|e| ChatError::Playback(format!("Could not start audio player: {}", e)))?;
        Ok(())
    }

    /// Stream the synthesized audio into `output_path`.
    pub async fn synthesize(&self, voice: &str, output_path: &Path, text: &str) -> ChatResult<()> {
        let api_key = resolve_api_key(&self.api_key_env)?;
        let request = SpeechRequest {
            model: TTS_MODEL,
            voice,
            input: text,
            response_format: TTS_FORMAT,
        };

        tracing::info!(voice, chars = text.chars().count(), "requesting speech");

        let response = self.client
            .post(format!("{}/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let mut file = tokio::fs::File::create(output_path)
            .await
            .map_err(|e| ChatError::Playback(format!("Failed to create {:?}: {}", output_path, e)))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ChatError::Transport(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ChatError::Playback(format!("Failed to write {:?}: {}", output_path, e)))?;
        }
        file.flush()
            .await
            .map_err(|e| ChatError::Playback(e.to_string()))?;

        Ok(())
    }
}

/// Build the player invocation for this platform (or the configured override).
pub fn player_command(player: Option<&str>, path: &Path) -> Command {
    if let Some(custom) = player.filter(|p| !p.trim().is_empty()) {
        let mut parts = custom.split_whitespace();
        // filter above guarantees at least one part
        let program = parts.next().unwrap_or(custom);
        let mut cmd = Command::new(program);
        cmd.args(parts).arg(path);
        return cmd;
    }

    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("afplay");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("mpv");
        cmd.arg(path);
        cmd
    }
}

/// Start the player without waiting for it.
///
/// The child is reaped on a blocking task; callers may drop the handle.
pub fn play_detached(
    player: Option<&str>,
    path: &Path,
) -> std::io::Result<JoinHandle<std::io::Result<ExitStatus>>> {
    let mut child = player_command(player, path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    tracing::debug!(pid = child.id(), path = %path.display(), "audio player started");

    Ok(tokio::task::spawn_blocking(move || {
        let status = child.wait();
        if let Ok(status) = &status {
            tracing::debug!(%status, "audio player exited");
        }
        status
    }))
}
