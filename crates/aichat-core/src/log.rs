//! Append-only chat transcript log (`log.md`)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};

use crate::error::{ChatError, ChatResult};
use crate::state::Message;

const SEPARATOR_WIDTH: usize = 40;

/// Render one exchange block exactly as it is written to the log.
pub fn format_exchange<Tz: TimeZone>(messages: &[Message], when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut block = format!(
        "\n\n=== Chat on {} {} ===\n\n",
        when.format("%a %d %b %Y"),
        when.format("%H:%M")
    );

    for msg in messages {
        block.push_str(&format!(
            "{}:\n{}\n\n",
            msg.role.as_str().to_uppercase(),
            msg.content
        ));
    }

    block.push_str(&"=".repeat(SEPARATOR_WIDTH));
    block.push_str("\n\n");
    block
}

/// Append the conversation to the log, stamped with the local time.
pub fn append_exchange(path: &Path, messages: &[Message]) -> ChatResult<()> {
    let block = format_exchange(messages, &Local::now());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ChatError::Log(e.to_string()))?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ChatError::Log(format!("Failed to open log {:?}: {}", path, e)))?;
    file.write_all(block.as_bytes())
        .map_err(|e| ChatError::Log(format!("Failed to write log {:?}: {}", path, e)))?;

    tracing::debug!(path = %path.display(), messages = messages.len(), "appended exchange to log");
    Ok(())
}

pub fn read_log(path: &Path) -> ChatResult<String> {
    fs::read_to_string(path)
        .map_err(|e| ChatError::Log(format!("Failed to read log {:?}: {}", path, e)))
}
