use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

/// Settings read once at start (and again after the user edits them).
///
/// Passed by reference to whatever needs it; never mutated in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    /// System prompt that opens every session
    pub role: String,
    /// Append each exchange to the transcript log
    pub logging: bool,
    pub editor: String,
    pub voice: String,
    /// Audio player command; platform default when unset
    pub player: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            role: "You are a helpful assistant.".to_string(),
            logging: false,
            editor: default_editor(),
            voice: "nova".to_string(),
            player: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Write the defaults out so the editor has something to open.
    pub fn ensure_exists() -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        if !path.exists() {
            Self::new().save_to(&path)?;
        }
        Ok(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("AICHAT_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("aichat").join("config.json"))
    }
}

/// Where the transcript log, synthesized audio and exports are written.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub dir: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn locate() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        let paths = Self::new(data_dir.join("aichat"));
        fs::create_dir_all(&paths.dir)
            .with_context(|| format!("Failed to create {:?}", paths.dir))?;
        Ok(paths)
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join("log.md")
    }

    pub fn speech_file(&self) -> PathBuf {
        self.dir.join("speech.mp3")
    }

    pub fn export_file(&self) -> PathBuf {
        self.dir.join("exported.html")
    }

    pub fn trace_file(&self) -> PathBuf {
        self.dir.join("aichat.log")
    }
}

fn default_editor() -> String {
    std::env::var("EDITOR").unwrap_or_else(|_| {
        if cfg!(windows) { "notepad" } else { "vi" }.to_string()
    })
}
