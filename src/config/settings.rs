//! Configuration settings for Delve.

use crate::error::{DelveError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub wikipedia: WikipediaSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no `-v` flag or `RUST_LOG` is given.
    pub log_level: String,
    /// File the save tool appends research output to.
    pub output_file: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            output_file: "research_output.txt".to_string(),
        }
    }
}

impl GeneralSettings {
    /// Log level for a `-v` count, falling back to the configured level.
    pub fn log_level_for(&self, verbose: u8) -> &str {
        match verbose {
            0 => &self.log_level,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// How the agent's final text is turned into a research result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CoercionStrategy {
    /// Parse the text directly; fall back to the raw text on failure.
    #[default]
    Parse,
    /// Ask the model to restructure its answer; no fallback.
    Restructure,
}

/// Hosted language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model name sent with every chat completion request.
    pub model: String,
    /// Base URL of an OpenAI-compatible chat completions API.
    pub api_base: String,
    /// API key. Takes precedence over `api_key_env` and the dotenv file.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Dotenv file consulted when the environment variable is unset.
    pub dotenv_path: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum model calls per research run.
    pub max_iterations: usize,
    /// Sampling temperature. Provider default when unset.
    pub temperature: Option<f32>,
    /// Output coercion strategy.
    pub coercion: CoercionStrategy,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            dotenv_path: ".env".to_string(),
            timeout_secs: 300,
            max_iterations: 15,
            temperature: None,
            coercion: CoercionStrategy::Parse,
        }
    }
}

impl LlmSettings {
    /// Resolve the API key: explicit setting, then environment, then dotenv file.
    ///
    /// The process environment is only read, never modified.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }

        if let Ok(key) = std::env::var(&self.api_key_env) {
            if !key.is_empty() {
                return Ok(key);
            }
        }

        if let Some(key) = read_dotenv_key(&Settings::expand_path(&self.dotenv_path), &self.api_key_env)? {
            return Ok(key);
        }

        Err(DelveError::Config(format!(
            "{} not set. Set it with: export {}='...' or add it to {}",
            self.api_key_env, self.api_key_env, self.dotenv_path
        )))
    }
}

/// Look up a single key in a dotenv file without loading it into the environment.
fn read_dotenv_key(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let entries = dotenvy::from_path_iter(path)
        .map_err(|e| DelveError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    for entry in entries {
        let (name, value) =
            entry.map_err(|e| DelveError::Config(format!("Invalid line in {}: {}", path.display(), e)))?;
        if name == key && !value.is_empty() {
            return Ok(Some(value));
        }
    }

    Ok(None)
}

/// Wikipedia lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaSettings {
    /// Language edition (en, de, fr, ...).
    pub language: String,
    /// Override for the MediaWiki `api.php` endpoint.
    pub api_url: Option<String>,
    /// Number of pages to include in a lookup.
    pub top_k_results: usize,
    /// Character budget for the combined lookup text.
    pub doc_content_chars_max: usize,
    /// Queries are cut to this many characters before searching.
    pub max_query_length: usize,
    /// User-Agent header sent to Wikipedia.
    pub user_agent: String,
}

impl Default for WikipediaSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            api_url: None,
            top_k_results: 1,
            doc_content_chars_max: 100,
            max_query_length: 300,
            user_agent: format!("delve/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WikipediaSettings {
    /// The MediaWiki API endpoint to query.
    pub fn endpoint(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.wikipedia.org/w/api.php", self.language))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| DelveError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("delve")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output file path.
    pub fn output_file(&self) -> PathBuf {
        Self::expand_path(&self.general.output_file)
    }
}
