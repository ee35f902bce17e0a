use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::core::error::StoryError;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default = "default_request_file")]
    pub request_file: String,

    #[serde(default)]
    pub unattended: bool,

    pub llm: LlmConfig,

    #[serde(default)]
    pub story: StoryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gemini,
    Groq,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: Backend,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    pub gemini: Option<GeminiConfig>,
    pub groq: Option<GroqConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_fallbacks")]
    pub fallback_models: Vec<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            fallback_models: default_gemini_fallbacks(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroqConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    pub model: String,
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_groq_model(),
            base_url: default_groq_base_url(),
        }
    }
}

/// Knobs of the generation loop and the post-processor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryConfig {
    #[serde(default = "default_words_per_page")]
    pub words_per_page: usize,
    #[serde(default = "default_opening_word_cap")]
    pub opening_word_cap: usize,
    #[serde(default = "default_sentences_per_paragraph")]
    pub sentences_per_paragraph: usize,
    #[serde(default = "default_max_continuations")]
    pub max_continuations: usize,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            words_per_page: default_words_per_page(),
            opening_word_cap: default_opening_word_cap(),
            sentences_per_paragraph: default_sentences_per_paragraph(),
            max_continuations: default_max_continuations(),
        }
    }
}

fn default_output() -> String {
    "output".to_string()
}
fn default_request_file() -> String {
    "story.yml".to_string()
}
fn default_timeout() -> u64 {
    600
}
fn default_retry_delay() -> u64 {
    15
}
fn default_gemini_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}
fn default_gemini_fallbacks() -> Vec<String> {
    vec![
        "gemini-2.5-flash-lite".to_string(),
        "gemini-2.5-flash".to_string(),
    ]
}
fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_words_per_page() -> usize {
    300
}
fn default_opening_word_cap() -> usize {
    2000
}
fn default_sentences_per_paragraph() -> usize {
    3
}
fn default_max_continuations() -> usize {
    20
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}

impl GeminiConfig {
    pub fn resolve_api_key(&self) -> Result<String, StoryError> {
        resolve_key(self.api_key.as_deref(), "GEMINI_API_KEY")
    }
}

impl GroqConfig {
    pub fn resolve_api_key(&self) -> Result<String, StoryError> {
        resolve_key(self.api_key.as_deref(), "GROQ_API_KEY")
    }
}

/// Config value first, then the environment. Blank values count as missing.
fn resolve_key(configured: Option<&str>, var: &'static str) -> Result<String, StoryError> {
    if let Some(key) = configured.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    match env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(StoryError::MissingCredential(var)),
    }
}
