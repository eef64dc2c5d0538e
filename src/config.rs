use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./chestnut.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Generate endpoint of the local Ollama instance.
    #[serde(default = "default_llm_url")]
    pub url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Timeout for plain prompts, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for summarization and context-bearing prompts, in seconds.
    #[serde(default = "default_context_timeout_secs")]
    pub context_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_llm_model(),
            timeout_secs: default_timeout_secs(),
            context_timeout_secs: default_context_timeout_secs(),
        }
    }
}

fn default_llm_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_llm_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_context_timeout_secs() -> u64 {
    180
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum number of notes placed into a question's context.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7707".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            import: ImportConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Load configuration from a TOML file.
///
/// A missing file is not an error: every setting has a usable default, so the
/// tool works out of the box against `./chestnut.sqlite` and a local Ollama.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.llm.timeout_secs == 0 || config.llm.context_timeout_secs == 0 {
        anyhow::bail!("llm timeouts must be > 0");
    }

    if config.llm.model.trim().is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }

    if reqwest::Url::parse(&config.llm.url).is_err() {
        anyhow::bail!("llm.url is not a valid URL: '{}'", config.llm.url);
    }

    Ok(())
}
