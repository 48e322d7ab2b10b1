use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::error::PersonaError;

pub const DEFAULT_USER_AGENT: &str = "RedditPersonaGenerator/2.0 (by /u/PersonaBot)";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_POST_LIMIT: u32 = 100;

const SCRAPED_DATA_DIR: &str = "scraped_data";
const PERSONA_OUTPUT_DIR: &str = "persona_output";
const LOG_DIR: &str = "logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    Ollama,
    OpenAi,
}

impl std::str::FromStr for ModelProvider {
    type Err = PersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ModelProvider::Ollama),
            "openai" => Ok(ModelProvider::OpenAi),
            other => Err(PersonaError::Config(format!(
                "MODEL_PROVIDER must be 'ollama' or 'openai', got '{other}'"
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Reddit
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    pub post_limit: u32,

    // Generative model
    pub model_provider: ModelProvider,
    pub model_name: String,
    pub ollama_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model_timeout: Option<Duration>,

    // Output
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("reddit_client_id", &redact(&self.reddit_client_id))
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("post_limit", &self.post_limit)
            .field("model_provider", &self.model_provider)
            .field("model_name", &self.model_name)
            .field("ollama_base_url", &self.ollama_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("model_timeout", &self.model_timeout)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, PersonaError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PersonaError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_provider = match get("MODEL_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => ModelProvider::Ollama,
        };

        let post_limit = match get("POST_LIMIT") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| PersonaError::Config(format!("POST_LIMIT must be a positive number, got '{raw}'")))?,
            None => DEFAULT_POST_LIMIT,
        };

        let model_timeout = match get("MODEL_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                    PersonaError::Config(format!(
                        "MODEL_TIMEOUT_SECS must be a positive number, got '{raw}'"
                    ))
                })?,
            )),
            None => None,
        };

        Ok(Self {
            reddit_client_id: get("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            reddit_user_agent: get("REDDIT_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            post_limit,
            model_provider,
            model_name: get("PERSONA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            model_timeout,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
        })
    }

    /// The OpenAI key is only needed when building an OpenAI-backed model.
    pub fn require_openai_key(&self) -> Result<&str, PersonaError> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            PersonaError::Config("OPENAI_API_KEY is required when MODEL_PROVIDER=openai".to_string())
        })
    }

    /// Reddit credentials are only needed when fetching live data.
    pub fn require_reddit_credentials(&self) -> Result<(), PersonaError> {
        let mut missing = Vec::new();
        if self.reddit_client_id.is_empty() {
            missing.push("REDDIT_CLIENT_ID");
        }
        if self.reddit_client_secret.is_empty() {
            missing.push("REDDIT_CLIENT_SECRET");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PersonaError::Config(format!(
                "{} environment variable(s) required to fetch from Reddit",
                missing.join(", ")
            )))
        }
    }

    /// Log the effective configuration without secrets.
    pub fn log_redacted(&self) {
        info!(
            reddit_client_id = %redact(&self.reddit_client_id),
            post_limit = self.post_limit,
            provider = ?self.model_provider,
            model = %self.model_name,
            ollama_base_url = %self.ollama_base_url,
            openai_key_set = self.openai_api_key.is_some(),
            model_timeout_secs = ?self.model_timeout.map(|t| t.as_secs()),
            data_dir = %self.data_dir.display(),
            "Configuration loaded"
        );
    }

    // --- Output layout ---

    pub fn scraped_data_dir(&self) -> PathBuf {
        self.data_dir.join(SCRAPED_DATA_DIR)
    }

    pub fn persona_output_dir(&self) -> PathBuf {
        self.data_dir.join(PERSONA_OUTPUT_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR)
    }

    pub fn snapshot_path(&self, username: &str) -> PathBuf {
        self.scraped_data_dir().join(format!("{username}_scraped_data.json"))
    }

    pub fn persona_path(&self, username: &str) -> PathBuf {
        self.persona_output_dir().join(format!("{username}_persona.txt"))
    }

    pub fn execution_log_path(&self) -> PathBuf {
        self.logs_dir().join("execution_log.json")
    }

    pub fn app_log_path(&self) -> PathBuf {
        self.logs_dir().join("app.log")
    }

    /// Create the output directories if they don't exist.
    pub fn ensure_dirs(&self) -> Result<(), PersonaError> {
        for dir in [self.scraped_data_dir(), self.persona_output_dir(), self.logs_dir()] {
            std::fs::create_dir_all(&dir)?;
            info!(dir = %dir.display(), "Directory ready");
        }
        Ok(())
    }

    /// Point all output at `dir`. Used by tests and the `--data-dir` flag.
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        "<unset>".to_string()
    } else {
        let prefix: String = value.chars().take(4).collect();
        format!("{prefix}…")
    }
}
