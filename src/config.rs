use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

pub const CLASSIFIER_MODEL_ID: &str = "hshkoukani/bolt";
pub const GENERATION_MODEL: &str = "gemini-2.0-flash";
pub const SYSTEM_PROMPT: &str = "You are replying to emails that I receive.\n\
You will be provided with the subject, body, and label of an incoming email.\n\
\n\
Instructions:\n\
- You are the **recipient** of the original email. Write a reply accordingly.\n\
- If sender and recipient names are provided, **flip their roles** in your reply.\n\
- If either name is missing, **do not invent or use a placeholder like [Sender Name]**. Just leave the greeting out unless necessary.\n\
- Strictly output only the body of the response. Do not include the subject, sender, recipient, greeting, or signature unless it's contextually appropriate within the reply body.\n\
- Match your tone to the given label (e.g., Complaint, Request, etc.).\n";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_TIMEOUT_SECS: u64 = 60;
const MODEL_CACHE_DIR: &str = "/tmp/transformers_cache";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Largest `/analyze-label` body accepted. The classifier only reads the first 512 tokens anyway.
pub const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime settings read from the environment (and `.env`, see `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub gemini_timeout: Duration,
    pub model_id: String,
    pub model_cache_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match var("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue { name: "GEMINI_TIMEOUT_SECS", value: raw })?,
            None => GEMINI_TIMEOUT_SECS,
        };

        // hf-hub keeps its downloads under `$HF_HOME/hub`.
        let model_cache_dir = var("BOLT_MODEL_CACHE")
            .map(PathBuf::from)
            .or_else(|| var("HF_HOME").map(|home| PathBuf::from(home).join("hub")))
            .unwrap_or_else(|| PathBuf::from(MODEL_CACHE_DIR));

        Ok(AppConfig {
            gemini_key: var("GEMINI_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| GENERATION_MODEL.to_string()),
            gemini_api_base: var("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            gemini_timeout: Duration::from_secs(timeout_secs),
            model_id: var("BOLT_MODEL_ID").unwrap_or_else(|| CLASSIFIER_MODEL_ID.to_string()),
            model_cache_dir,
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }
}

/// Keeps the tokenizer from spinning up its own thread pool unless the operator asked for one.
pub fn apply_memory_tuning() {
    if env::var_os("TOKENIZERS_PARALLELISM").is_none() {
        env::set_var("TOKENIZERS_PARALLELISM", "false");
    }
}
