use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "gemini", "openai", or "ollama".
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Fast model used for curriculum JSON extraction.
    pub fast_model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Minimum extracted-content length worth synthesizing, in chars.
    pub min_input_chars: usize,
    /// Deadline applied to each pipeline stage's capability call.
    pub stage_timeout_secs: u64,
    /// How long a finished job's log channel stays subscribable.
    pub log_grace_secs: u64,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("LERNWERK_HOST", "0.0.0.0"),
                port: env_u16("LERNWERK_PORT", 8000),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(env_or("LERNWERK_DATA_DIR", "./data")),
            },
            llm: LlmConfig {
                provider: env_or("LERNWERK_LLM_PROVIDER", "gemini").to_lowercase(),
                api_key: env_opt("GENAI_API_KEY")
                    .or_else(|| env_opt("OPENAI_API_KEY")),
                model: env_or("LERNWERK_LLM_MODEL", "gemini-2.5-pro"),
                fast_model: env_or("LERNWERK_LLM_FAST_MODEL", "gemini-1.5-flash"),
                base_url: env_or("LERNWERK_LLM_BASE_URL", ""),
                temperature: env_f32("LERNWERK_LLM_TEMPERATURE", 0.4),
                max_tokens: env_u32("LERNWERK_LLM_MAX_TOKENS", 8192),
            },
            limits: LimitsConfig {
                max_upload_bytes: env_usize("LERNWERK_MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
                min_input_chars: env_usize("LERNWERK_MIN_INPUT_CHARS", 200),
                stage_timeout_secs: env_u64("LERNWERK_STAGE_TIMEOUT_SECS", 300),
                log_grace_secs: env_u64("LERNWERK_LOG_GRACE_SECS", 30),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
