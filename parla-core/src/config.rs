use crate::session::HistoryCaps;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub gemini_base_url: String,
    pub chat_model: String,
    pub tts_model: String,
    pub synthesis_timeout_s: u64,
    pub retry: RetrySettings,
    pub history: HistoryCaps,
    pub privileged_history: bool,

    // The API key itself is stored outside this struct at rest.
    #[serde(default)]
    pub api_key_present: bool,
}
