use parla_core::config::{AppConfig, RetrySettings};
use parla_core::session::HistoryCaps;

pub fn default_app_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:8787".into(),
        gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        chat_model: "gemini-2.0-flash".into(),
        tts_model: "gemini-2.5-flash-preview-tts".into(),
        synthesis_timeout_s: 15,
        retry: RetrySettings {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_factor: 2,
        },
        history: HistoryCaps {
            hard_limit: 500,
            soft_limit: Some(50),
        },
        privileged_history: false,
        api_key_present: false,
    }
}
