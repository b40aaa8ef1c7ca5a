use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parla_core::config::AppConfig;
use parla_engine::engine::{EngineConfig, TutorEngine};
use parla_engine::store::InMemorySessionStore;
use parla_providers::gemini::GeminiConfig;

use crate::providers::{GeminiGenerationProvider, GeminiSpeechProvider};
use crate::secrets::{SecretKey, get_secret};

/// Build a runnable engine from config plus the vendor API key.
///
/// The key comes from the environment when set (deployments) and the OS
/// keyring otherwise (workstations).
pub fn build_engine_from_config(cfg: &AppConfig) -> anyhow::Result<TutorEngine> {
    let api_key = resolve_api_key().context("resolve Gemini API key")?;

    let chat_cfg = GeminiConfig {
        base_url: cfg.gemini_base_url.clone(),
        api_key: api_key.clone(),
        model: cfg.chat_model.clone(),
    };
    let tts_cfg = GeminiConfig {
        base_url: cfg.gemini_base_url.clone(),
        api_key,
        model: cfg.tts_model.clone(),
    };

    let store = Arc::new(InMemorySessionStore::new(
        cfg.history,
        cfg.privileged_history,
    ));
    let generator = Arc::new(GeminiGenerationProvider::new(chat_cfg));
    let speech = Arc::new(GeminiSpeechProvider::new(
        tts_cfg,
        Duration::from_secs(cfg.synthesis_timeout_s),
    ));

    Ok(TutorEngine::new(
        EngineConfig {
            retry: cfg.retry.into(),
        },
        store,
        generator,
        speech,
    ))
}

fn resolve_api_key() -> anyhow::Result<String> {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }

    get_secret(SecretKey::GeminiApiKey)?
        .filter(|k| !k.trim().is_empty())
        .context("no API key in GEMINI_API_KEY or the OS keyring")
}
