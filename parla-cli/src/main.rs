use std::sync::Arc;

use parla_runtime::config_store::ConfigStore;
use parla_runtime::defaults::default_app_config;
use parla_runtime::engine::build_engine_from_config;
use parla_server::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Config comes from PARLA_CONFIG when set, otherwise defaults. The API
    // key is resolved separately (GEMINI_API_KEY or the OS keyring).
    let cfg = match std::env::var("PARLA_CONFIG") {
        Ok(path) if !path.trim().is_empty() => ConfigStore::at_path(path).load()?,
        _ => default_app_config(),
    };

    let bind_addr = std::env::var("PARLA_BIND").unwrap_or_else(|_| cfg.bind_addr.clone());

    let engine = build_engine_from_config(&cfg)?;
    let router = create_router(AppState {
        engine: Arc::new(engine),
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("parla backend listening on {bind_addr}");
    axum::serve(listener, router).await?;

    Ok(())
}
