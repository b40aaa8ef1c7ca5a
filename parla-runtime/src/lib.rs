pub mod config_store;
pub mod defaults;
pub mod engine;
pub mod providers;
pub mod secrets;

pub use config_store::ConfigStore;
pub use defaults::default_app_config;
pub use engine::build_engine_from_config;
pub use providers::{GeminiGenerationProvider, GeminiSpeechProvider};
