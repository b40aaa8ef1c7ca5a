pub mod client;
pub mod exchange;
pub mod service;

pub use client::{BackendClient, ClientError, HttpBackendClient};
pub use exchange::{ChatMessageView, Exchange, ExchangePhase, SendError, run_exchange};
pub use service::{ChatService, RecordingError, SpeakError};
