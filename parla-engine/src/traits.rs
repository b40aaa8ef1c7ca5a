use async_trait::async_trait;
use parla_core::turn::Role;
use parla_core::wire::SpeechFormat;

/// One piece of new-turn content handed to the generator.
#[derive(Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineAudio { mime_type: String, data: Vec<u8> },
}

impl std::fmt::Debug for ContentPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentPart::Text(t) => f.debug_tuple("Text").field(t).finish(),
            ContentPart::InlineAudio { mime_type, data } => f
                .debug_struct("InlineAudio")
                .field("mime_type", mime_type)
                .field("data", &format!("{} bytes", data.len()))
                .finish(),
        }
    }
}

/// A prior turn as replayed to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub format: SpeechFormat,
    pub data: Vec<u8>,
}

/// Vendor failures, split by whether a retry can plausibly help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Transient(String),
    #[error("{0}")]
    Fatal(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    /// Rate limits, request timeouts, and server-side failures are worth
    /// retrying; everything else is not.
    pub fn from_status(status: u16, summary: impl Into<String>) -> Self {
        if status == 408 || status == 429 || status >= 500 {
            ProviderError::Transient(summary.into())
        } else {
            ProviderError::Fatal(summary.into())
        }
    }
}

/// The "generate one conversational turn" capability. A pure function of
/// (instruction, history, new turn): no hidden vendor-side chat handle, which
/// keeps retries and session replacement tractable.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[HistoryMessage],
        parts: &[ContentPart],
    ) -> Result<String, ProviderError>;
}

/// The "synthesize speech" capability.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SpeechAudio, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_marks_retryable_failures() {
        assert!(ProviderError::from_status(429, "rate limited").is_transient());
        assert!(ProviderError::from_status(503, "overloaded").is_transient());
        assert!(ProviderError::from_status(408, "slow").is_transient());
        assert!(!ProviderError::from_status(400, "bad request").is_transient());
        assert!(!ProviderError::from_status(401, "bad key").is_transient());
    }

    #[test]
    fn inline_audio_debug_summarizes_payload() {
        let part = ContentPart::InlineAudio {
            mime_type: "audio/pcm;rate=16000".into(),
            data: vec![0; 32_000],
        };
        let s = format!("{part:?}");
        assert!(s.contains("32000 bytes"));
    }
}
