use async_trait::async_trait;
use std::time::Duration;

use parla_core::wire::SpeechFormat;
use parla_engine::traits::{
    ContentPart, GenerationProvider, HistoryMessage, ProviderError, SpeechAudio, SpeechProvider,
};
use parla_providers::gemini::{ChatTurn, GeminiConfig, RequestPart};
use parla_providers::{gemini, parse, runtime};

/// Chat generation backed by the Gemini generateContent endpoint.
#[derive(Debug, Clone)]
pub struct GeminiGenerationProvider {
    cfg: GeminiConfig,
}

impl GeminiGenerationProvider {
    pub fn new(cfg: GeminiConfig) -> Self {
        Self { cfg }
    }
}

fn classify_status(status: u16, body: &[u8]) -> ProviderError {
    // Raw vendor bodies go to the log only; the error carries a safe summary.
    log::warn!(
        "vendor call failed: status={} body={}",
        status,
        String::from_utf8_lossy(body)
    );
    ProviderError::from_status(status, format!("language service returned status {status}"))
}

#[async_trait]
impl GenerationProvider for GeminiGenerationProvider {
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[HistoryMessage],
        parts: &[ContentPart],
    ) -> Result<String, ProviderError> {
        let chat: Vec<ChatTurn> = history
            .iter()
            .map(|m| ChatTurn {
                role: m.role,
                text: m.text.clone(),
            })
            .collect();
        let req_parts: Vec<RequestPart> = parts
            .iter()
            .map(|p| match p {
                ContentPart::Text(t) => RequestPart::Text(t.clone()),
                ContentPart::InlineAudio { mime_type, data } => RequestPart::InlineAudio {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            })
            .collect();

        let req =
            gemini::build_generate_content_request(&self.cfg, system_instruction, &chat, &req_parts);
        let resp = runtime::execute(&req)
            .await
            .map_err(|e| ProviderError::Transient(format!("request failed: {e}")))?;

        if !(200..=299).contains(&resp.status) {
            return Err(classify_status(resp.status, &resp.body));
        }

        parse::parse_generate_content(&resp.body)
            .map_err(|e| ProviderError::Fatal(e.to_string()))
    }
}

/// Speech synthesis backed by the Gemini TTS model, with a hard per-call
/// timeout: a hung synthesis call must not stall playback indefinitely.
#[derive(Debug, Clone)]
pub struct GeminiSpeechProvider {
    cfg: GeminiConfig,
    timeout: Duration,
}

impl GeminiSpeechProvider {
    pub fn new(cfg: GeminiConfig, timeout: Duration) -> Self {
        Self { cfg, timeout }
    }
}

/// The response format tag is derived from the vendor mime type and is
/// authoritative for the playback side.
pub fn format_from_mime(mime: &str) -> SpeechFormat {
    let mime = mime.to_ascii_lowercase();
    if mime.contains("mp3") || mime.contains("mpeg") {
        SpeechFormat::Mp3
    } else {
        SpeechFormat::Pcm
    }
}

#[async_trait]
impl SpeechProvider for GeminiSpeechProvider {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SpeechAudio, ProviderError> {
        let req = gemini::build_speech_request(&self.cfg, text, voice);
        let resp = runtime::execute_with_timeout(&req, self.timeout)
            .await
            .map_err(|e| ProviderError::Transient(format!("request failed: {e}")))?;

        if !(200..=299).contains(&resp.status) {
            return Err(classify_status(resp.status, &resp.body));
        }

        let (mime, data) =
            parse::parse_speech_audio(&resp.body).map_err(|e| ProviderError::Fatal(e.to_string()))?;
        if data.is_empty() {
            return Err(ProviderError::Fatal("empty audio payload".into()));
        }

        Ok(SpeechAudio {
            format: format_from_mime(&mime),
            data,
        })
    }
}
