use crate::turn::StructuredTurn;
use serde::{Deserialize, Serialize};

/// Client ⇄ backend chat exchange request. Audio rides as base64 next to its
/// mime type; `sessionId` is an opaque untrusted key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_mime_type: Option<String>,
    pub session_id: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

/// A successful chat exchange returns the structured tutor turn directly.
pub type ChatResponse = StructuredTurn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub text: String,
    pub voice_name: String,
}

/// Payload encodings the synthesis side can return. The tag is authoritative:
/// `pcm` means raw s16le samples at the fixed synthesis rate regardless of
/// what the bytes look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechFormat {
    Mp3,
    Pcm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    pub audio_data: String,
    pub format: SpeechFormat,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
