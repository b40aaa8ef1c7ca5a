use crate::request::{Body, HttpRequest};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parla_core::turn::Role;
use serde_json::json;

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// A prior turn replayed into the vendor `contents` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// New-turn content: text and/or inline audio.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    InlineAudio { mime_type: String, data: Vec<u8> },
}

fn vendor_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Tutor => "model",
    }
}

pub fn build_generate_content_request(
    cfg: &GeminiConfig,
    system_instruction: &str,
    history: &[ChatTurn],
    parts: &[RequestPart],
) -> HttpRequest {
    let mut contents: Vec<serde_json::Value> = history
        .iter()
        .map(|t| {
            json!({
                "role": vendor_role(t.role),
                "parts": [{"text": t.text}],
            })
        })
        .collect();

    let new_parts: Vec<serde_json::Value> = parts
        .iter()
        .map(|p| match p {
            RequestPart::Text(t) => json!({"text": t}),
            RequestPart::InlineAudio { mime_type, data } => json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": BASE64.encode(data),
                }
            }),
        })
        .collect();
    contents.push(json!({"role": "user", "parts": new_parts}));

    let payload = json!({
        "systemInstruction": {"parts": [{"text": system_instruction}]},
        "contents": contents,
        "generationConfig": {"temperature": 0.7},
    });

    HttpRequest {
        method: "POST".into(),
        url: generate_content_url(cfg),
        headers: default_headers(cfg),
        body: Body::Json(payload.to_string()),
    }
}

pub fn build_speech_request(cfg: &GeminiConfig, text: &str, voice: &str) -> HttpRequest {
    let payload = json!({
        "contents": [{"role": "user", "parts": [{"text": text}]}],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": {"voiceName": voice}
                }
            }
        },
    });

    HttpRequest {
        method: "POST".into(),
        url: generate_content_url(cfg),
        headers: default_headers(cfg),
        body: Body::Json(payload.to_string()),
    }
}

fn generate_content_url(cfg: &GeminiConfig) -> String {
    join_url(
        &cfg.base_url,
        &format!("/models/{}:generateContent", cfg.model),
    )
}

fn default_headers(cfg: &GeminiConfig) -> Vec<(String, String)> {
    vec![
        ("Content-Type".into(), "application/json".into()),
        ("x-goog-api-key".into(), cfg.api_key.clone()),
    ]
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
