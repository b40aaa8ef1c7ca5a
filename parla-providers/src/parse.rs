use anyhow::{Context, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

/// Extracts the first candidate's concatenated text parts.
pub fn parse_generate_content(body: &[u8]) -> anyhow::Result<String> {
    let resp: GenerateContentResponse =
        serde_json::from_slice(body).context("decode generateContent JSON")?;

    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(anyhow!("no text in generateContent response"));
    }
    Ok(text)
}

/// Extracts the first candidate's inline audio as (mime type, raw bytes).
pub fn parse_speech_audio(body: &[u8]) -> anyhow::Result<(String, Vec<u8>)> {
    let resp: GenerateContentResponse =
        serde_json::from_slice(body).context("decode speech JSON")?;

    let inline = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.inline_data))
        .ok_or_else(|| anyhow!("no audio in speech response"))?;

    let bytes = BASE64
        .decode(inline.data.as_bytes())
        .context("decode audio payload base64")?;
    Ok((inline.mime_type, bytes))
}
