use serde::{Deserialize, Serialize};

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Tutor,
}

/// Grammar feedback on the learner's last message.
///
/// The generator's contract is that `corrected_text`/`explanation` accompany
/// `has_mistake == true`, but the contract is tolerated rather than enforced:
/// absent fields simply decode as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    #[serde(default)]
    pub has_mistake: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// The tutor's conversational reply in the target language plus its bridge
/// translations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default)]
    pub target_text: String,
    #[serde(default)]
    pub english: String,
    #[serde(default)]
    pub chinese: String,
}

/// The decoded shape every tutor turn must conform to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredTurn {
    #[serde(default)]
    pub correction: Correction,
    #[serde(default)]
    pub response: Reply,
}

/// One message exchange unit as stored in session history.
///
/// A tutor turn's `text` is the canonical JSON encoding of `reply`, so prompt
/// replay round-trips through the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<StructuredTurn>,
    pub ts_unix_ms: i64,
}

/// History text recorded for a user turn that carried only audio. Raw audio
/// is never retained in history.
pub const VOICE_MESSAGE_PLACEHOLDER: &str = "(voice message)";

/// User-submitted audio forwarded inline to the generator.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for AudioAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioAttachment")
            .field("mime_type", &self.mime_type)
            .field("data", &format!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Raw user input for one turn. Text and audio are individually optional but
/// at least one must be present or the turn is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnInput {
    pub text: Option<String>,
    pub audio: Option<AudioAttachment>,
}

impl TurnInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            audio: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        let no_text = self.text.as_deref().is_none_or(|t| t.trim().is_empty());
        no_text && self.audio.is_none()
    }

    /// What this input looks like in session history.
    pub fn history_text(&self) -> String {
        match self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(t) => t.to_string(),
            None => VOICE_MESSAGE_PLACEHOLDER.to_string(),
        }
    }
}
