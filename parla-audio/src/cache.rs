use crate::playback::AudioClip;
use parla_core::types::MessageId;

/// Single-slot synthesis cache: the clip for the most recently spoken tutor
/// message. Replaying the same message reuses the clip; speaking a different
/// message supersedes it and the old clip is discarded, not retained.
#[derive(Debug, Default)]
pub struct ClipCache {
    slot: Option<(MessageId, AudioClip)>,
}

impl ClipCache {
    pub fn new() -> Self {
        Self { slot: None }
    }

    pub fn get(&self, id: &MessageId) -> Option<&AudioClip> {
        match &self.slot {
            Some((cached_id, clip)) if cached_id == id => Some(clip),
            _ => None,
        }
    }

    pub fn put(&mut self, id: MessageId, clip: AudioClip) {
        self.slot = Some((id, clip));
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
