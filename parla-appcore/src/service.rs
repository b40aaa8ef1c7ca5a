use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use parla_audio::ClipCache;
use parla_audio::encode::{EncodeError, MIN_UTTERANCE_MS, check_min_utterance, encode_for_upload};
use parla_audio::playback::{AudioClip, PlaybackError, decode_for_playback};
use parla_audio::player::Player;
use parla_audio::recorder::{AudioCaptureError, AudioRecorder};
use parla_core::language::Language;
use parla_core::scenario::Scenario;
use parla_core::turn::StructuredTurn;
use parla_core::types::{MessageId, SessionId};
use parla_core::wire::{ChatRequest, SpeechRequest};

use crate::client::{BackendClient, ClientError};
use crate::exchange::{ChatMessageView, Exchange, SendError, run_exchange};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeakError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid audio payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Failures of the stop-and-send voice path. Local capture problems stay
/// distinguishable from network failures so the UI can word them differently.
#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error(transparent)]
    Capture(#[from] AudioCaptureError),
    #[error(transparent)]
    TooShort(#[from] EncodeError),
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Drives one conversation: the exchange lifecycle, microphone capture with
/// the minimum-utterance gate, and cached speech replay.
pub struct ChatService {
    client: Arc<dyn BackendClient>,
    session_id: SessionId,
    language: Language,
    exchange: tokio::sync::Mutex<Exchange>,
    recorder: tokio::sync::Mutex<Option<AudioRecorder>>,
    cache: Mutex<ClipCache>,
    player: Mutex<Player>,
}

impl ChatService {
    pub fn new(client: Arc<dyn BackendClient>, language: Language) -> Self {
        Self {
            client,
            session_id: SessionId::random(),
            language,
            exchange: tokio::sync::Mutex::new(Exchange::new()),
            recorder: tokio::sync::Mutex::new(None),
            cache: Mutex::new(ClipCache::new()),
            player: Mutex::new(Player::new()),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn base_request(&self) -> ChatRequest {
        ChatRequest {
            session_id: self.session_id.as_str().to_string(),
            language: self.language.to_string(),
            ..Default::default()
        }
    }

    /// Starts (or restarts) the conversation on a scenario. The backend
    /// replaces any existing history for this session id.
    pub async fn start_scenario(&self, scenario: Scenario) -> Result<StructuredTurn, SendError> {
        let mut req = self.base_request();
        req.scenario = Some(scenario.tag().to_string());

        let mut exchange = self.exchange.lock().await;
        let (_, reply) = run_exchange(self.client.as_ref(), &mut exchange, &req).await?;
        Ok(reply)
    }

    pub async fn send_text(&self, text: &str) -> Result<StructuredTurn, SendError> {
        let mut req = self.base_request();
        req.message = Some(text.to_string());

        let mut exchange = self.exchange.lock().await;
        let (_, reply) = run_exchange(self.client.as_ref(), &mut exchange, &req).await?;
        Ok(reply)
    }

    pub async fn start_recording(&self) -> Result<(), AudioCaptureError> {
        let mut recorder = self.recorder.lock().await;
        if recorder.is_none() {
            *recorder = Some(AudioRecorder::open_default()?);
        }
        recorder
            .as_ref()
            .ok_or(AudioCaptureError::NoInputDevice)?
            .start()
    }

    pub async fn cancel_recording(&self) -> Result<(), AudioCaptureError> {
        let mut recorder = self.recorder.lock().await;
        let Some(r) = recorder.as_mut() else {
            return Ok(());
        };
        r.cancel()
    }

    /// Stops recording and sends the clip as a voice message. Clips under the
    /// minimum utterance length are discarded client-side and never reach the
    /// backend.
    pub async fn send_recording(&self) -> Result<StructuredTurn, RecordingError> {
        let upload = {
            let mut recorder = self.recorder.lock().await;
            let r = recorder.as_mut().ok_or(AudioCaptureError::NoInputDevice)?;

            let captured = r.stop_captured()?;

            // Too-short clips are discarded here and never encoded or sent.
            if let Err(e) = check_min_utterance(
                &captured.samples,
                captured.sample_rate_hz,
                MIN_UTTERANCE_MS,
            ) {
                log::info!("discarding short recording: {e}");
                return Err(e.into());
            }

            let samples = AudioRecorder::resample_for_upload(&captured)?;
            encode_for_upload(&samples)
        };

        let mut req = self.base_request();
        req.audio_data = Some(BASE64.encode(&upload.bytes));
        req.audio_mime_type = Some(upload.mime_type);

        let mut exchange = self.exchange.lock().await;
        let (_, reply) = run_exchange(self.client.as_ref(), &mut exchange, &req)
            .await
            .map_err(RecordingError::Send)?;
        Ok(reply)
    }

    /// Plays the spoken form of a rendered tutor message. The first synthesis
    /// per message is cached; replaying hits the cache, and playing a
    /// different message stops the current clip and supersedes it.
    pub async fn speak(&self, message: MessageId, text: &str) -> Result<(), SpeakError> {
        let cached = self.cache.lock().unwrap().get(&message).cloned();

        let clip = match cached {
            Some(clip) => clip,
            None => {
                let resp = self
                    .client
                    .speech(&SpeechRequest {
                        text: text.to_string(),
                        voice_name: self.language.voice_name().to_string(),
                    })
                    .await?;

                let payload = BASE64
                    .decode(resp.audio_data.as_bytes())
                    .map_err(|e| SpeakError::Payload(e.to_string()))?;
                let clip = AudioClip {
                    format: resp.format,
                    payload,
                };
                self.cache.lock().unwrap().put(message, clip.clone());
                clip
            }
        };

        let buffer = decode_for_playback(&clip)?;
        self.player.lock().unwrap().play(buffer)?;
        Ok(())
    }

    pub async fn transcript(&self) -> Vec<ChatMessageView> {
        self.exchange.lock().await.messages().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parla_core::turn::{Reply, Role};
    use parla_core::wire::{SpeechFormat, SpeechResponse};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeBackend {
        speech_calls: AtomicU32,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                speech_calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl BackendClient for FakeBackend {
        async fn chat(&self, req: &ChatRequest) -> Result<StructuredTurn, ClientError> {
            Ok(StructuredTurn {
                response: Reply {
                    target_text: format!("echo: {}", req.message.clone().unwrap_or_default()),
                    english: "echo".into(),
                    chinese: "回声".into(),
                },
                ..Default::default()
            })
        }

        async fn speech(&self, _req: &SpeechRequest) -> Result<SpeechResponse, ClientError> {
            self.speech_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SpeechResponse {
                audio_data: BASE64.encode(vec![0u8; 2_000]),
                format: SpeechFormat::Pcm,
            })
        }
    }

    #[tokio::test]
    async fn send_text_appends_user_and_tutor_to_the_transcript() {
        let service = ChatService::new(FakeBackend::new(), Language::French);

        let reply = service.send_text("Bonjour").await.unwrap();
        assert_eq!(reply.response.target_text, "echo: Bonjour");

        let transcript = service.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Tutor);
    }

    #[tokio::test]
    async fn replaying_one_message_synthesizes_only_once() {
        let backend = FakeBackend::new();
        let service = ChatService::new(backend.clone(), Language::French);
        let message = MessageId::new();

        service.speak(message, "Salut !").await.unwrap();
        service.speak(message, "Salut !").await.unwrap();
        assert_eq!(backend.speech_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_different_message_supersedes_the_cached_clip() {
        let backend = FakeBackend::new();
        let service = ChatService::new(backend.clone(), Language::French);
        let first = MessageId::new();
        let second = MessageId::new();

        service.speak(first, "Un").await.unwrap();
        service.speak(second, "Deux").await.unwrap();
        service.speak(first, "Un").await.unwrap();
        assert_eq!(backend.speech_calls.load(Ordering::SeqCst), 3);
    }
}
