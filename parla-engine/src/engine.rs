use crate::retry::{RetryPolicy, with_retry};
use crate::store::SessionStore;
use crate::traits::{
    ContentPart, GenerationProvider, HistoryMessage, ProviderError, SpeechAudio, SpeechProvider,
};
use parla_core::codec::{self, DecodeError};
use parla_core::language::Language;
use parla_core::persona;
use parla_core::scenario::Scenario;
use parla_core::turn::{Role, StructuredTurn, TurnInput};
use parla_core::types::SessionId;
use std::sync::Arc;
use thiserror::Error;

/// Request-level failures, normalized at the orchestrator boundary. Raw
/// vendor messages are logged by the providers; only these safe summaries
/// cross the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("unsupported language: {0}")]
    InvalidLanguage(String),
    #[error("unknown scenario: {0}")]
    InvalidScenario(String),
    #[error("message must contain text or audio")]
    EmptyInput,
    #[error("the tutor had trouble responding, please try again")]
    Decode(#[from] DecodeError),
    #[error("could not reach the language service: {0}")]
    Vendor(String),
}

/// One chat exchange as received from the wire, still string-typed where the
/// client is untrusted.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub session_id: SessionId,
    pub language: String,
    pub scenario: Option<String>,
    pub input: TurnInput,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
}

/// The turn orchestrator: resolves the session, builds the outbound prompt,
/// calls the generation capability under retry, decodes the reply, and
/// commits both turns to history.
pub struct TutorEngine {
    cfg: EngineConfig,
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn GenerationProvider>,
    speech: Arc<dyn SpeechProvider>,
}

impl TutorEngine {
    pub fn new(
        cfg: EngineConfig,
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn GenerationProvider>,
        speech: Arc<dyn SpeechProvider>,
    ) -> Self {
        Self {
            cfg,
            store,
            generator,
            speech,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn run_turn(&self, req: TurnRequest) -> Result<StructuredTurn, TurnError> {
        let language: Language = req
            .language
            .parse()
            .map_err(|_| TurnError::InvalidLanguage(req.language.clone()))?;
        let scenario: Option<Scenario> = match req.scenario.as_deref() {
            Some(tag) => Some(
                tag.parse()
                    .map_err(|_| TurnError::InvalidScenario(tag.to_string()))?,
            ),
            None => None,
        };

        // A scenario request carries no user content by design; everything
        // else must bring text and/or audio.
        if scenario.is_none() && req.input.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        let mut session = self
            .store
            .get_or_create(&req.session_id, language, scenario)
            .await;

        let system = persona::system_instruction(language);
        let history: Vec<HistoryMessage> = session
            .turns()
            .iter()
            .map(|t| HistoryMessage {
                role: t.role,
                text: t.text.clone(),
            })
            .collect();

        let parts = match scenario {
            Some(sc) => vec![ContentPart::Text(persona::scenario_opening_prompt(
                language, sc,
            ))],
            None => {
                let mut parts = Vec::new();
                if let Some(text) = req.input.text.as_deref().filter(|t| !t.trim().is_empty()) {
                    parts.push(ContentPart::Text(text.to_string()));
                }
                if let Some(audio) = &req.input.audio {
                    parts.push(ContentPart::InlineAudio {
                        mime_type: audio.mime_type.clone(),
                        data: audio.data.clone(),
                    });
                }
                parts
            }
        };

        let generator = &self.generator;
        let raw = match with_retry(self.cfg.retry, ProviderError::is_transient, || {
            generator.generate(&system, &history, &parts)
        })
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                // A failed call leaves "was context consumed" ambiguous, so
                // the session is discarded and the next request starts fresh.
                drop(session);
                self.store.invalidate(&req.session_id).await;
                return Err(TurnError::Vendor(e.to_string()));
            }
        };

        // Shape problems are not transient; they are never retried.
        let reply = match codec::decode(&raw) {
            Ok(reply) => reply,
            Err(e) => {
                drop(session);
                self.store.invalidate(&req.session_id).await;
                return Err(TurnError::Decode(e));
            }
        };

        // Commit only after the whole exchange succeeded. The synthetic
        // scenario opener is not persisted; the tutor's opening turn is.
        if scenario.is_none() {
            session.push(Role::User, req.input.history_text(), None);
        }
        session.push(Role::Tutor, codec::encode(&reply), Some(reply.clone()));

        Ok(reply)
    }

    /// Synthesizes speech for a rendered tutor reply, under the same retry
    /// policy as generation.
    pub async fn speak(&self, text: &str, voice: &str) -> Result<SpeechAudio, TurnError> {
        let speech = &self.speech;
        with_retry(self.cfg.retry, ProviderError::is_transient, || {
            speech.synthesize(text, voice)
        })
        .await
        .map_err(|e| TurnError::Vendor(e.to_string()))
    }
}
