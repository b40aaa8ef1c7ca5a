use crate::client::{BackendClient, ClientError};
use parla_core::turn::{Role, StructuredTurn, VOICE_MESSAGE_PLACEHOLDER};
use parla_core::types::MessageId;
use parla_core::wire::ChatRequest;

/// UI lifecycle of a single exchange. `Rendered` and `Failed` both give way
/// to `Idle` when the next send begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangePhase {
    #[default]
    Idle,
    Sending,
    AwaitingResponse,
    Rendered,
    Failed,
}

/// One message as the UI renders it. A failed send keeps its optimistic user
/// message and attaches the error to it instead of removing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageView {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub reply: Option<StructuredTurn>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("a message is already being sent")]
    Busy,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Client-side transcript plus the exchange phase that drives it.
#[derive(Debug, Default)]
pub struct Exchange {
    phase: ExchangePhase,
    messages: Vec<ChatMessageView>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn messages(&self) -> &[ChatMessageView] {
        &self.messages
    }

    /// Moves Idle → Sending, optimistically rendering the user's message
    /// before any network round-trip. `user_text` is None for scenario
    /// openers, which carry no user message.
    fn begin(&mut self, user_text: Option<String>) -> Result<(), SendError> {
        match self.phase() {
            ExchangePhase::Sending | ExchangePhase::AwaitingResponse => return Err(SendError::Busy),
            ExchangePhase::Idle | ExchangePhase::Rendered | ExchangePhase::Failed => {}
        }

        if let Some(text) = user_text {
            self.messages.push(ChatMessageView {
                id: MessageId::new(),
                role: Role::User,
                text,
                reply: None,
                error: None,
            });
        }
        self.phase = ExchangePhase::Sending;
        Ok(())
    }

    fn awaiting(&mut self) {
        self.phase = ExchangePhase::AwaitingResponse;
    }

    fn rendered(&mut self, reply: StructuredTurn) -> MessageId {
        let id = MessageId::new();
        self.messages.push(ChatMessageView {
            id,
            role: Role::Tutor,
            text: reply.response.target_text.clone(),
            reply: Some(reply),
            error: None,
        });
        self.phase = ExchangePhase::Rendered;
        id
    }

    fn failed(&mut self, error: &ClientError) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::User && last.error.is_none() {
                last.error = Some(error.to_string());
            }
        }
        self.phase = ExchangePhase::Failed;
    }
}

/// Runs one full exchange against the backend, driving the phase machine.
/// The network call is the sole suspension point.
pub async fn run_exchange(
    client: &dyn BackendClient,
    exchange: &mut Exchange,
    req: &ChatRequest,
) -> Result<(MessageId, StructuredTurn), SendError> {
    let user_text = if req.scenario.is_some() {
        None
    } else {
        Some(
            req.message
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| VOICE_MESSAGE_PLACEHOLDER.to_string()),
        )
    };

    exchange.begin(user_text)?;
    exchange.awaiting();

    match client.chat(req).await {
        Ok(reply) => {
            let id = exchange.rendered(reply.clone());
            Ok((id, reply))
        }
        Err(e) => {
            exchange.failed(&e);
            Err(SendError::Client(e))
        }
    }
}
