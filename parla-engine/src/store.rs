use async_trait::async_trait;
use parla_core::language::Language;
use parla_core::scenario::Scenario;
use parla_core::session::{HistoryCaps, Session};
use parla_core::turn::Turn;
use parla_core::types::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Injected session-store capability.
///
/// `get_or_create` hands out the session behind an owned per-session mutex
/// guard: the caller holds the session exclusively for the duration of one
/// exchange, and a second request for the same id queues behind it. Unrelated
/// sessions never contend with each other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves the session for `id`, creating it on a lookup miss. Passing a
    /// scenario (or a different language) on an existing session replaces its
    /// history wholesale, which is the topic-switch semantics.
    async fn get_or_create(
        &self,
        id: &SessionId,
        language: Language,
        scenario: Option<Scenario>,
    ) -> OwnedMutexGuard<Session>;

    /// Removes the mapping entirely; the next `get_or_create` starts clean.
    async fn invalidate(&self, id: &SessionId);

    /// Ordered turn snapshot, empty if the session does not exist.
    async fn history_for(&self, id: &SessionId) -> Vec<Turn>;
}

/// Single-process, non-durable store: sessions live in memory and are lost on
/// restart.
pub struct InMemorySessionStore {
    caps: HistoryCaps,
    privileged: bool,
    sessions: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new(caps: HistoryCaps, privileged: bool) -> Self {
        Self {
            caps,
            privileged,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn slot(
        &self,
        id: &SessionId,
        language: Language,
        scenario: Option<Scenario>,
    ) -> Arc<tokio::sync::Mutex<Session>> {
        let mut map = self.sessions.lock().unwrap();
        map.entry(id.clone())
            .or_insert_with(|| {
                Arc::new(tokio::sync::Mutex::new(Session::new(
                    id.clone(),
                    language,
                    scenario,
                    self.caps,
                    self.privileged,
                )))
            })
            .clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(
        &self,
        id: &SessionId,
        language: Language,
        scenario: Option<Scenario>,
    ) -> OwnedMutexGuard<Session> {
        let slot = self.slot(id, language, scenario);
        let mut session = slot.lock_owned().await;

        // The reset happens under the session lock so an in-flight exchange
        // for the same id finishes against the old history first.
        if scenario.is_some() || session.language != language {
            session.reset(language, scenario);
        }

        session
    }

    async fn invalidate(&self, id: &SessionId) {
        self.sessions.lock().unwrap().remove(id);
    }

    async fn history_for(&self, id: &SessionId) -> Vec<Turn> {
        let slot = { self.sessions.lock().unwrap().get(id).cloned() };
        match slot {
            Some(slot) => slot.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }
}
