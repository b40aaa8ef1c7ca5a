use crate::language::Language;
use crate::scenario::Scenario;
use crate::turn::{Role, StructuredTurn, Turn};
use crate::types::SessionId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bounds on session history so vendor context stays finite.
///
/// When the hard limit is exceeded the oldest ~20% of turns are pruned in one
/// chunk. The soft limit is a tighter bound applied to non-privileged
/// sessions on every append. Pruning always removes complete turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryCaps {
    pub hard_limit: usize,
    pub soft_limit: Option<usize>,
}

impl Default for HistoryCaps {
    fn default() -> Self {
        Self {
            hard_limit: 500,
            soft_limit: Some(50),
        }
    }
}

pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}

/// Ordered turn history plus the language/scenario context it was built
/// under, keyed by an opaque identifier.
///
/// Owned exclusively by the session store; the orchestrator borrows one for
/// the duration of a single exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub language: Language,
    pub scenario: Option<Scenario>,
    pub privileged: bool,
    caps: HistoryCaps,
    turns: Vec<Turn>,
    last_ts_ms: i64,
}

impl Session {
    pub fn new(
        id: SessionId,
        language: Language,
        scenario: Option<Scenario>,
        caps: HistoryCaps,
        privileged: bool,
    ) -> Self {
        Self {
            id,
            language,
            scenario,
            privileged,
            caps,
            turns: Vec::new(),
            last_ts_ms: 0,
        }
    }

    /// Topic switch: rebinds the context and discards all history wholesale.
    pub fn reset(&mut self, language: Language, scenario: Option<Scenario>) {
        self.language = language;
        self.scenario = scenario;
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Appends a turn with a strictly monotonically increasing timestamp and
    /// applies the history caps.
    pub fn push(&mut self, role: Role, text: String, reply: Option<StructuredTurn>) -> &Turn {
        let ts = now_unix_ms().max(self.last_ts_ms + 1);
        self.last_ts_ms = ts;
        self.turns.push(Turn {
            role,
            text,
            reply,
            ts_unix_ms: ts,
        });
        self.prune();
        self.turns.last().expect("just pushed")
    }

    fn prune(&mut self) {
        if self.turns.len() > self.caps.hard_limit {
            let over = self.turns.len() - self.caps.hard_limit;
            let chunk = (self.caps.hard_limit / 5).max(1);
            self.turns.drain(..over + chunk);
        }

        if !self.privileged {
            if let Some(soft) = self.caps.soft_limit {
                if self.turns.len() > soft {
                    let over = self.turns.len() - soft;
                    self.turns.drain(..over);
                }
            }
        }
    }
}
