use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Topic tag selecting the opening context of a session.
///
/// Serialized with the SCREAMING_CASE tags the client sends on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    Intro,
    Cafe,
    Travel,
    Shopping,
    Restaurant,
    Directions,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::Intro,
        Scenario::Cafe,
        Scenario::Travel,
        Scenario::Shopping,
        Scenario::Restaurant,
        Scenario::Directions,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Scenario::Intro => "INTRO",
            Scenario::Cafe => "CAFE",
            Scenario::Travel => "TRAVEL",
            Scenario::Shopping => "SHOPPING",
            Scenario::Restaurant => "RESTAURANT",
            Scenario::Directions => "DIRECTIONS",
        }
    }

    /// Short setting description used when asking the tutor to open the topic.
    pub fn setting(self) -> &'static str {
        match self {
            Scenario::Intro => "getting to know each other",
            Scenario::Cafe => "ordering drinks at a café",
            Scenario::Travel => "planning a trip and getting around",
            Scenario::Shopping => "shopping for clothes and haggling politely",
            Scenario::Restaurant => "ordering a meal at a restaurant",
            Scenario::Directions => "asking for and giving directions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario: {0}")]
pub struct UnknownScenario(pub String);

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.tag().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownScenario(s.to_string()))
    }
}
