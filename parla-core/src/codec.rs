use crate::turn::StructuredTurn;
use regex::Regex;
use std::sync::OnceLock;

/// The generator is asked for a bare JSON object but is only probabilistically
/// compliant: replies arrive wrapped in markdown fences, prefixed with prose,
/// or occasionally as no JSON at all. Decoding is therefore two-tier: a direct
/// parse first, then fence stripping plus first-`{`/last-`}` extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("no tutor reply structure found in model output")]
    NoStructureFound,
}

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches the opening fence with an optional language tag and the bare
    // closing fence.
    RE.get_or_init(|| Regex::new(r"```[A-Za-z]*").expect("valid fence regex"))
}

pub fn decode(raw: &str) -> Result<StructuredTurn, DecodeError> {
    if let Ok(turn) = serde_json::from_str::<StructuredTurn>(raw.trim()) {
        return Ok(turn);
    }

    let stripped = code_fence_re().replace_all(raw, "");
    let stripped: &str = stripped.as_ref();
    let start = stripped.find('{').ok_or(DecodeError::NoStructureFound)?;
    let end = stripped.rfind('}').ok_or(DecodeError::NoStructureFound)?;
    if end < start {
        return Err(DecodeError::NoStructureFound);
    }

    serde_json::from_str::<StructuredTurn>(&stripped[start..=end])
        .map_err(|_| DecodeError::NoStructureFound)
}

/// Canonical encoding; `decode(encode(t)) == t` for any structured turn.
pub fn encode(turn: &StructuredTurn) -> String {
    serde_json::to_string(turn).expect("turn serialization")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::{Correction, Reply};

    fn sample() -> StructuredTurn {
        StructuredTurn {
            correction: Correction {
                has_mistake: true,
                corrected_text: Some("Je suis allé au magasin hier.".into()),
                explanation: Some("« allé » agrees with a masculine subject".into()),
            },
            response: Reply {
                target_text: "Qu'est-ce que tu as acheté ?".into(),
                english: "What did you buy?".into(),
                chinese: "你买了什么？".into(),
            },
        }
    }

    #[test]
    fn round_trips_plain_encoding() {
        let turn = sample();
        assert_eq!(decode(&encode(&turn)).unwrap(), turn);
    }

    #[test]
    fn round_trips_fenced_encoding() {
        let turn = sample();
        let wrapped = format!("```json\n{}\n```", encode(&turn));
        assert_eq!(decode(&wrapped).unwrap(), turn);
    }

    #[test]
    fn round_trips_prose_wrapped_encoding() {
        let turn = sample();
        let wrapped = format!("Here you go!\n{}\nHope that helps.", encode(&turn));
        assert_eq!(decode(&wrapped).unwrap(), turn);
    }

    #[test]
    fn extracts_object_from_chatty_fenced_reply() {
        let raw = "Sure! ```json\n{\"correction\":{\"hasMistake\":false},\"response\":{\"targetText\":\"Bonjour\",\"english\":\"Hello\",\"chinese\":\"你好\"}}\n```";
        let turn = decode(raw).unwrap();
        assert!(!turn.correction.has_mistake);
        assert_eq!(turn.response.target_text, "Bonjour");
        assert_eq!(turn.response.chinese, "你好");
    }

    #[test]
    fn fails_without_any_structure() {
        assert_eq!(decode("no json here"), Err(DecodeError::NoStructureFound));
    }

    #[test]
    fn fails_on_unbalanced_garbage() {
        assert_eq!(
            decode("} backwards braces {"),
            Err(DecodeError::NoStructureFound)
        );
        assert_eq!(
            decode("{\"correction\": oops"),
            Err(DecodeError::NoStructureFound)
        );
    }

    #[test]
    fn tolerates_absent_optional_fields() {
        let turn = decode("{\"correction\":{\"hasMistake\":false},\"response\":{\"targetText\":\"Hallo\"}}").unwrap();
        assert_eq!(turn.correction.corrected_text, None);
        assert_eq!(turn.response.english, "");
    }
}
