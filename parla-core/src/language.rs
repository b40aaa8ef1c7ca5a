use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target languages the tutor can teach.
///
/// Each language binds a persona name and a synthesis voice so the rest of
/// the system never hardcodes either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    French,
    Spanish,
    German,
    Italian,
    Japanese,
    Korean,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::French,
        Language::Spanish,
        Language::German,
        Language::Italian,
        Language::Japanese,
        Language::Korean,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
        }
    }

    /// Persona name the tutor introduces itself with.
    pub fn tutor_name(self) -> &'static str {
        match self {
            Language::French => "Élodie",
            Language::Spanish => "Lucía",
            Language::German => "Lena",
            Language::Italian => "Giulia",
            Language::Japanese => "Yuki",
            Language::Korean => "Jisoo",
        }
    }

    /// Prebuilt synthesis voice used for this language's tutor.
    pub fn voice_name(self) -> &'static str {
        match self {
            Language::French => "Kore",
            Language::Spanish => "Puck",
            Language::German => "Charon",
            Language::Italian => "Aoede",
            Language::Japanese => "Leda",
            Language::Korean => "Fenrir",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.display_name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("french".parse::<Language>().unwrap(), Language::French);
        assert_eq!(" Japanese ".parse::<Language>().unwrap(), Language::Japanese);
    }

    #[test]
    fn rejects_unknown_language() {
        assert!("Klingon".parse::<Language>().is_err());
    }

    #[test]
    fn every_language_has_persona_and_voice() {
        for lang in Language::ALL {
            assert!(!lang.tutor_name().is_empty());
            assert!(!lang.voice_name().is_empty());
        }
    }
}
