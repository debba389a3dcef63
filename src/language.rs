//! Language codes understood by the Kokoro pipeline and voice-based detection.

use crate::error::{TtsError, TtsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LanguageCode {
    AmericanEnglish,
    BritishEnglish,
    Japanese,
    MandarinChinese,
    Spanish,
    French,
    Hindi,
    Italian,
    BrazilianPortuguese,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 9] = [
        LanguageCode::AmericanEnglish,
        LanguageCode::BritishEnglish,
        LanguageCode::Japanese,
        LanguageCode::MandarinChinese,
        LanguageCode::Spanish,
        LanguageCode::French,
        LanguageCode::Hindi,
        LanguageCode::Italian,
        LanguageCode::BrazilianPortuguese,
    ];

    /// Single-letter code passed to the engine as `lang_code`.
    pub fn code(self) -> char {
        match self {
            LanguageCode::AmericanEnglish => 'a',
            LanguageCode::BritishEnglish => 'b',
            LanguageCode::Japanese => 'j',
            LanguageCode::MandarinChinese => 'z',
            LanguageCode::Spanish => 'e',
            LanguageCode::French => 'f',
            LanguageCode::Hindi => 'h',
            LanguageCode::Italian => 'i',
            LanguageCode::BrazilianPortuguese => 'p',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LanguageCode::AmericanEnglish => "American English",
            LanguageCode::BritishEnglish => "British English",
            LanguageCode::Japanese => "Japanese",
            LanguageCode::MandarinChinese => "Mandarin Chinese",
            LanguageCode::Spanish => "Spanish",
            LanguageCode::French => "French",
            LanguageCode::Hindi => "Hindi",
            LanguageCode::Italian => "Italian",
            LanguageCode::BrazilianPortuguese => "Brazilian Portuguese",
        }
    }

    fn from_char(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == ch)
    }

    /// Parse a single-letter language code.
    pub fn from_code(code: &str) -> TtsResult<Self> {
        let normalized = code.trim().to_ascii_lowercase();
        let mut chars = normalized.chars();
        let parsed = match (chars.next(), chars.next()) {
            (Some(ch), None) => Self::from_char(ch),
            _ => None,
        };
        parsed.ok_or_else(|| TtsError::invalid_input(format!("Unsupported language code: {}", code)))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = TtsError;

    fn try_from(value: String) -> TtsResult<Self> {
        Self::from_code(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(lang: LanguageCode) -> Self {
        lang.code().to_string()
    }
}

/// Pick the pipeline language from a voice name such as `jf_alpha`.
///
/// Only the first letter of the prefix before `_` matters; unknown prefixes
/// fall back to American English.
pub fn detect_language(voice: &str) -> LanguageCode {
    let prefix = voice.split('_').next().unwrap_or_default();
    match prefix.chars().next() {
        Some('j') => LanguageCode::Japanese,
        Some('z') => LanguageCode::MandarinChinese,
        Some('b') => LanguageCode::BritishEnglish,
        Some('e') => LanguageCode::Spanish,
        Some('f') => LanguageCode::French,
        Some('h') => LanguageCode::Hindi,
        Some('i') => LanguageCode::Italian,
        Some('p') => LanguageCode::BrazilianPortuguese,
        _ => LanguageCode::AmericanEnglish,
    }
}
