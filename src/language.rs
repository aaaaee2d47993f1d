use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target languages offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Ko,
    Zh,
    Hi,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language code: {0}")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Es,
        Language::Ko,
        Language::Zh,
        Language::Hi,
    ];

    /// Wire code used by the upload form and the speech request
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Ko => "ko",
            Language::Zh => "zh",
            Language::Hi => "hi",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Ko => "Korean",
            Language::Zh => "Chinese",
            Language::Hi => "Hindi",
        }
    }

    /// Locale handed to speech synthesizers
    pub fn tts_locale(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Es => "es-ES",
            Language::Ko => "ko-KR",
            Language::Zh => "cmn-CN",
            Language::Hi => "hi-IN",
        }
    }

    /// Latin-script languages never carry a romanization line.
    pub fn suppresses_romanization(self) -> bool {
        matches!(self, Language::En | Language::Es)
    }

    pub fn is_english(self) -> bool {
        self == Language::En
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "ko" => Ok(Language::Ko),
            "zh" => Ok(Language::Zh),
            "hi" => Ok(Language::Hi),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolve a speech language code to a provider locale.
///
/// Known codes map through [`Language::tts_locale`]; anything already
/// shaped like a locale (`pt-BR`) is passed through untouched.
pub fn resolve_tts_locale(code: &str) -> Result<String, UnknownLanguage> {
    if let Ok(language) = code.parse::<Language>() {
        return Ok(language.tts_locale().to_string());
    }

    let trimmed = code.trim();
    let looks_like_locale = trimmed.contains('-')
        && trimmed
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));

    if looks_like_locale {
        Ok(trimmed.to_string())
    } else {
        Err(UnknownLanguage(code.to_string()))
    }
}
