//! Turns the vision model's free-text answer into a [`TranslationResult`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::dto::TranslateResponse;
use crate::language::Language;

const NOT_APPLICABLE: &str = "not applicable";

/// What the user sees and hears for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub language: Language,
    pub translated_word: String,
    pub romanization: Option<String>,
    pub english_gloss: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Translated,
    Romanization,
    English,
}

impl Field {
    fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.starts_with("translated") {
            Field::Translated
        } else if label.starts_with("romanization") {
            Field::Romanization
        } else {
            Field::English
        }
    }
}

/// Known labels with optional list markers and markdown emphasis around them.
fn label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(
            r"(?i)(?:(?:[-•]|\d+[.)])[ \t]*)?(?:\*\*)?\b(translated\s+word|romanization|in\s+english)\b(?:\*\*)?(?:[ \t]*\([^)\n]*\))?[ \t]*:(?:\*\*)?",
        )
        .expect("label pattern is valid")
    })
}

fn trim_value(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|' | '*'))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = trim_value(text);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn is_not_applicable(value: &str) -> bool {
    let cleaned = value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim_end_matches('.')
        .trim();
    cleaned.eq_ignore_ascii_case(NOT_APPLICABLE)
}

/// Strip every known label prefix from a single field value.
pub fn clean_text(text: &str) -> String {
    trim_value(&label_regex().replace_all(text, "")).to_string()
}

/// A raw answer cut at its labels
struct Segments {
    /// Non-empty lines before the first label, or of the whole answer when
    /// no label occurs.
    preamble: Vec<String>,
    /// Each label with every line up to the next label, joined by spaces.
    labeled: Vec<(Field, String)>,
}

fn segments(raw: &str) -> Segments {
    fn join_lines(text: &str) -> Option<String> {
        let lines: Vec<String> = text.lines().filter_map(non_empty).collect();
        (!lines.is_empty()).then(|| lines.join(" "))
    }

    let mut preamble = Vec::new();
    let mut labeled = Vec::new();
    let mut cursor = 0;
    let mut pending: Option<Field> = None;
    for caps in label_regex().captures_iter(raw) {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let text = &raw[cursor..whole.start()];
        match pending {
            Some(field) => labeled.extend(join_lines(text).map(|value| (field, value))),
            None => preamble.extend(text.lines().filter_map(non_empty)),
        }
        pending = Some(Field::from_label(label.as_str()));
        cursor = whole.end();
    }
    let rest = &raw[cursor..];
    match pending {
        Some(field) => labeled.extend(join_lines(rest).map(|value| (field, value))),
        None => preamble.extend(rest.lines().filter_map(non_empty)),
    }

    Segments { preamble, labeled }
}

/// Parse a free-text model answer.
///
/// Labels are matched case-insensitively in any order and own all text up
/// to the next label. Without any label, lines fill translated word,
/// romanization, English gloss in that order and extra lines extend the
/// gloss. Text before the first label only stands in for a missing
/// translated word.
pub fn normalize(raw: &str, language: Language) -> TranslationResult {
    let Segments { preamble, labeled } = segments(raw);
    let mut translated: Option<String> = None;
    let mut romanization: Option<String> = None;
    let mut english: Option<String> = None;

    if labeled.is_empty() {
        for value in preamble {
            if translated.is_none() {
                translated = Some(value);
            } else if romanization.is_none() && !language.suppresses_romanization() {
                romanization = Some(value);
            } else {
                append(&mut english, value);
            }
        }
        return finish(language, translated, romanization, english);
    }

    for (field, value) in labeled {
        let slot = match field {
            Field::Translated => &mut translated,
            Field::Romanization => &mut romanization,
            Field::English => &mut english,
        };
        append(slot, value);
    }
    if translated.is_none() && !preamble.is_empty() {
        translated = Some(preamble.join(" "));
    }

    finish(language, translated, romanization, english)
}

fn append(slot: &mut Option<String>, value: String) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(&value);
        }
        None => *slot = Some(value),
    }
}

/// Interpret a relay response of either shape: structured fields, or only
/// `translation` carrying the raw model answer.
pub fn from_response(response: &TranslateResponse, language: Language) -> TranslationResult {
    if response.romanization.is_none() && response.english.is_none() {
        return normalize(&response.translation, language);
    }

    let clean = |value: &Option<String>| value.as_deref().map(clean_text);
    finish(
        language,
        Some(clean_text(&response.translation)),
        clean(&response.romanization),
        clean(&response.english),
    )
}

fn finish(
    language: Language,
    translated: Option<String>,
    romanization: Option<String>,
    english: Option<String>,
) -> TranslationResult {
    let romanization = romanization
        .filter(|_| !language.suppresses_romanization())
        .filter(|value| !is_not_applicable(value))
        .and_then(|value| non_empty(&value));

    TranslationResult {
        language,
        translated_word: translated.and_then(|v| non_empty(&v)).unwrap_or_default(),
        romanization,
        english_gloss: english.and_then(|v| non_empty(&v)),
    }
}

impl TranslationResult {
    /// Text handed to speech synthesis. English targets skip the gloss so
    /// the same word is not spoken twice.
    pub fn speech_text(&self) -> String {
        let gloss = if self.language.is_english() {
            ""
        } else {
            self.english_gloss.as_deref().unwrap_or("")
        };
        format!("{} {}", self.translated_word, gloss).trim().to_string()
    }

    /// Romanization worth showing: present and not a repeat of the word.
    pub fn visible_romanization(&self) -> Option<&str> {
        self.romanization
            .as_deref()
            .filter(|r| *r != self.translated_word)
    }

    pub fn visible_english(&self) -> Option<&str> {
        self.english_gloss
            .as_deref()
            .filter(|e| *e != self.translated_word)
    }

    pub fn is_empty(&self) -> bool {
        self.translated_word.is_empty()
    }
}
