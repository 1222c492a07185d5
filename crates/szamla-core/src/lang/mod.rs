//! Language-specific text processing: detection, normalization, stemming,
//! and locale-aware amount/date parsing.

pub mod amount;
pub mod date;
pub mod normalize;
pub mod stemmer;

pub use amount::clean_amount;
pub use date::parse_date;
pub use normalize::normalize_text;
pub use stemmer::{StemDictionary, stem_pattern};

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Supported extraction languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Hungarian (primary stress case: heavy morphology, locale formats).
    #[serde(rename = "hu")]
    Hungarian,
    /// English.
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hungarian => "hu",
            Language::English => "en",
        }
    }

    /// Parse a language code.
    pub fn from_code(code: &str) -> Result<Self, PatternError> {
        match code.trim().to_lowercase().as_str() {
            "hu" | "hun" => Ok(Language::Hungarian),
            "en" | "eng" => Ok(Language::English),
            other => Err(PatternError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Hungarian stopwords and billing vocabulary unlikely in English text.
const HUNGARIAN_INDICATORS: &[&str] = &[
    " a ", " az ", " és ", " egy ", " nem ", " hogy ", " is ", " meg ",
    // Billing Hungarian
    "számla", "szamla", "fizetendő", "fizetesi", "fizetési", "összeg",
    "határidő", "hataridő", "szolgáltató", "díj", "esedékes", "sorszám",
    "ügyfél", "befizet", " ft", "forint",
];

/// English indicators (common words rarely found in Hungarian text).
const ENGLISH_INDICATORS: &[&str] = &[
    "the ", " and ", " your ", " for ", " this ", " with ", " from ",
    " you ", " has ", " been ", " will ",
    // Billing English
    "invoice", "amount", "due date", "payment", "total", "bill",
    "account number", "balance", "vendor", "statement",
];

/// Detect the primary language of a document's text.
///
/// Uses keyword frequency plus Hungarian-specific diacritics. Hungarian wins
/// ties since it is the primary document base; very short inputs default to
/// Hungarian for the same reason.
pub fn detect_language(text: &str) -> Language {
    if text.trim().len() < 20 {
        return Language::Hungarian;
    }

    let lower = text.to_lowercase();

    let hungarian_score = count_indicators(&lower, HUNGARIAN_INDICATORS);
    let english_score = count_indicators(&lower, ENGLISH_INDICATORS);

    let diacritic_bonus = count_hungarian_diacritics(&lower);
    let total_hungarian = hungarian_score + diacritic_bonus;

    if total_hungarian >= english_score {
        Language::Hungarian
    } else {
        Language::English
    }
}

fn count_indicators(lower_text: &str, indicators: &[&str]) -> u32 {
    let mut score = 0u32;
    for &indicator in indicators {
        score += lower_text.matches(indicator).count() as u32;
    }
    score
}

/// Count Hungarian diacritical characters as a language signal. The long
/// double-acute vowels ő and ű exist in no other supported language and are
/// weighted double.
fn count_hungarian_diacritics(lower_text: &str) -> u32 {
    let mut count = 0u32;
    for ch in lower_text.chars() {
        match ch {
            'ő' | 'ű' => count += 2,
            'á' | 'é' | 'í' | 'ó' | 'ö' | 'ú' | 'ü' => count += 1,
            _ => {}
        }
    }
    count / 2
}

/// Per-language text processor bundling normalization, stemming, and
/// locale-aware value parsing.
pub struct LanguageProcessor {
    language: Language,
    stems: StemDictionary,
}

impl LanguageProcessor {
    /// Create a processor for the given language.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            stems: StemDictionary::for_language(language),
        }
    }

    /// The language this processor handles.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Normalize raw document text for matching.
    pub fn normalize(&self, text: &str) -> String {
        normalize_text(text, self.language)
    }

    /// Parse a captured amount string into a decimal value.
    pub fn clean_amount(&self, raw: &str) -> rust_decimal::Decimal {
        clean_amount(raw)
    }

    /// Parse a captured date string; `None` when no supported form matches.
    pub fn parse_date(&self, raw: &str) -> Option<chrono::NaiveDate> {
        parse_date(raw, self.language)
    }

    /// The stem dictionary for keyword detection.
    pub fn stems(&self) -> &StemDictionary {
        &self.stems
    }

    /// Fraction of the given target stems found in the text, in [0, 1].
    pub fn detect_keywords_by_stems(&self, text: &str, stems: &[&str]) -> f32 {
        self.stems.detect_ratio(text, stems)
    }
}
