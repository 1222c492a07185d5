//! Surface-form stemming for morphologically rich languages.
//!
//! Hungarian declensions and suffixes produce dozens of surface forms per
//! billing keyword ("fizetendő", "fizetési", "befizetés" all mean paying).
//! Instead of algorithmic stemming, a canonical-stem -> accepted-surface-forms
//! table is inverted once into a lookup map at startup and treated as
//! immutable afterwards.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::Language;

/// Hungarian stem table: canonical stem -> accepted surface forms.
const HUNGARIAN_STEMS: &[(&str, &[&str])] = &[
    (
        "fizet",
        &[
            "fizet", "fizetendő", "fizetés", "fizetési", "fizetve", "fizessen",
            "befizetés", "befizetendő", "kifizetés", "fizetnivaló",
        ],
    ),
    (
        "összeg",
        &["összeg", "összege", "összeget", "összegről", "végösszeg", "összesen"],
    ),
    (
        "határidő",
        &["határidő", "határideje", "határidőig", "határidőre"],
    ),
    (
        "számla",
        &[
            "számla", "számlát", "számlája", "számlaszám", "számlázás",
            "részszámla", "végszámla", "díjbekérő",
        ],
    ),
    (
        "szolgáltató",
        &["szolgáltató", "szolgáltatója", "szolgáltatónál", "szolgáltatás", "szolgáltatások"],
    ),
    ("sorszám", &["sorszám", "sorszáma", "sorszámú"]),
    ("esedékes", &["esedékes", "esedékesség", "esedékessége"]),
    ("díj", &["díj", "díja", "díjak", "díjat", "részletdíj", "alapdíj"]),
    (
        "ügyfél",
        &["ügyfél", "ügyfelünk", "ügyfele", "ügyfélszám", "ügyfélazonosító"],
    ),
    ("tartozás", &["tartozás", "tartozása", "hátralék", "hátraléka"]),
];

/// English stem table. English morphology is shallow, so mostly inflections
/// plus a few synonyms folded under one stem.
const ENGLISH_STEMS: &[(&str, &[&str])] = &[
    ("invoice", &["invoice", "invoices", "invoiced", "invoicing"]),
    ("amount", &["amount", "amounts"]),
    ("due", &["due", "overdue"]),
    ("payment", &["payment", "payments", "pay", "payable", "paid"]),
    ("account", &["account", "accounts"]),
    ("total", &["total", "totals", "subtotal"]),
    ("bill", &["bill", "bills", "billing", "billed"]),
    ("vendor", &["vendor", "supplier", "provider"]),
    ("balance", &["balance", "outstanding"]),
];

lazy_static! {
    static ref HUNGARIAN_REVERSE: HashMap<String, &'static str> =
        build_reverse_map(HUNGARIAN_STEMS);
    static ref ENGLISH_REVERSE: HashMap<String, &'static str> =
        build_reverse_map(ENGLISH_STEMS);
}

fn build_reverse_map(table: &[(&'static str, &[&'static str])]) -> HashMap<String, &'static str> {
    let mut map = HashMap::new();
    for (stem, surfaces) in table {
        map.entry(stem.to_string()).or_insert(*stem);
        for surface in *surfaces {
            // First registration wins so compounds keep their primary stem.
            map.entry(surface.to_string()).or_insert(*stem);
        }
    }
    map
}

/// Immutable surface-form -> stem lookup for one language.
#[derive(Clone, Copy)]
pub struct StemDictionary {
    language: Language,
    reverse: &'static HashMap<String, &'static str>,
    table: &'static [(&'static str, &'static [&'static str])],
}

impl StemDictionary {
    /// The shared dictionary for a language.
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Hungarian => Self {
                language,
                reverse: &HUNGARIAN_REVERSE,
                table: HUNGARIAN_STEMS,
            },
            Language::English => Self {
                language,
                reverse: &ENGLISH_REVERSE,
                table: ENGLISH_STEMS,
            },
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Canonical stem for a surface token, if known.
    pub fn stem_of(&self, token: &str) -> Option<&'static str> {
        self.reverse.get(&token.to_lowercase()).copied()
    }

    /// All accepted surface forms for a stem. Unknown stems yield the stem
    /// itself so callers can mix literal keywords into stem sets.
    pub fn surfaces_of(&self, stem: &str) -> Vec<&'static str> {
        self.table
            .iter()
            .find(|(s, _)| *s == stem)
            .map(|(s, surfaces)| {
                let mut all = vec![*s];
                all.extend_from_slice(surfaces);
                all.sort_unstable();
                all.dedup();
                all
            })
            .unwrap_or_default()
    }

    /// Fraction of the target stems found in the text, in [0, 1].
    ///
    /// Tokenizes on non-alphabetic characters and maps each token through the
    /// reverse map; 0 when none of the targets appear, 1 when all do.
    pub fn detect_ratio(&self, text: &str, targets: &[&str]) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }

        let mut found = vec![false; targets.len()];
        for token in text.split(|c: char| !c.is_alphabetic()) {
            if token.is_empty() {
                continue;
            }
            let lower = token.to_lowercase();
            let stem = self.reverse.get(&lower).copied();
            for (i, target) in targets.iter().enumerate() {
                if found[i] {
                    continue;
                }
                if stem == Some(*target) || lower == target.to_lowercase() {
                    found[i] = true;
                }
            }
        }

        let hits = found.iter().filter(|f| **f).count();
        hits as f32 / targets.len() as f32
    }

    /// Compile an alternation of all known surface forms for a stem set,
    /// usable for line-level matching and positional label cues.
    pub fn stem_regex(&self, stems: &[&str]) -> Option<Regex> {
        let mut forms: Vec<String> = Vec::new();
        for stem in stems {
            let surfaces = self.surfaces_of(stem);
            if surfaces.is_empty() {
                forms.push(regex::escape(stem));
            } else {
                forms.extend(surfaces.iter().map(|s| regex::escape(s)));
            }
        }
        if forms.is_empty() {
            return None;
        }
        // Longest first so "fizetendő" wins over "fizet" inside alternation.
        forms.sort_by(|a, b| b.len().cmp(&a.len()));
        Regex::new(&format!("(?i)\\b(?:{})", forms.join("|"))).ok()
    }
}

/// Convenience wrapper: compiled stem pattern for a language.
pub fn stem_pattern(language: Language, stems: &[&str]) -> Option<Regex> {
    StemDictionary::for_language(language).stem_regex(stems)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_hungarian_surface_forms() {
        let dict = StemDictionary::for_language(Language::Hungarian);
        assert_eq!(dict.stem_of("fizetendő"), Some("fizet"));
        assert_eq!(dict.stem_of("Összege"), Some("összeg"));
        assert_eq!(dict.stem_of("határideje"), Some("határidő"));
        assert_eq!(dict.stem_of("macska"), None);
    }

    #[test]
    fn detect_ratio_counts_fraction_of_targets() {
        let dict = StemDictionary::for_language(Language::Hungarian);
        let text = "Fizetendő összeg: 6.364 Ft";

        let ratio = dict.detect_ratio(text, &["fizet", "összeg"]);
        assert!((ratio - 1.0).abs() < f32::EPSILON);

        let ratio = dict.detect_ratio(text, &["fizet", "határidő"]);
        assert!((ratio - 0.5).abs() < f32::EPSILON);

        assert_eq!(dict.detect_ratio(text, &["határidő"]), 0.0);
        assert_eq!(dict.detect_ratio(text, &[]), 0.0);
    }

    #[test]
    fn stem_regex_matches_any_surface_form() {
        let re = stem_pattern(Language::Hungarian, &["fizet"]).unwrap();
        assert!(re.is_match("Befizetés esedékes"));
        assert!(re.is_match("fizetési határidő"));
        assert!(!re.is_match("sorszám"));
    }

    #[test]
    fn unknown_stem_used_literally() {
        let re = stem_pattern(Language::English, &["mvm"]).unwrap();
        assert!(re.is_match("MVM Next"));
    }
}
