//! Pattern registry: compiled bill patterns per language.

pub mod builtin;
pub mod schema;

pub use schema::{BillPatternDef, PatternFile, VendorHint};

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::error::{PatternError, Result, SzamlaError};
use crate::lang::Language;
use crate::models::BillField;

/// A compiled bill pattern.
#[derive(Debug)]
pub struct BillPattern {
    /// Pattern id, unique within its language.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Language this pattern applies to.
    pub language: Language,
    /// Optional vendor hint.
    pub vendor: Option<VendorHint>,
    /// Compiled subject rules.
    pub subject_rules: Vec<Regex>,
    /// Field -> ordered compiled capture rules.
    pub content_rules: Vec<(BillField, Vec<Regex>)>,
    /// Confirmation keyword stems. Empty means no confirmation gate.
    pub confirmation_keywords: Vec<String>,
}

impl BillPattern {
    /// Compile a declarative pattern record.
    pub fn compile(def: &BillPatternDef) -> std::result::Result<Self, PatternError> {
        let language = Language::from_code(&def.language)?;

        let amount_rules = def.content_patterns.get(&BillField::Amount);
        if amount_rules.map_or(true, |rules| rules.is_empty()) {
            return Err(PatternError::MissingAmountRule(def.id.clone()));
        }

        let compile_one = |rule: &str| -> std::result::Result<Regex, PatternError> {
            Regex::new(rule).map_err(|e| PatternError::InvalidRule {
                pattern: def.id.clone(),
                reason: e.to_string(),
            })
        };

        let mut subject_rules = Vec::with_capacity(def.subject_patterns.len());
        for rule in &def.subject_patterns {
            subject_rules.push(compile_one(rule)?);
        }

        let mut content_rules = Vec::with_capacity(def.content_patterns.len());
        for (field, rules) in &def.content_patterns {
            let mut compiled = Vec::with_capacity(rules.len());
            for rule in rules {
                compiled.push(compile_one(rule)?);
            }
            content_rules.push((field.clone(), compiled));
        }

        Ok(Self {
            id: def.id.clone(),
            name: def.name.clone(),
            language,
            vendor: def.vendor.clone(),
            subject_rules,
            content_rules,
            confirmation_keywords: def.confirmation_keywords.clone(),
        })
    }

    /// Ordered capture rules for a field, if the pattern defines any.
    pub fn rules_for(&self, field: &BillField) -> Option<&[Regex]> {
        self.content_rules
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, rules)| rules.as_slice())
    }

    /// Fields this pattern knows how to extract, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &BillField> {
        self.content_rules.iter().map(|(f, _)| f)
    }
}

/// Registry of compiled bill patterns.
///
/// Populated once at startup and read-only afterwards, so concurrent readers
/// share it behind an `Arc` without locking. Registration order is preserved
/// and breaks confidence ties (earlier registration wins).
#[derive(Debug, Default)]
pub struct PatternRegistry {
    patterns: Vec<Arc<BillPattern>>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with the built-in pattern presets.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for def in builtin::builtin_patterns()? {
            registry.register(&def)?;
        }
        Ok(registry)
    }

    /// Register a pattern. Fails on a duplicate id within the same language
    /// or on an invalid rule.
    pub fn register(&mut self, def: &BillPatternDef) -> Result<()> {
        let pattern = BillPattern::compile(def).map_err(SzamlaError::Pattern)?;

        if self
            .patterns
            .iter()
            .any(|p| p.language == pattern.language && p.id == pattern.id)
        {
            return Err(PatternError::DuplicatePattern {
                id: pattern.id,
                language: pattern.language.code().to_string(),
            }
            .into());
        }

        debug!(id = %pattern.id, language = %pattern.language, "registered bill pattern");
        self.patterns.push(Arc::new(pattern));
        Ok(())
    }

    /// Load every pattern from a JSON pattern file string.
    pub fn load_str(&mut self, json: &str) -> Result<usize> {
        let file: PatternFile =
            serde_json::from_str(json).map_err(PatternError::Parse)?;
        let count = file.patterns.len();
        for def in &file.patterns {
            self.register(def)?;
        }
        Ok(count)
    }

    /// Load every pattern from a JSON file on disk.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content)
    }

    /// Patterns for one language, in registration order.
    pub fn get_by_language(&self, language: Language) -> Vec<Arc<BillPattern>> {
        self.patterns
            .iter()
            .filter(|p| p.language == language)
            .cloned()
            .collect()
    }

    /// All patterns in registration order.
    pub fn get_all(&self) -> &[Arc<BillPattern>] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn minimal_def(id: &str, language: &str) -> BillPatternDef {
        let mut content = BTreeMap::new();
        content.insert(
            BillField::Amount,
            vec![r"(?i)amount\s*:?\s*([0-9][0-9 .,]*)".to_string()],
        );
        BillPatternDef {
            id: id.to_string(),
            name: format!("test pattern {id}"),
            language: language.to_string(),
            vendor: None,
            subject_patterns: Vec::new(),
            content_patterns: content,
            confirmation_keywords: Vec::new(),
        }
    }

    #[test]
    fn register_and_lookup_by_language() {
        let mut registry = PatternRegistry::new();
        registry.register(&minimal_def("a", "hu")).unwrap();
        registry.register(&minimal_def("b", "en")).unwrap();
        registry.register(&minimal_def("c", "hu")).unwrap();

        let hu = registry.get_by_language(Language::Hungarian);
        assert_eq!(hu.len(), 2);
        // Registration order preserved.
        assert_eq!(hu[0].id, "a");
        assert_eq!(hu[1].id, "c");
    }

    #[test]
    fn duplicate_id_same_language_rejected() {
        let mut registry = PatternRegistry::new();
        registry.register(&minimal_def("a", "hu")).unwrap();
        let err = registry.register(&minimal_def("a", "hu")).unwrap_err();
        assert!(matches!(
            err,
            SzamlaError::Pattern(PatternError::DuplicatePattern { .. })
        ));
        // Same id under another language is fine.
        registry.register(&minimal_def("a", "en")).unwrap();
    }

    #[test]
    fn missing_amount_rule_rejected() {
        let mut def = minimal_def("a", "hu");
        def.content_patterns.clear();
        def.content_patterns
            .insert(BillField::Vendor, vec!["(?i)vendor: (.+)".to_string()]);
        let err = PatternRegistry::new().register(&def).unwrap_err();
        assert!(matches!(
            err,
            SzamlaError::Pattern(PatternError::MissingAmountRule(_))
        ));
    }

    #[test]
    fn invalid_regex_rejected() {
        let mut def = minimal_def("a", "hu");
        def.subject_patterns.push("([unclosed".to_string());
        let err = PatternRegistry::new().register(&def).unwrap_err();
        assert!(matches!(
            err,
            SzamlaError::Pattern(PatternError::InvalidRule { .. })
        ));
    }

    #[test]
    fn builtin_presets_load() {
        let registry = PatternRegistry::with_builtin().unwrap();
        assert!(!registry.get_by_language(Language::Hungarian).is_empty());
        assert!(!registry.get_by_language(Language::English).is_empty());
    }
}
