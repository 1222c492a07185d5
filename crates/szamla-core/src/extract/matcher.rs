//! Content-rule matching of one pattern against normalized text.

use crate::lang::LanguageProcessor;
use crate::models::BillField;
use crate::patterns::BillPattern;

/// Raw captures of one pattern against one text.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Field -> raw captured string, in pattern declaration order.
    pub captures: Vec<(BillField, String)>,
    /// Fraction of the pattern's confirmation keywords found in the text.
    pub keyword_ratio: f32,
}

/// Applies a pattern's per-field rule sequences to normalized text.
pub struct FieldMatcher;

impl FieldMatcher {
    /// Match one pattern against the whole text, returning the first capture
    /// set. Returns `None` when the pattern does not fire.
    pub fn match_pattern(
        normalized_text: &str,
        subject: Option<&str>,
        pattern: &BillPattern,
        processor: &LanguageProcessor,
    ) -> Option<PatternMatch> {
        Self::match_segments(normalized_text, subject, pattern, processor)
            .into_iter()
            .next()
    }

    /// Match one pattern, one capture set per bill region in the text.
    ///
    /// Firing gate: when a subject is supplied and the pattern has subject
    /// rules, one of them must match the subject. Otherwise at least one
    /// confirmation keyword must be present; a pattern without confirmation
    /// keywords has no gate.
    ///
    /// Per field, rules run in order within a region and the first rule
    /// capturing a non-empty group wins; fields no rule captures are simply
    /// absent. A text carrying several amount occurrences (aggregator
    /// notifications listing one bill per provider) is split into one region
    /// per occurrence, so each bill yields its own capture set.
    pub fn match_segments(
        normalized_text: &str,
        subject: Option<&str>,
        pattern: &BillPattern,
        processor: &LanguageProcessor,
    ) -> Vec<PatternMatch> {
        let keyword_ratio = Self::keyword_ratio(normalized_text, pattern, processor);

        let gate_open = match subject {
            Some(subject) if !pattern.subject_rules.is_empty() => pattern
                .subject_rules
                .iter()
                .any(|rule| rule.is_match(subject)),
            _ => pattern.confirmation_keywords.is_empty() || keyword_ratio > 0.0,
        };
        if !gate_open {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for segment in Self::segments(normalized_text, pattern) {
            let mut captures = Vec::new();
            for (field, rules) in &pattern.content_rules {
                if let Some(raw) = Self::first_capture(segment, rules) {
                    captures.push((field.clone(), raw));
                }
            }
            if !captures.is_empty() {
                matches.push(PatternMatch {
                    captures,
                    keyword_ratio,
                });
            }
        }
        matches
    }

    /// Split the text into one region per amount occurrence. With zero or one
    /// occurrence the whole text is a single region.
    ///
    /// Between two amounts the cut prefers the last blank line (block
    /// boundary in aggregator layouts); failing that, the start of the line
    /// holding the next amount.
    fn segments<'t>(text: &'t str, pattern: &BillPattern) -> Vec<&'t str> {
        let Some(amount_rules) = pattern.rules_for(&BillField::Amount) else {
            return vec![text];
        };

        let mut spans: Vec<(usize, usize)> = amount_rules
            .iter()
            .flat_map(|rule| rule.find_iter(text).map(|m| (m.start(), m.end())))
            .collect();
        spans.sort_unstable();
        spans.dedup_by(|next, prev| next.0 < prev.1);
        if spans.len() <= 1 {
            return vec![text];
        }

        let mut cuts = vec![0usize];
        for window in spans.windows(2) {
            let (prev_end, next_start) = (window[0].1, window[1].0);
            let cut = match text[prev_end..next_start].rfind("\n\n") {
                Some(i) => prev_end + i + 2,
                None => text[..next_start]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .filter(|&i| i > prev_end)
                    .unwrap_or(next_start),
            };
            cuts.push(cut);
        }
        cuts.push(text.len());

        cuts.windows(2).map(|w| &text[w[0]..w[1]]).collect()
    }

    /// Fraction of the pattern's confirmation keyword stems present in text.
    pub fn keyword_ratio(
        text: &str,
        pattern: &BillPattern,
        processor: &LanguageProcessor,
    ) -> f32 {
        let stems: Vec<&str> = pattern
            .confirmation_keywords
            .iter()
            .map(String::as_str)
            .collect();
        processor.detect_keywords_by_stems(text, &stems)
    }

    fn first_capture(text: &str, rules: &[regex::Regex]) -> Option<String> {
        for rule in rules {
            if let Some(caps) = rule.captures(text) {
                if let Some(group) = caps.get(1) {
                    let raw = group.as_str().trim();
                    if !raw.is_empty() {
                        return Some(raw.to_string());
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use crate::models::BillField;
    use crate::patterns::{BillPattern, BillPatternDef};
    use std::collections::BTreeMap;

    fn hungarian_pattern(confirmation: &[&str]) -> BillPattern {
        let mut content = BTreeMap::new();
        content.insert(
            BillField::Amount,
            vec![
                r"(?i)nincs\s+ilyen\s+cimke\s*:?\s*([0-9]+)".to_string(),
                r"(?i)fizetendő\s+összeg\s*:?\s*([0-9][0-9 .,]*)\s*Ft".to_string(),
            ],
        );
        content.insert(
            BillField::Vendor,
            vec![r"(?i)szolgáltató\s+neve\s*:?\s*(.+)".to_string()],
        );
        let def = BillPatternDef {
            id: "test".into(),
            name: "test".into(),
            language: "hu".into(),
            vendor: None,
            subject_patterns: vec!["(?i)számla".to_string()],
            content_patterns: content,
            confirmation_keywords: confirmation.iter().map(|s| s.to_string()).collect(),
        };
        BillPattern::compile(&def).unwrap()
    }

    #[test]
    fn later_rule_fires_when_first_misses() {
        let pattern = hungarian_pattern(&[]);
        let processor = LanguageProcessor::new(Language::Hungarian);
        let text = "Fizetendő összeg: 6.364 Ft\nSzolgáltató neve: MVM Next Zrt.";

        let m = FieldMatcher::match_pattern(text, None, &pattern, &processor).unwrap();
        let amount = m
            .captures
            .iter()
            .find(|(f, _)| *f == BillField::Amount)
            .unwrap();
        assert_eq!(amount.1, "6.364");
    }

    #[test]
    fn aggregator_text_yields_one_capture_set_per_bill() {
        let pattern = hungarian_pattern(&[]);
        let processor = LanguageProcessor::new(Language::Hungarian);
        let text = "Szolgáltató neve: MVM Next Zrt.\n\
                    Fizetendő összeg: 6.364 Ft\n\
                    \n\
                    Szolgáltató neve: Díjbeszedő Holding Zrt.\n\
                    Fizetendő összeg: 12.500 Ft";

        let matches = FieldMatcher::match_segments(text, None, &pattern, &processor);
        assert_eq!(matches.len(), 2);

        let amount_of = |m: &PatternMatch| {
            m.captures
                .iter()
                .find(|(f, _)| *f == BillField::Amount)
                .map(|(_, raw)| raw.clone())
                .unwrap()
        };
        assert_eq!(amount_of(&matches[0]), "6.364");
        assert_eq!(amount_of(&matches[1]), "12.500");

        let vendor_of = |m: &PatternMatch| {
            m.captures
                .iter()
                .find(|(f, _)| *f == BillField::Vendor)
                .map(|(_, raw)| raw.clone())
                .unwrap()
        };
        assert!(vendor_of(&matches[0]).contains("MVM"));
        assert!(vendor_of(&matches[1]).contains("Díjbeszedő"));
    }

    #[test]
    fn unmatched_fields_are_absent_not_errors() {
        let pattern = hungarian_pattern(&[]);
        let processor = LanguageProcessor::new(Language::Hungarian);
        let text = "Fizetendő összeg: 100 Ft";

        let m = FieldMatcher::match_pattern(text, None, &pattern, &processor).unwrap();
        assert!(m.captures.iter().all(|(f, _)| *f != BillField::Vendor));
    }

    #[test]
    fn confirmation_gate_blocks_without_keywords() {
        let pattern = hungarian_pattern(&["határidő"]);
        let processor = LanguageProcessor::new(Language::Hungarian);
        let text = "Fizetendő összeg: 100 Ft";

        assert!(FieldMatcher::match_pattern(text, None, &pattern, &processor).is_none());
    }

    #[test]
    fn subject_gate_wins_over_keyword_gate_when_subject_present() {
        let pattern = hungarian_pattern(&["határidő"]);
        let processor = LanguageProcessor::new(Language::Hungarian);
        let text = "Fizetendő összeg: 100 Ft";

        // Subject matches a subject rule, so the keyword gate is bypassed.
        let m = FieldMatcher::match_pattern(text, Some("Havi számla"), &pattern, &processor);
        assert!(m.is_some());

        // Subject present but not matching: pattern does not fire.
        let m = FieldMatcher::match_pattern(text, Some("Hírlevél"), &pattern, &processor);
        assert!(m.is_none());
    }
}
