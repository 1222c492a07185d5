//! Strategy orchestration: run extraction strategies in fallback order and
//! assemble the final result.
//!
//! Order is strict: stem-aware positional matching (needs layout positions),
//! then content-pattern matching over normalized text, then the degraded
//! byte-scan. The first strategy whose best record clears the configured
//! confidence threshold wins; when every strategy falls short the best
//! candidate seen anywhere is returned rather than nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::error::{ExtractionError, Result};
use crate::extract::confidence::{ConfidenceScorer, FieldEvidence, MatchOrigin};
use crate::extract::matcher::FieldMatcher;
use crate::extract::positional::{PositionItem, PositionalMatcher};
use crate::extract::rawscan::scan_literal_strings;
use crate::lang::{detect_language, Language, LanguageProcessor};
use crate::models::{
    BillField, BillRecord, BillSource, DebugTrace, ExtractionConfig, ExtractionMethod,
    ExtractionResult, FieldValue, PositionConfig, StrategyAttempt, SzamlaConfig,
};
use crate::patterns::{BillPattern, PatternRegistry};

/// Everything known about one document before extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Decoded document text, when a decoder produced one.
    pub text: Option<String>,
    /// Message subject, for subject-gated patterns.
    pub subject: Option<String>,
    /// Laid-out text items, when the decoder provides layout.
    pub positions: Option<Vec<PositionItem>>,
    /// Caller-supplied language hint. Absent means auto-detect.
    pub language: Option<Language>,
    /// Raw document bytes, for the byte-scan fallback.
    pub raw_data: Option<Vec<u8>>,
    /// Origin descriptor stamped onto every record.
    pub source: BillSource,
    /// Identity of the requesting user. Carried for downstream field mapping,
    /// not consumed by extraction.
    pub user_id: Option<String>,
}

impl ExtractionContext {
    /// Context over already-decoded text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_positions(mut self, positions: Vec<PositionItem>) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_raw_data(mut self, data: Vec<u8>) -> Self {
        self.raw_data = Some(data);
        self
    }

    pub fn with_source(mut self, source: BillSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// One strategy's outcome: its records and the best confidence among them.
struct StrategyOutcome {
    method: ExtractionMethod,
    records: Vec<BillRecord>,
    confidence: f32,
}

/// Runs the strategy chain for one document.
pub struct Orchestrator {
    registry: Arc<PatternRegistry>,
    extraction: ExtractionConfig,
    position: PositionConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<PatternRegistry>, config: &SzamlaConfig) -> Self {
        Self {
            registry,
            extraction: config.extraction.clone(),
            position: config.position.clone(),
        }
    }

    /// Extract bill records from one document.
    ///
    /// Returns `Err` only for boundary failures: no patterns registered for
    /// the resolved language, or the time budget running out. A document where
    /// nothing matches yields `success: false` with zero confidence.
    #[instrument(skip_all, fields(patterns = self.registry.len()))]
    pub fn extract(&self, ctx: &ExtractionContext) -> Result<ExtractionResult> {
        let deadline = Instant::now() + Duration::from_millis(self.extraction.timeout_ms);

        let scanned = match (&ctx.text, &ctx.raw_data) {
            (Some(text), _) if !text.trim().is_empty() => None,
            (_, Some(raw)) => Some(scan_literal_strings(raw)),
            _ => None,
        };
        let text = ctx
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(scanned.as_deref())
            .unwrap_or("");
        if text.trim().is_empty() {
            return Ok(ExtractionResult::empty());
        }

        let language = ctx.language.unwrap_or_else(|| detect_language(text));
        let processor = LanguageProcessor::new(language);
        let normalized = processor.normalize(text);

        let patterns = self.registry.get_by_language(language);
        if patterns.is_empty() {
            return Err(ExtractionError::NoPatternMatch(language.code().to_string()).into());
        }

        let scorer = ConfidenceScorer::new(&self.extraction, &self.position);
        let mut trace = DebugTrace::default();
        let mut best: Option<StrategyOutcome> = None;

        let strategies = [
            ExtractionMethod::StemPosition,
            ExtractionMethod::Pattern,
            ExtractionMethod::RawScan,
        ];

        for method in strategies {
            check_deadline(deadline, self.extraction.timeout_ms)?;

            let records = match method {
                ExtractionMethod::StemPosition => {
                    let Some(positions) = ctx.positions.as_deref() else {
                        continue;
                    };
                    self.run_positional(positions, &normalized, &patterns, &processor, &scorer, ctx)
                }
                ExtractionMethod::Pattern => self.run_patterns(
                    &normalized,
                    ctx.subject.as_deref(),
                    // When the byte-scan produced the primary text, records
                    // are attributed to the scan, not the pattern strategy.
                    if scanned.is_some() {
                        ExtractionMethod::RawScan
                    } else {
                        method
                    },
                    &patterns,
                    &processor,
                    &scorer,
                    ctx,
                    deadline,
                )?,
                ExtractionMethod::RawScan => {
                    // Without raw bytes, or when the byte-scan already served
                    // as the primary text, there is nothing new to scan.
                    let Some(raw) = ctx.raw_data.as_deref() else {
                        continue;
                    };
                    if scanned.is_some() {
                        continue;
                    }
                    let recovered = processor.normalize(&scan_literal_strings(raw));
                    if recovered.trim().is_empty() {
                        continue;
                    }
                    self.run_patterns(
                        &recovered,
                        ctx.subject.as_deref(),
                        method,
                        &patterns,
                        &processor,
                        &scorer,
                        ctx,
                        deadline,
                    )?
                }
            };

            let confidence = records
                .iter()
                .map(|r| r.confidence.unwrap_or(0.0))
                .fold(0.0f32, f32::max);
            let accepted = confidence >= self.extraction.min_confidence;
            debug!(strategy = method.name(), confidence, accepted, "strategy attempt");
            trace.attempts.push(StrategyAttempt {
                strategy: method.name().to_string(),
                confidence,
                accepted,
            });

            let outcome = StrategyOutcome {
                method,
                records,
                confidence,
            };
            if accepted {
                best = Some(outcome);
                break;
            }
            if best.as_ref().map_or(true, |b| confidence > b.confidence) {
                best = Some(outcome);
            }
        }

        let mut result = match best {
            Some(outcome) if !outcome.records.is_empty() => {
                if outcome.confidence < self.extraction.min_confidence {
                    warn!(
                        strategy = outcome.method.name(),
                        confidence = outcome.confidence,
                        "no strategy cleared the confidence threshold, returning best effort"
                    );
                }
                let mut records = dedupe_records(outcome.records);
                records.truncate(self.extraction.max_bills);
                ExtractionResult::from_bills(records)
            }
            _ => ExtractionResult::empty(),
        };

        if self.extraction.debug_trace {
            result = result.with_debug(trace);
        }
        Ok(result)
    }

    /// Content-pattern strategy: one candidate record per firing pattern.
    #[allow(clippy::too_many_arguments)]
    fn run_patterns(
        &self,
        normalized: &str,
        subject: Option<&str>,
        method: ExtractionMethod,
        patterns: &[Arc<BillPattern>],
        processor: &LanguageProcessor,
        scorer: &ConfidenceScorer,
        ctx: &ExtractionContext,
        deadline: Instant,
    ) -> Result<Vec<BillRecord>> {
        let mut records = Vec::new();

        for pattern in patterns {
            check_deadline(deadline, self.extraction.timeout_ms)?;

            // A text listing several bills yields one capture set, and hence
            // one record, per bill.
            for m in FieldMatcher::match_segments(normalized, subject, pattern, processor) {
                let mut record = BillRecord::new(ctx.source.clone());
                let mut evidence = Vec::new();
                for (field, raw) in &m.captures {
                    match parse_field_value(field, raw, processor) {
                        Some(value) => {
                            record.fields.insert(field.clone(), value);
                            evidence.push(FieldEvidence {
                                field: field.clone(),
                                origin: MatchOrigin::Content,
                            });
                        }
                        None => record
                            .metadata
                            .warnings
                            .push(format!("dropped unparseable {field} capture {raw:?}")),
                    }
                }
                if evidence.is_empty() {
                    continue;
                }

                fill_vendor_hint(&mut record, pattern);
                annotate_metadata(&mut record, pattern, &evidence, scorer);
                record.confidence = Some(scorer.score(m.keyword_ratio, &evidence));
                record.extraction_method = Some(method);
                record.language = Some(processor.language());
                record.pattern_id = Some(pattern.id.clone());
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Stem-position strategy: proximity captures per pattern field, scored
    /// with the full-text keyword ratio of the pattern.
    fn run_positional(
        &self,
        positions: &[PositionItem],
        normalized: &str,
        patterns: &[Arc<BillPattern>],
        processor: &LanguageProcessor,
        scorer: &ConfidenceScorer,
        ctx: &ExtractionContext,
    ) -> Vec<BillRecord> {
        let matcher = PositionalMatcher::new(&self.position, processor.language());
        let mut records = Vec::new();

        for pattern in patterns {
            let keyword_ratio = FieldMatcher::keyword_ratio(normalized, pattern, processor);
            if !pattern.confirmation_keywords.is_empty() && keyword_ratio == 0.0 {
                continue;
            }

            let mut record = BillRecord::new(ctx.source.clone());
            let mut evidence = Vec::new();
            for field in pattern.fields() {
                let Some(capture) = matcher.find_field(positions, field) else {
                    continue;
                };
                let Some(value) = parse_field_value(field, &capture.raw, processor) else {
                    record
                        .metadata
                        .warnings
                        .push(format!("dropped unparseable {field} capture {:?}", capture.raw));
                    continue;
                };
                record.fields.insert(field.clone(), value);
                evidence.push(FieldEvidence {
                    field: field.clone(),
                    origin: if capture.highlighted {
                        MatchOrigin::HighlightBox
                    } else {
                        MatchOrigin::Proximity
                    },
                });
            }
            if evidence.is_empty() {
                continue;
            }

            fill_vendor_hint(&mut record, pattern);
            annotate_metadata(&mut record, pattern, &evidence, scorer);
            record.confidence = Some(scorer.score(keyword_ratio, &evidence));
            record.extraction_method = Some(ExtractionMethod::StemPosition);
            record.language = Some(processor.language());
            record.pattern_id = Some(pattern.id.clone());
            records.push(record);
        }

        records
    }
}

fn check_deadline(deadline: Instant, budget_ms: u64) -> Result<()> {
    if Instant::now() >= deadline {
        Err(ExtractionError::Timeout(budget_ms).into())
    } else {
        Ok(())
    }
}

/// Parse one captured raw string into a typed value. Unparseable amounts and
/// dates drop the capture rather than storing garbage.
fn parse_field_value(
    field: &BillField,
    raw: &str,
    processor: &LanguageProcessor,
) -> Option<FieldValue> {
    match field {
        BillField::Amount => {
            let amount = processor.clean_amount(raw);
            (amount > Decimal::ZERO).then_some(FieldValue::Amount(amount))
        }
        BillField::DueDate => processor.parse_date(raw).map(FieldValue::Date),
        _ => {
            let text = raw.trim().trim_end_matches(['.', ',']).trim();
            (!text.is_empty()).then(|| FieldValue::Text(text.to_string()))
        }
    }
}

/// Fill the vendor field from the pattern's vendor hint when no rule captured
/// one. Hint-sourced vendors carry no confidence evidence.
fn fill_vendor_hint(record: &mut BillRecord, pattern: &BillPattern) {
    if record.fields.contains_key(&BillField::Vendor) {
        return;
    }
    if let Some(hint) = &pattern.vendor {
        record
            .fields
            .insert(BillField::Vendor, FieldValue::Text(hint.name.clone()));
        record
            .metadata
            .warnings
            .push(format!("vendor filled from pattern hint {:?}", hint.name));
    }
}

/// Store per-field confidence contributions and the pattern fields nothing
/// captured on the record's metadata.
fn annotate_metadata(
    record: &mut BillRecord,
    pattern: &BillPattern,
    evidence: &[FieldEvidence],
    scorer: &ConfidenceScorer,
) {
    for item in evidence {
        record
            .metadata
            .field_confidence
            .insert(item.field.clone(), scorer.field_score(item));
    }
    record.metadata.missing_fields = pattern
        .fields()
        .filter(|field| !record.fields.contains_key(field))
        .cloned()
        .collect();
}

/// Drop duplicate records describing the same bill. Two records with the same
/// amount and invoice number are duplicates; the higher-confidence one wins,
/// with earlier pattern registration breaking ties.
fn dedupe_records(records: Vec<BillRecord>) -> Vec<BillRecord> {
    let mut kept: Vec<BillRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = (
            record.amount(),
            record.text(&BillField::InvoiceNumber).map(str::to_string),
        );
        match kept.iter_mut().find(|existing| {
            (
                existing.amount(),
                existing
                    .text(&BillField::InvoiceNumber)
                    .map(str::to_string),
            ) == key
        }) {
            Some(existing) => {
                if record.confidence.unwrap_or(0.0) > existing.confidence.unwrap_or(0.0) {
                    *existing = record;
                }
            }
            None => kept.push(record),
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn orchestrator() -> Orchestrator {
        let registry = Arc::new(PatternRegistry::with_builtin().unwrap());
        Orchestrator::new(registry, &SzamlaConfig::default())
    }

    const MVM_TEXT: &str = "\
Tisztelt Ügyfelünk!\n\
Szolgáltató neve: MVM Next Energiakereskedelmi Zrt.\n\
Számla sorszáma: 845602160521\n\
Fizetendő összeg: 6.364 Ft\n\
Fizetési határidő: 2025.05.05\n";

    #[test]
    fn extracts_hungarian_bill_from_text() {
        let result = orchestrator()
            .extract(&ExtractionContext::from_text(MVM_TEXT))
            .unwrap();

        assert!(result.success);
        assert!(result.confidence > 0.5);
        let bill = &result.bills[0];
        assert_eq!(bill.amount(), Some(Decimal::from(6364)));
        assert_eq!(
            bill.due_date(),
            chrono::NaiveDate::from_ymd_opt(2025, 5, 5)
        );
        assert!(bill.text(&BillField::Vendor).unwrap().contains("MVM"));
        assert_eq!(
            bill.text(&BillField::InvoiceNumber),
            Some("845602160521")
        );
        assert_eq!(bill.extraction_method, Some(ExtractionMethod::Pattern));
        assert_eq!(bill.language, Some(Language::Hungarian));
    }

    #[test]
    fn garbage_text_yields_unsuccessful_result() {
        let result = orchestrator()
            .extract(&ExtractionContext::from_text(
                "zzz qqq semmi értelmes tartalom nincs itt",
            ))
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.confidence, 0.0);
        assert!(result.bills.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = orchestrator()
            .extract(&ExtractionContext::from_text("   "))
            .unwrap();
        assert!(!result.success);
        assert!(result.bills.is_empty());
    }

    #[test]
    fn no_patterns_for_language_is_an_error() {
        let mut registry = PatternRegistry::new();
        // Only English patterns registered.
        let mut content = std::collections::BTreeMap::new();
        content.insert(
            BillField::Amount,
            vec![r"(?i)amount\s*:?\s*([0-9.,]+)".to_string()],
        );
        registry
            .register(&crate::patterns::BillPatternDef {
                id: "en-only".into(),
                name: "en only".into(),
                language: "en".into(),
                vendor: None,
                subject_patterns: Vec::new(),
                content_patterns: content,
                confirmation_keywords: Vec::new(),
            })
            .unwrap();

        let orchestrator = Orchestrator::new(Arc::new(registry), &SzamlaConfig::default());
        let err = orchestrator
            .extract(
                &ExtractionContext::from_text(MVM_TEXT).with_language(Language::Hungarian),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::SzamlaError::Extraction(ExtractionError::NoPatternMatch(_))
        ));
    }

    #[test]
    fn raw_scan_fallback_recovers_from_binary() {
        let mut data = vec![0u8, 1, 2];
        data.extend_from_slice(
            "(Fizetend\u{151} \u{f6}sszeg: 175 945 Ft)\n(Fizet\u{e9}si hat\u{e1}rid\u{151}: 2025.06.01)"
                .as_bytes(),
        );
        data.push(0xff);

        let ctx = ExtractionContext {
            raw_data: Some(data),
            language: Some(Language::Hungarian),
            ..Default::default()
        };
        let result = orchestrator().extract(&ctx).unwrap();
        assert!(result.success);
        assert_eq!(result.bills[0].amount(), Some(Decimal::from(175_945)));
        assert_eq!(
            result.bills[0].extraction_method,
            Some(ExtractionMethod::RawScan)
        );
    }

    #[test]
    fn positional_strategy_wins_when_layout_present() {
        fn item(text: &str, x: f32, y: f32) -> PositionItem {
            PositionItem {
                text: text.to_string(),
                x,
                y,
                width: text.len() as f32 * 6.0,
                height: 12.0,
            }
        }

        let ctx = ExtractionContext::from_text(MVM_TEXT).with_positions(vec![
            item("Fizetendő összeg:", 40.0, 200.0),
            item("6 364 Ft", 220.0, 200.0),
            item("Fizetési határidő:", 40.0, 230.0),
            item("2025.05.05", 220.0, 230.0),
        ]);

        let result = orchestrator().extract(&ctx).unwrap();
        assert!(result.success);
        assert_eq!(
            result.bills[0].extraction_method,
            Some(ExtractionMethod::StemPosition)
        );
        assert_eq!(result.bills[0].amount(), Some(Decimal::from(6364)));
    }

    #[test]
    fn aggregator_notification_yields_one_record_per_bill() {
        let text = "\
Szolgáltató neve: MVM Next Energiakereskedelmi Zrt.\n\
Számla sorszáma: 111222333\n\
Fizetendő összeg: 6.364 Ft\n\
Fizetési határidő: 2025.05.05\n\
\n\
Szolgáltató neve: Díjbeszedő Holding Zrt.\n\
Számla sorszáma: 444555666\n\
Fizetendő összeg: 12.500 Ft\n\
Fizetési határidő: 2025.05.10\n";

        let result = orchestrator()
            .extract(&ExtractionContext::from_text(text))
            .unwrap();
        assert!(result.success);

        let amounts: Vec<Decimal> = result.bills.iter().filter_map(|b| b.amount()).collect();
        assert_eq!(amounts.len(), 2);
        assert!(amounts.contains(&Decimal::from(6364)));
        assert!(amounts.contains(&Decimal::from(12_500)));

        let second = result
            .bills
            .iter()
            .find(|b| b.amount() == Some(Decimal::from(12_500)))
            .unwrap();
        assert!(second.text(&BillField::Vendor).unwrap().contains("Díjbeszedő"));
        assert_eq!(
            second.due_date(),
            chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        );
        assert_eq!(
            second.text(&BillField::InvoiceNumber),
            Some("444555666")
        );
    }

    #[test]
    fn records_carry_field_confidence_and_missing_fields() {
        let result = orchestrator()
            .extract(&ExtractionContext::from_text(MVM_TEXT))
            .unwrap();

        let bill = &result.bills[0];
        let meta = &bill.metadata;
        assert!(meta.field_confidence.contains_key(&BillField::Amount));
        assert!(meta.field_confidence.contains_key(&BillField::DueDate));
        assert!(meta.missing_fields.contains(&BillField::AccountNumber));

        // Field contributions never exceed the record's overall confidence.
        let total: f32 = meta.field_confidence.values().sum();
        assert!(bill.confidence.unwrap() >= total);
    }

    #[test]
    fn hint_filled_vendor_is_flagged_in_warnings() {
        let result = orchestrator()
            .extract(&ExtractionContext::from_text("Fizetendő összeg: 100 Ft"))
            .unwrap();

        let bill = &result.bills[0];
        assert_eq!(
            bill.text(&BillField::Vendor),
            Some("MVM Next Energiakereskedelmi Zrt.")
        );
        assert!(bill.metadata.warnings.iter().any(|w| w.contains("vendor")));
    }

    #[test]
    fn duplicate_bills_are_collapsed() {
        // Both hu-mvm and hu-generic fire on this text with the same amount
        // and invoice number; only one record survives.
        let result = orchestrator()
            .extract(&ExtractionContext::from_text(MVM_TEXT))
            .unwrap();
        let count = result
            .bills
            .iter()
            .filter(|b| b.amount() == Some(Decimal::from(6364)))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn debug_trace_records_strategy_attempts() {
        let registry = Arc::new(PatternRegistry::with_builtin().unwrap());
        let mut config = SzamlaConfig::default();
        config.extraction.debug_trace = true;
        let orchestrator = Orchestrator::new(registry, &config);

        let result = orchestrator
            .extract(&ExtractionContext::from_text(MVM_TEXT))
            .unwrap();
        let trace = result.debug.unwrap();
        assert!(!trace.attempts.is_empty());
        assert!(trace.attempts.iter().any(|a| a.accepted));
    }
}
