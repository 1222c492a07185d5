//! Bill record and extraction result models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lang::Language;

/// A bill field name. The set is closed for the fields every pattern category
/// shares, with a custom slot for vendor-specific extras.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillField {
    /// The payable amount. Every pattern must define at least one rule for it.
    Amount,
    /// Payment due date.
    DueDate,
    /// Vendor / service provider name.
    Vendor,
    /// Invoice serial number.
    InvoiceNumber,
    /// Customer account identifier.
    AccountNumber,
    /// Vendor-specific extension field.
    Custom(String),
}

impl BillField {
    /// Canonical snake_case name used in pattern files and serialized records.
    pub fn name(&self) -> &str {
        match self {
            BillField::Amount => "amount",
            BillField::DueDate => "due_date",
            BillField::Vendor => "vendor",
            BillField::InvoiceNumber => "invoice_number",
            BillField::AccountNumber => "account_number",
            BillField::Custom(name) => name,
        }
    }
}

impl From<String> for BillField {
    fn from(s: String) -> Self {
        match s.as_str() {
            "amount" => BillField::Amount,
            "due_date" => BillField::DueDate,
            "vendor" => BillField::Vendor,
            "invoice_number" => BillField::InvoiceNumber,
            "account_number" => BillField::AccountNumber,
            _ => BillField::Custom(s),
        }
    }
}

impl From<BillField> for String {
    fn from(f: BillField) -> Self {
        f.name().to_string()
    }
}

impl std::fmt::Display for BillField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed extracted field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Monetary amount.
    Amount(Decimal),
    /// Calendar date.
    Date(NaiveDate),
    /// Free text (vendor names, identifiers).
    Text(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Amount(a) => write!(f, "{a}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Text(t) => f.write_str(t),
        }
    }
}

/// Which strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Stem-aware matching with 2-D layout positions.
    StemPosition,
    /// Plain content-pattern matching over normalized text.
    Pattern,
    /// Last-resort regex over byte-scanned text.
    RawScan,
}

impl ExtractionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionMethod::StemPosition => "stem_position",
            ExtractionMethod::Pattern => "pattern",
            ExtractionMethod::RawScan => "raw_scan",
        }
    }
}

/// Kind of document origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Email,
    Pdf,
    #[default]
    Text,
}

/// Origin descriptor for a bill record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillSource {
    /// Origin kind.
    pub kind: SourceKind,
    /// Locator within that origin (file name, message id).
    pub locator: String,
}

/// Metadata about how one record's fields were extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Per-field confidence contributions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_confidence: BTreeMap<BillField, f32>,

    /// Warnings encountered during extraction (dropped captures, hint-filled
    /// values).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Fields the pattern defines rules for but nothing captured.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<BillField>,
}

impl ExtractionMetadata {
    pub fn is_empty(&self) -> bool {
        self.field_confidence.is_empty() && self.warnings.is_empty() && self.missing_fields.is_empty()
    }
}

/// One extracted bill. Created fresh per extraction call and never mutated
/// after being placed in a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRecord {
    /// Unique record id.
    pub id: String,
    /// Extracted field values.
    pub fields: BTreeMap<BillField, FieldValue>,
    /// Extraction confidence for this record, in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Strategy that produced this record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,
    /// Resolved document language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Origin descriptor.
    pub source: BillSource,
    /// Id of the pattern that matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// Extraction metadata: per-field confidence, warnings, missing fields.
    #[serde(default, skip_serializing_if = "ExtractionMetadata::is_empty")]
    pub metadata: ExtractionMetadata,
}

impl BillRecord {
    /// Create an empty record with a fresh id.
    pub fn new(source: BillSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fields: BTreeMap::new(),
            confidence: None,
            extraction_method: None,
            language: None,
            source,
            pattern_id: None,
            metadata: ExtractionMetadata::default(),
        }
    }

    /// The extracted amount, if present.
    pub fn amount(&self) -> Option<Decimal> {
        match self.fields.get(&BillField::Amount) {
            Some(FieldValue::Amount(a)) => Some(*a),
            _ => None,
        }
    }

    /// The extracted due date, if present.
    pub fn due_date(&self) -> Option<NaiveDate> {
        match self.fields.get(&BillField::DueDate) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Text value of a field, if present.
    pub fn text(&self, field: &BillField) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }
}

/// One strategy attempt in the debug trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    /// Strategy name.
    pub strategy: String,
    /// Confidence that attempt reached.
    pub confidence: f32,
    /// Whether the attempt cleared the acceptance threshold.
    pub accepted: bool,
}

/// Optional per-extraction debug trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugTrace {
    /// Attempts in fallback order.
    pub attempts: Vec<StrategyAttempt>,
}

/// Result of one extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// True only when at least one record has an amount set.
    pub success: bool,
    /// Extracted bill records, best first.
    pub bills: Vec<BillRecord>,
    /// Maximum confidence across returned records.
    pub confidence: f32,
    /// Boundary-level error, when extraction failed outright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Strategy trace, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugTrace>,
}

impl ExtractionResult {
    /// Build a result from extracted records. `success` requires an amount on
    /// at least one record and a non-zero confidence.
    pub fn from_bills(mut bills: Vec<BillRecord>) -> Self {
        bills.sort_by(|a, b| {
            b.confidence
                .unwrap_or(0.0)
                .partial_cmp(&a.confidence.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let confidence = bills
            .iter()
            .map(|b| b.confidence.unwrap_or(0.0))
            .fold(0.0f32, f32::max);
        let success = confidence > 0.0 && bills.iter().any(|b| b.amount().is_some());
        Self {
            success,
            bills,
            confidence,
            error: None,
            debug: None,
        }
    }

    /// An empty unsuccessful result.
    pub fn empty() -> Self {
        Self {
            success: false,
            bills: Vec::new(),
            confidence: 0.0,
            error: None,
            debug: None,
        }
    }

    /// A failed result carrying a boundary error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            bills: Vec::new(),
            confidence: 0.0,
            error: Some(error.into()),
            debug: None,
        }
    }

    /// Attach a strategy trace.
    pub fn with_debug(mut self, debug: DebugTrace) -> Self {
        self.debug = Some(debug);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn field_names_round_trip() {
        for field in [
            BillField::Amount,
            BillField::DueDate,
            BillField::Vendor,
            BillField::InvoiceNumber,
            BillField::AccountNumber,
            BillField::Custom("meter_id".into()),
        ] {
            assert_eq!(BillField::from(String::from(field.clone())), field);
        }
    }

    #[test]
    fn success_requires_amount() {
        let mut record = BillRecord::new(BillSource::default());
        record.confidence = Some(0.6);
        record
            .fields
            .insert(BillField::Vendor, FieldValue::Text("MVM".into()));
        let result = ExtractionResult::from_bills(vec![record.clone()]);
        assert!(!result.success);

        record
            .fields
            .insert(BillField::Amount, FieldValue::Amount(Decimal::from(6364)));
        let result = ExtractionResult::from_bills(vec![record]);
        assert!(result.success);
        assert!((result.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn result_confidence_is_max_of_records() {
        let mut a = BillRecord::new(BillSource::default());
        a.confidence = Some(0.3);
        a.fields
            .insert(BillField::Amount, FieldValue::Amount(Decimal::ONE));
        let mut b = BillRecord::new(BillSource::default());
        b.confidence = Some(0.7);
        b.fields
            .insert(BillField::Amount, FieldValue::Amount(Decimal::TWO));

        let result = ExtractionResult::from_bills(vec![a, b]);
        assert!((result.confidence - 0.7).abs() < f32::EPSILON);
        // Best record first.
        assert!((result.bills[0].confidence.unwrap() - 0.7).abs() < f32::EPSILON);
    }
}
