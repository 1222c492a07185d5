//! Additive confidence scoring for extraction candidates.

use crate::models::{BillField, ExtractionConfig, PositionConfig};

/// Where a field capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    /// Content rule over normalized text.
    Content,
    /// 2-D proximity match near a label.
    Proximity,
    /// Proximity match inside a highlighted summary box window.
    HighlightBox,
}

/// Evidence that one field was successfully captured.
#[derive(Debug, Clone)]
pub struct FieldEvidence {
    pub field: BillField,
    pub origin: MatchOrigin,
}

/// Combines per-field match evidence into one confidence in [0, 1].
///
/// Scoring is additive: the keyword-detection ratio contributes a fixed bonus
/// once it clears its threshold, and each captured field contributes an
/// increment weighted by how load-bearing the field is. Amount and due date
/// carry the most weight; a bill without them is not actionable.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    keyword_threshold: f32,
    keyword_bonus: f32,
    highlight_boost: f32,
}

impl ConfidenceScorer {
    pub fn new(extraction: &ExtractionConfig, position: &PositionConfig) -> Self {
        Self {
            keyword_threshold: extraction.keyword_threshold,
            keyword_bonus: extraction.keyword_bonus,
            highlight_boost: position.highlight_boost,
        }
    }

    /// Base confidence increment for one captured field.
    fn field_weight(field: &BillField) -> f32 {
        match field {
            BillField::Amount => 0.25,
            BillField::DueDate => 0.20,
            BillField::Vendor => 0.10,
            BillField::InvoiceNumber => 0.10,
            BillField::AccountNumber => 0.05,
            BillField::Custom(_) => 0.05,
        }
    }

    /// Confidence contribution of one piece of field evidence.
    pub fn field_score(&self, evidence: &FieldEvidence) -> f32 {
        let mut score = Self::field_weight(&evidence.field);
        if evidence.origin == MatchOrigin::HighlightBox {
            score += self.highlight_boost;
        }
        score
    }

    /// Score a candidate. Clamped to [0, 1].
    pub fn score(&self, keyword_ratio: f32, evidence: &[FieldEvidence]) -> f32 {
        let mut confidence = 0.0f32;

        if keyword_ratio >= self.keyword_threshold {
            confidence += self.keyword_bonus;
        }

        for item in evidence {
            confidence += self.field_score(item);
        }

        confidence.clamp(0.0, 1.0)
    }
}
