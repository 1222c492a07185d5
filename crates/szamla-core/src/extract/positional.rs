//! 2-D proximity matching of field labels to nearby values.
//!
//! When the upstream decoder supplies laid-out text items, a field label
//! ("Fizetendő összeg") and its value ("6 364 Ft") are usually separate
//! fragments. This matcher associates them by rectangular proximity, encoding
//! the left-label/right-value and top-label/bottom-value conventions of the
//! sampled documents. All thresholds and weights come from `PositionConfig`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lang::{Language, StemDictionary};
use crate::models::{BillField, PositionConfig};

/// One laid-out text fragment on a page. Coordinates are page-local with the
/// origin fixed by the upstream decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PositionItem {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A value captured by proximity to a label.
#[derive(Debug, Clone)]
pub struct PositionalCapture {
    /// Raw captured value text.
    pub raw: String,
    /// Whether the enlarged highlight-box window produced it.
    pub highlighted: bool,
}

lazy_static! {
    /// An item that is an amount: optional currency, digits with separators,
    /// optional currency suffix.
    static ref AMOUNT_SHAPE: Regex = Regex::new(
        r"(?i)^\s*[$€£]?\s*([0-9][0-9 \u{00a0}.,]*)\s*(?:ft|huf|eur|usd)?\.?\s*$"
    )
    .unwrap();

    /// An item that is a date in either numeric convention.
    static ref DATE_SHAPE: Regex = Regex::new(
        r"^\s*((?:\d{4}[./\-]\s?\d{1,2}[./\-]\s?\d{1,2}|\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4})\.?)\s*$"
    )
    .unwrap();

    /// An item that is an identifier (invoice or account number).
    static ref IDENT_SHAPE: Regex =
        Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})\s*$").unwrap();

    /// An item that is name-like text.
    static ref NAME_SHAPE: Regex =
        Regex::new(r"^\s*(\p{L}[\p{L}\p{N} .,&'\-]{2,})\s*$").unwrap();
}

/// Label cue stems per field and language.
fn label_stems(field: &BillField, language: Language) -> &'static [&'static str] {
    match (language, field) {
        (Language::Hungarian, BillField::Amount) => &["fizet", "összeg"],
        (Language::Hungarian, BillField::DueDate) => &["határidő", "esedékes"],
        (Language::Hungarian, BillField::Vendor) => &["szolgáltató"],
        (Language::Hungarian, BillField::InvoiceNumber) => &["sorszám", "számla"],
        (Language::Hungarian, BillField::AccountNumber) => &["ügyfél"],
        (Language::English, BillField::Amount) => &["amount", "total", "payment"],
        (Language::English, BillField::DueDate) => &["due"],
        (Language::English, BillField::Vendor) => &["vendor"],
        (Language::English, BillField::InvoiceNumber) => &["invoice"],
        (Language::English, BillField::AccountNumber) => &["account"],
        (_, BillField::Custom(_)) => &[],
    }
}

fn value_shape(field: &BillField) -> &'static Regex {
    match field {
        BillField::Amount => &AMOUNT_SHAPE,
        BillField::DueDate => &DATE_SHAPE,
        BillField::InvoiceNumber | BillField::AccountNumber => &IDENT_SHAPE,
        BillField::Vendor | BillField::Custom(_) => &NAME_SHAPE,
    }
}

/// Proximity matcher over one page's position items.
pub struct PositionalMatcher<'a> {
    config: &'a PositionConfig,
    dict: StemDictionary,
}

impl<'a> PositionalMatcher<'a> {
    pub fn new(config: &'a PositionConfig, language: Language) -> Self {
        Self {
            config,
            dict: StemDictionary::for_language(language),
        }
    }

    /// Find the best value for a field.
    ///
    /// Labels are items matching the field's stem pattern; candidates are
    /// items inside the rectangular window around a label whose text matches
    /// the field's value shape. Candidates to the right of or below the label
    /// earn fixed bonuses; ties resolve to the earliest item in document
    /// order.
    pub fn find_field(
        &self,
        items: &[PositionItem],
        field: &BillField,
    ) -> Option<PositionalCapture> {
        let stems = label_stems(field, self.dict.language());
        if stems.is_empty() {
            return None;
        }
        let label_re = self.dict.stem_regex(stems)?;
        let shape = value_shape(field);

        let highlighted = self.config.highlight_fields.contains(field);
        let (window_dx, window_dy) = if highlighted {
            (
                self.config.highlight_window_dx,
                self.config.highlight_window_dy,
            )
        } else {
            (self.config.window_dx, self.config.window_dy)
        };

        let mut best: Option<(f32, usize, String)> = None;

        for label in items.iter().filter(|item| label_re.is_match(&item.text)) {
            let (label_cx, label_cy) = label.center();

            for (index, candidate) in items.iter().enumerate() {
                if std::ptr::eq(candidate, label) || label_re.is_match(&candidate.text) {
                    continue;
                }
                // Content filter runs before any scoring. Date-shaped items
                // also pass the digits-and-separators amount shape, so they
                // are excluded from amount candidates explicitly.
                if *field == BillField::Amount && DATE_SHAPE.is_match(&candidate.text) {
                    continue;
                }
                let Some(caps) = shape.captures(&candidate.text) else {
                    continue;
                };
                let (cand_cx, cand_cy) = candidate.center();
                if (cand_cx - label_cx).abs() > window_dx
                    || (cand_cy - label_cy).abs() > window_dy
                {
                    continue;
                }

                let mut score = 0.0f32;
                if cand_cx > label.right() {
                    score += self.config.right_bonus;
                }
                if cand_cy > label.bottom() {
                    score += self.config.below_bonus;
                }

                let raw = caps
                    .get(1)
                    .map(|g| g.as_str())
                    .unwrap_or_else(|| caps.get(0).unwrap().as_str())
                    .trim()
                    .to_string();

                let better = match &best {
                    None => true,
                    Some((best_score, best_index, _)) => {
                        score > *best_score || (score == *best_score && index < *best_index)
                    }
                };
                if better {
                    best = Some((score, index, raw));
                }
            }
        }

        best.map(|(_, _, raw)| PositionalCapture { raw, highlighted })
    }
}
