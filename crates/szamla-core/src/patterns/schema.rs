//! Declarative pattern records, loadable from JSON.
//!
//! Adding a bill type means adding a pattern record, not code: one rule table
//! is shared across languages and vendors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::BillField;

/// A pattern file: a set of bill patterns, typically one file per language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternFile {
    pub patterns: Vec<BillPatternDef>,
}

/// Declarative description of how to recognize and extract one bill
/// category/vendor/language combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillPatternDef {
    /// Pattern id, unique within its language.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Language code ("hu", "en").
    pub language: String,

    /// Optional vendor hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorHint>,

    /// Ordered rules evaluated against a subject/title line, when one is
    /// supplied. Any match lets the pattern fire.
    #[serde(default)]
    pub subject_patterns: Vec<String>,

    /// Field name -> ordered capture rules. Each rule is a regex with one
    /// capture group; the first rule capturing a non-empty group wins.
    pub content_patterns: BTreeMap<BillField, Vec<String>>,

    /// Stems (or literal terms) whose presence corroborates the match. An
    /// empty list means no confirmation gate.
    #[serde(default)]
    pub confirmation_keywords: Vec<String>,
}

/// Vendor hint attached to a pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorHint {
    /// Vendor name as it should appear in extracted records.
    pub name: String,

    /// Bill category (electricity, gas, telecom, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
