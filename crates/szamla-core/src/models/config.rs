//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use super::bill::BillField;

/// Main configuration for the szamla pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SzamlaConfig {
    /// Extraction and confidence configuration.
    pub extraction: ExtractionConfig,

    /// Positional matcher tunables.
    pub position: PositionConfig,

    /// Chunked transfer configuration.
    pub transfer: TransferConfig,
}

/// Extraction and confidence scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum confidence for the orchestrator to accept a strategy's result.
    pub min_confidence: f32,

    /// Keyword detection ratio above which the keyword bonus applies.
    pub keyword_threshold: f32,

    /// Confidence increment for clearing the keyword threshold.
    pub keyword_bonus: f32,

    /// Hard time budget for the matching phase, in milliseconds. Pathological
    /// input can backtrack badly in hand-written patterns; the orchestrator
    /// fails with a typed timeout error instead of hanging the host.
    pub timeout_ms: u64,

    /// Maximum bill records returned per extraction.
    pub max_bills: usize,

    /// Record a strategy trace in results.
    pub debug_trace: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.2,
            keyword_threshold: 0.5,
            keyword_bonus: 0.15,
            timeout_ms: 10_000,
            max_bills: 8,
            debug_trace: false,
        }
    }
}

/// Positional matcher tunables. The proximity heuristic is the most
/// failure-prone part of the pipeline, so window sizes and direction weights
/// are configuration, not code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Horizontal half-window for candidate values around a label.
    pub window_dx: f32,

    /// Vertical half-window for candidate values around a label.
    pub window_dy: f32,

    /// Enlarged horizontal window for highlighted summary-box fields.
    pub highlight_window_dx: f32,

    /// Enlarged vertical window for highlighted summary-box fields.
    pub highlight_window_dy: f32,

    /// Score bonus for a candidate to the right of its label.
    pub right_bonus: f32,

    /// Score bonus for a candidate below its label.
    pub below_bonus: f32,

    /// Confidence boost for values found via the enlarged highlight window.
    pub highlight_boost: f32,

    /// Fields that appear in highlighted summary boxes on the sampled layouts.
    pub highlight_fields: Vec<BillField>,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            window_dx: 280.0,
            window_dy: 45.0,
            highlight_window_dx: 360.0,
            highlight_window_dy: 110.0,
            right_bonus: 0.3,
            below_bonus: 0.2,
            highlight_boost: 0.05,
            highlight_fields: vec![BillField::Amount, BillField::DueDate],
        }
    }
}

/// Chunked transfer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Overall time budget for a transfer to complete, in milliseconds.
    pub timeout_ms: u64,

    /// Maximum accepted declared file size, in bytes.
    pub max_file_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_file_size: 64 * 1024 * 1024,
        }
    }
}

impl SzamlaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
