//! The extraction engine: matchers, confidence scoring, and the strategy
//! orchestrator.

pub mod confidence;
pub mod matcher;
pub mod orchestrator;
pub mod positional;
pub mod rawscan;

pub use confidence::{ConfidenceScorer, FieldEvidence, MatchOrigin};
pub use matcher::{FieldMatcher, PatternMatch};
pub use orchestrator::{ExtractionContext, Orchestrator};
pub use positional::{PositionItem, PositionalCapture, PositionalMatcher};
pub use rawscan::scan_literal_strings;
