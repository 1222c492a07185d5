//! Data models for bill extraction.

pub mod bill;
pub mod config;

pub use bill::{
    BillField, BillRecord, BillSource, DebugTrace, ExtractionMetadata, ExtractionMethod,
    ExtractionResult, FieldValue, SourceKind, StrategyAttempt,
};
pub use config::{ExtractionConfig, PositionConfig, SzamlaConfig, TransferConfig};
