//! Core library for multilingual bill data extraction.
//!
//! This crate provides:
//! - Language processing for Hungarian and English billing text
//!   (normalization, stemming, locale-aware amount and date parsing)
//! - A pattern registry of per-vendor extraction rules with built-in presets
//! - A layered extraction pipeline (positional, pattern, byte-scan fallback)
//!   with additive confidence scoring
//! - A chunked document transfer protocol and its async boundary service

pub mod decode;
pub mod error;
pub mod extract;
pub mod lang;
pub mod models;
pub mod patterns;
pub mod transfer;

pub use error::{ExtractionError, PatternError, Result, SzamlaError, TransferError};
pub use extract::{ExtractionContext, Orchestrator, PositionItem};
pub use lang::{detect_language, Language, LanguageProcessor};
pub use models::{
    BillField, BillRecord, ExtractionMetadata, ExtractionMethod, ExtractionResult, FieldValue,
    SzamlaConfig,
};
pub use patterns::{BillPattern, BillPatternDef, PatternRegistry};
pub use transfer::{ChunkAssembler, TransferRequest, TransferService};
