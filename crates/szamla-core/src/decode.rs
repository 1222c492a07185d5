//! Decoder seam between raw document bytes and the extraction pipeline.
//!
//! Page-level PDF decoding is an external collaborator: anything able to
//! produce page text (and optionally positioned text items) plugs in behind
//! `DocumentDecoder`. The crate ships a plain-text decoder and reuses the
//! degraded byte scanner for inputs the primary decoder cannot read.

use crate::error::Result;
use crate::extract::{scan_literal_strings, PositionItem};

/// Output of a document decoder.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    /// Extracted page text, possibly empty.
    pub text: String,
    /// Positioned text items, when the decoder provides layout.
    pub positions: Option<Vec<PositionItem>>,
    /// Whether the decoder considers the text clean. Unclean text makes the
    /// orchestrator keep the byte-scan fallback in play.
    pub clean: bool,
}

/// A page-level document decoder.
pub trait DocumentDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedDocument>;
}

/// Decoder for plain text inputs (email bodies, pre-extracted text).
#[derive(Debug, Default)]
pub struct PlainTextDecoder;

impl DocumentDecoder for PlainTextDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedDocument> {
        match std::str::from_utf8(data) {
            Ok(text) if printable_ratio(text) > 0.9 => Ok(DecodedDocument {
                text: text.to_string(),
                positions: None,
                clean: true,
            }),
            _ => Ok(DecodedDocument::default()),
        }
    }
}

/// Best-effort decoder over the byte-scan heuristic, for binary inputs the
/// primary decoder rejected.
#[derive(Debug, Default)]
pub struct RawScanDecoder;

impl DocumentDecoder for RawScanDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedDocument> {
        Ok(DecodedDocument {
            text: scan_literal_strings(data),
            positions: None,
            clean: false,
        })
    }
}

fn printable_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    printable as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_decodes_clean() {
        let doc = PlainTextDecoder.decode("Fizetendő összeg: 100 Ft".as_bytes()).unwrap();
        assert!(doc.clean);
        assert!(doc.text.contains("100 Ft"));
    }

    #[test]
    fn binary_input_is_not_clean() {
        let doc = PlainTextDecoder.decode(&[0u8, 159, 146, 150]).unwrap();
        assert!(!doc.clean);
        assert!(doc.text.is_empty());
    }

    #[test]
    fn raw_scan_recovers_literals() {
        let doc = RawScanDecoder
            .decode(b"\x00(Fizetendo osszeg: 100 Ft)\x00")
            .unwrap();
        assert!(!doc.clean);
        assert_eq!(doc.text, "Fizetendo osszeg: 100 Ft");
    }
}
