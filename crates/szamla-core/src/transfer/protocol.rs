//! Wire shapes of the chunked-transfer protocol. Message and field names are
//! the contract with hosting boundaries; do not rename them.

use serde::{Deserialize, Serialize};

use crate::models::BillRecord;

use super::assembler::ChunkProgress;

/// Messages a producer sends across the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransferRequest {
    /// Start a chunked document transfer.
    #[serde(rename = "INIT_PDF_TRANSFER", rename_all = "camelCase")]
    InitPdfTransfer {
        total_chunks: usize,
        file_name: String,
        file_size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },

    /// One document fragment. The channel identifies the transfer; one
    /// transfer is in flight per channel.
    #[serde(rename = "PDF_CHUNK", rename_all = "camelCase")]
    PdfChunk { chunk_index: usize, chunk: Vec<u8> },

    /// Declare the transfer finished and request extraction.
    #[serde(rename = "COMPLETE_PDF_TRANSFER")]
    CompletePdfTransfer {},

    /// Direct, non-chunked processing call.
    #[serde(rename = "PROCESS_DOCUMENT", rename_all = "camelCase")]
    ProcessDocument {
        data: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extract_bill_data: Option<bool>,
    },
}

/// Acknowledgment for `INIT_PDF_TRANSFER`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitAck {
    pub success: bool,
    pub transfer_id: String,
}

/// Progress event for `PDF_CHUNK`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub progress: f32,
    pub chunk_index: usize,
    pub received_chunks: usize,
    pub total_chunks: usize,
}

impl From<ChunkProgress> for ProgressEvent {
    fn from(p: ChunkProgress) -> Self {
        Self {
            progress: p.progress,
            chunk_index: p.chunk_index,
            received_chunks: p.received_chunks,
            total_chunks: p.total_chunks,
        }
    }
}

/// Terminal reply for `COMPLETE_PDF_TRANSFER` and `PROCESS_DOCUMENT`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bills: Option<Vec<BillRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReply {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            bills: None,
            confidence: None,
            error: Some(error.into()),
        }
    }
}

/// Replies the processor sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransferReply {
    Init(InitAck),
    Progress(ProgressEvent),
    Document(DocumentReply),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn init_message_shape_is_stable() {
        let json = r#"{"type":"INIT_PDF_TRANSFER","totalChunks":3,"fileName":"szamla.pdf","fileSize":1024,"language":"hu"}"#;
        let msg: TransferRequest = serde_json::from_str(json).unwrap();
        match msg {
            TransferRequest::InitPdfTransfer {
                total_chunks,
                file_name,
                file_size,
                language,
            } => {
                assert_eq!(total_chunks, 3);
                assert_eq!(file_name, "szamla.pdf");
                assert_eq!(file_size, 1024);
                assert_eq!(language.as_deref(), Some("hu"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn chunk_message_shape_is_stable() {
        let json = r#"{"type":"PDF_CHUNK","chunkIndex":1,"chunk":[1,2,3]}"#;
        let msg: TransferRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            TransferRequest::PdfChunk { chunk_index: 1, ref chunk } if chunk == &[1, 2, 3]
        ));
    }

    #[test]
    fn progress_serializes_camel_case() {
        let event = ProgressEvent {
            progress: 0.5,
            chunk_index: 1,
            received_chunks: 2,
            total_chunks: 4,
        };
        let json = serde_json::to_string(&TransferReply::Progress(event)).unwrap();
        assert!(json.contains("\"receivedChunks\":2"));
        assert!(json.contains("\"totalChunks\":4"));
    }

    #[test]
    fn document_reply_omits_empty_fields() {
        let reply = DocumentReply::failure("boom");
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
    }
}
