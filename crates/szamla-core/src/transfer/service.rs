//! Async boundary service hosting the chunk assembler and the extraction
//! pipeline behind the wire protocol.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::decode::{DocumentDecoder, PlainTextDecoder};
use crate::error::{ExtractionError, TransferError};
use crate::extract::{ExtractionContext, Orchestrator};
use crate::lang::Language;
use crate::models::{BillSource, SourceKind, TransferConfig};

use super::assembler::{AssembledDocument, ChunkAssembler, TransferMetadata};
use super::protocol::{DocumentReply, InitAck, TransferReply, TransferRequest};

/// One channel's transfer and extraction endpoint.
///
/// A service instance belongs to exactly one producer channel, so a single
/// transfer is in flight at a time and the channel itself identifies it.
/// Chunk reassembly stays on the service task; extraction is CPU-bound and
/// runs on the blocking pool under the extraction time budget.
pub struct TransferService {
    assembler: ChunkAssembler,
    orchestrator: Arc<Orchestrator>,
    transfer: TransferConfig,
    extraction_timeout_ms: u64,
    current: Option<String>,
}

impl TransferService {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        transfer: TransferConfig,
        extraction_timeout_ms: u64,
    ) -> Self {
        Self {
            assembler: ChunkAssembler::new(),
            orchestrator,
            transfer,
            extraction_timeout_ms,
            current: None,
        }
    }

    /// Serve one channel until the producer side closes. In-flight transfers
    /// are dropped on disconnect.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<TransferRequest>,
        replies: mpsc::Sender<TransferReply>,
    ) {
        while let Some(request) = requests.recv().await {
            let reply = self.handle(request).await;
            if replies.send(reply).await.is_err() {
                warn!("reply channel closed, stopping service");
                break;
            }
        }
        self.disconnect();
        info!("transfer service stopped");
    }

    /// Handle one protocol message.
    pub async fn handle(&mut self, request: TransferRequest) -> TransferReply {
        match request {
            TransferRequest::InitPdfTransfer {
                total_chunks,
                file_name,
                file_size,
                language,
            } => self.handle_init(total_chunks, file_name, file_size, language),
            TransferRequest::PdfChunk { chunk_index, chunk } => {
                self.handle_chunk(chunk_index, chunk)
            }
            TransferRequest::CompletePdfTransfer {} => self.handle_complete().await,
            TransferRequest::ProcessDocument {
                data,
                language,
                extract_bill_data,
            } => {
                self.handle_process(data, language, extract_bill_data.unwrap_or(true))
                    .await
            }
        }
    }

    /// Drop all channel state (producer disconnect).
    pub fn disconnect(&mut self) {
        self.assembler.discard_all();
        self.current = None;
    }

    fn handle_init(
        &mut self,
        total_chunks: usize,
        file_name: String,
        file_size: usize,
        language: Option<String>,
    ) -> TransferReply {
        if file_size > self.transfer.max_file_size {
            warn!(file_size, max = self.transfer.max_file_size, "oversized transfer rejected");
            return TransferReply::Document(DocumentReply::failure(format!(
                "declared file size {file_size} exceeds limit {}",
                self.transfer.max_file_size
            )));
        }

        // A new init supersedes any transfer this channel left unfinished.
        if let Some(stale) = self.current.take() {
            warn!(transfer_id = %stale, "superseding unfinished transfer");
            self.assembler.discard(&stale);
        }

        let metadata = TransferMetadata {
            file_name,
            file_size,
            language,
        };
        match self.assembler.init(total_chunks, metadata) {
            Ok(transfer_id) => {
                self.current = Some(transfer_id.clone());
                TransferReply::Init(InitAck {
                    success: true,
                    transfer_id,
                })
            }
            Err(err) => TransferReply::Document(DocumentReply::failure(err.to_string())),
        }
    }

    fn handle_chunk(&mut self, chunk_index: usize, chunk: Vec<u8>) -> TransferReply {
        let Some(transfer_id) = self.current.clone() else {
            return TransferReply::Document(DocumentReply::failure(
                TransferError::UnknownTransfer("no transfer in flight".into()).to_string(),
            ));
        };

        if let Some(reply) = self.expire_if_stale(&transfer_id) {
            return reply;
        }

        match self.assembler.put_chunk(&transfer_id, chunk_index, chunk) {
            Ok(progress) => TransferReply::Progress(progress.into()),
            Err(err) => TransferReply::Document(DocumentReply::failure(err.to_string())),
        }
    }

    async fn handle_complete(&mut self) -> TransferReply {
        let Some(transfer_id) = self.current.clone() else {
            return TransferReply::Document(DocumentReply::failure(
                TransferError::UnknownTransfer("no transfer in flight".into()).to_string(),
            ));
        };

        if let Some(reply) = self.expire_if_stale(&transfer_id) {
            return reply;
        }

        match self.assembler.complete(&transfer_id) {
            Ok(document) => {
                self.current = None;
                TransferReply::Document(self.extract(document, true).await)
            }
            // The record survives an incomplete completion, so the transfer
            // stays current and late chunks can still land.
            Err(err) => TransferReply::Document(DocumentReply::failure(err.to_string())),
        }
    }

    async fn handle_process(
        &mut self,
        data: Vec<u8>,
        language: Option<String>,
        extract_bill_data: bool,
    ) -> TransferReply {
        let document = AssembledDocument {
            data,
            metadata: TransferMetadata {
                file_name: String::new(),
                file_size: 0,
                language,
            },
        };
        TransferReply::Document(self.extract(document, extract_bill_data).await)
    }

    /// Enforce the transfer time budget. A stale transfer is dropped and the
    /// producer must re-init.
    fn expire_if_stale(&mut self, transfer_id: &str) -> Option<TransferReply> {
        let age = self.assembler.age_ms(transfer_id)?;
        if age <= self.transfer.timeout_ms {
            return None;
        }
        warn!(transfer_id, age_ms = age, "transfer timed out");
        self.assembler.discard(transfer_id);
        self.current = None;
        Some(TransferReply::Document(DocumentReply::failure(format!(
            "transfer timed out after {age} ms"
        ))))
    }

    /// Decode and extract one assembled document on the blocking pool.
    async fn extract(&self, document: AssembledDocument, extract_bills: bool) -> DocumentReply {
        let language = document
            .metadata
            .language
            .as_deref()
            .and_then(|code| Language::from_code(code).ok());

        let decoded = match PlainTextDecoder.decode(&document.data) {
            Ok(decoded) => decoded,
            Err(err) => return DocumentReply::failure(err.to_string()),
        };

        let mut ctx = ExtractionContext {
            text: decoded.clean.then(|| decoded.text.clone()),
            positions: decoded.positions,
            language,
            raw_data: Some(document.data),
            source: BillSource {
                kind: SourceKind::Pdf,
                locator: document.metadata.file_name.clone(),
            },
            ..Default::default()
        };

        if !extract_bills {
            return DocumentReply {
                success: !decoded.text.trim().is_empty(),
                text: Some(decoded.text),
                bills: None,
                confidence: None,
                error: None,
            };
        }

        let text = ctx.text.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let budget = Duration::from_millis(self.extraction_timeout_ms);
        let outcome = tokio::time::timeout(
            budget,
            tokio::task::spawn_blocking(move || orchestrator.extract(&ctx)),
        )
        .await;

        match outcome {
            Ok(Ok(Ok(result))) => {
                debug!(
                    bills = result.bills.len(),
                    confidence = result.confidence,
                    "document processed"
                );
                DocumentReply {
                    success: result.success,
                    text,
                    bills: Some(result.bills),
                    confidence: Some(result.confidence),
                    error: result.error,
                }
            }
            Ok(Ok(Err(err))) => DocumentReply::failure(err.to_string()),
            Ok(Err(join_err)) => {
                error!(%join_err, "extraction task failed");
                DocumentReply::failure("extraction task failed")
            }
            Err(_) => DocumentReply::failure(
                ExtractionError::Timeout(self.extraction_timeout_ms).to_string(),
            ),
        }
    }
}
