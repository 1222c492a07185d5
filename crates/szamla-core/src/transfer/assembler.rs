//! Reassembly of documents delivered as ordered binary fragments.

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;
use uuid::Uuid;

use crate::error::TransferError;

/// Metadata declared when a transfer is initialized.
#[derive(Debug, Clone, Default)]
pub struct TransferMetadata {
    /// Original file name.
    pub file_name: String,
    /// Declared total size in bytes.
    pub file_size: usize,
    /// Optional language hint for extraction.
    pub language: Option<String>,
}

/// One in-flight transfer.
#[derive(Debug)]
struct ChunkTransfer {
    total_chunks: usize,
    received_chunks: usize,
    chunks: Vec<Option<Vec<u8>>>,
    metadata: TransferMetadata,
    started: Instant,
}

/// Progress acknowledgment for one received chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkProgress {
    /// Completion fraction in [0, 1].
    pub progress: f32,
    /// Index of the chunk just written.
    pub chunk_index: usize,
    /// Distinct chunk indices received so far.
    pub received_chunks: usize,
    /// Declared chunk count.
    pub total_chunks: usize,
}

/// A completed, reassembled document.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    /// Contiguous document bytes, chunk-index order.
    pub data: Vec<u8>,
    /// Metadata from transfer init.
    pub metadata: TransferMetadata,
}

/// Reassembles chunked transfers. Chunks may arrive out of order or
/// repeatedly; assembly order is always chunk-index order. The assembler
/// imposes no timeout itself; the hosting boundary owns cancellation.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    transfers: HashMap<String, ChunkTransfer>,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transfer, returning its id.
    pub fn init(
        &mut self,
        total_chunks: usize,
        metadata: TransferMetadata,
    ) -> Result<String, TransferError> {
        if total_chunks == 0 {
            return Err(TransferError::EmptyTransfer);
        }

        let id = Uuid::new_v4().to_string();
        debug!(
            transfer_id = %id,
            total_chunks,
            file_name = %metadata.file_name,
            "transfer initialized"
        );
        self.transfers.insert(
            id.clone(),
            ChunkTransfer {
                total_chunks,
                received_chunks: 0,
                chunks: vec![None; total_chunks],
                metadata,
                started: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Store one chunk. Idempotent per index: a rewrite replaces the bytes
    /// (last write wins) without bumping the received counter.
    pub fn put_chunk(
        &mut self,
        transfer_id: &str,
        index: usize,
        bytes: Vec<u8>,
    ) -> Result<ChunkProgress, TransferError> {
        let transfer = self
            .transfers
            .get_mut(transfer_id)
            .ok_or_else(|| TransferError::UnknownTransfer(transfer_id.to_string()))?;

        if index >= transfer.total_chunks {
            return Err(TransferError::ChunkOutOfRange {
                index,
                total: transfer.total_chunks,
            });
        }

        if transfer.chunks[index].is_none() {
            transfer.received_chunks += 1;
        }
        transfer.chunks[index] = Some(bytes);

        Ok(ChunkProgress {
            progress: transfer.received_chunks as f32 / transfer.total_chunks as f32,
            chunk_index: index,
            received_chunks: transfer.received_chunks,
            total_chunks: transfer.total_chunks,
        })
    }

    /// Finish a transfer, concatenating chunks by index into one buffer.
    ///
    /// Fails with `MissingChunks` when any declared chunk is absent; the
    /// transfer record survives the failure so late chunks can still arrive.
    /// On success the record is discarded (single use).
    pub fn complete(&mut self, transfer_id: &str) -> Result<AssembledDocument, TransferError> {
        let transfer = self
            .transfers
            .get(transfer_id)
            .ok_or_else(|| TransferError::UnknownTransfer(transfer_id.to_string()))?;

        if transfer.received_chunks != transfer.total_chunks {
            return Err(TransferError::MissingChunks {
                received: transfer.received_chunks,
                expected: transfer.total_chunks,
            });
        }

        let transfer = self.transfers.remove(transfer_id).expect("checked above");
        let mut data = Vec::with_capacity(transfer.metadata.file_size);
        for chunk in transfer.chunks.into_iter().flatten() {
            data.extend_from_slice(&chunk);
        }

        debug!(
            transfer_id,
            bytes = data.len(),
            elapsed_ms = transfer.started.elapsed().as_millis() as u64,
            "transfer assembled"
        );

        Ok(AssembledDocument {
            data,
            metadata: transfer.metadata,
        })
    }

    /// Milliseconds since a transfer was initialized.
    pub fn age_ms(&self, transfer_id: &str) -> Option<u64> {
        self.transfers
            .get(transfer_id)
            .map(|t| t.started.elapsed().as_millis() as u64)
    }

    /// Drop a transfer without side effects. Returns whether it existed.
    pub fn discard(&mut self, transfer_id: &str) -> bool {
        self.transfers.remove(transfer_id).is_some()
    }

    /// Drop every in-flight transfer (boundary disconnect).
    pub fn discard_all(&mut self) {
        self.transfers.clear();
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunks_of(data: &[u8], size: usize) -> Vec<Vec<u8>> {
        data.chunks(size).map(|c| c.to_vec()).collect()
    }

    #[test]
    fn reassembles_in_index_order_for_every_arrival_order() {
        let original = b"The quick brown fox jumps over the lazy dog".to_vec();
        let chunks = chunks_of(&original, 15);
        assert_eq!(chunks.len(), 3);

        // All 6 permutations of 3 chunks.
        let orders: &[[usize; 3]] = &[
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders {
            let mut assembler = ChunkAssembler::new();
            let id = assembler
                .init(chunks.len(), TransferMetadata::default())
                .unwrap();
            for &i in order {
                assembler.put_chunk(&id, i, chunks[i].clone()).unwrap();
            }
            let doc = assembler.complete(&id).unwrap();
            assert_eq!(doc.data, original, "order {order:?}");
        }
    }

    #[test]
    fn rewrite_is_idempotent_and_last_write_wins() {
        let mut assembler = ChunkAssembler::new();
        let id = assembler.init(2, TransferMetadata::default()).unwrap();

        let p1 = assembler.put_chunk(&id, 0, b"old".to_vec()).unwrap();
        assert_eq!(p1.received_chunks, 1);

        let p2 = assembler.put_chunk(&id, 0, b"new".to_vec()).unwrap();
        assert_eq!(p2.received_chunks, 1, "rewrite must not bump the counter");

        assembler.put_chunk(&id, 1, b"!".to_vec()).unwrap();
        let doc = assembler.complete(&id).unwrap();
        assert_eq!(doc.data, b"new!".to_vec());
    }

    #[test]
    fn incomplete_transfer_fails_with_counts() {
        let mut assembler = ChunkAssembler::new();
        let id = assembler.init(3, TransferMetadata::default()).unwrap();
        assembler.put_chunk(&id, 0, b"a".to_vec()).unwrap();
        assembler.put_chunk(&id, 2, b"c".to_vec()).unwrap();

        let err = assembler.complete(&id).unwrap_err();
        assert!(matches!(
            err,
            TransferError::MissingChunks {
                received: 2,
                expected: 3
            }
        ));

        // The record survives so the missing chunk can still arrive.
        assembler.put_chunk(&id, 1, b"b".to_vec()).unwrap();
        assert_eq!(assembler.complete(&id).unwrap().data, b"abc".to_vec());
    }

    #[test]
    fn completed_transfer_is_single_use() {
        let mut assembler = ChunkAssembler::new();
        let id = assembler.init(1, TransferMetadata::default()).unwrap();
        assembler.put_chunk(&id, 0, b"x".to_vec()).unwrap();
        assembler.complete(&id).unwrap();

        assert!(matches!(
            assembler.complete(&id).unwrap_err(),
            TransferError::UnknownTransfer(_)
        ));
    }

    #[test]
    fn unknown_and_out_of_range_are_typed_errors() {
        let mut assembler = ChunkAssembler::new();
        assert!(matches!(
            assembler.put_chunk("nope", 0, Vec::new()).unwrap_err(),
            TransferError::UnknownTransfer(_)
        ));

        let id = assembler.init(2, TransferMetadata::default()).unwrap();
        assert!(matches!(
            assembler.put_chunk(&id, 5, Vec::new()).unwrap_err(),
            TransferError::ChunkOutOfRange { index: 5, total: 2 }
        ));
    }

    #[test]
    fn zero_chunk_transfer_rejected() {
        let mut assembler = ChunkAssembler::new();
        assert!(matches!(
            assembler.init(0, TransferMetadata::default()).unwrap_err(),
            TransferError::EmptyTransfer
        ));
    }

    #[test]
    fn discard_all_clears_in_flight_transfers() {
        let mut assembler = ChunkAssembler::new();
        assembler.init(2, TransferMetadata::default()).unwrap();
        assembler.init(4, TransferMetadata::default()).unwrap();
        assert_eq!(assembler.len(), 2);
        assembler.discard_all();
        assert!(assembler.is_empty());
    }
}
